//! Mock input source for unit and integration testing.
//!
//! Allows tests to inject synthetic [`RawInputEvent`]s without a terminal.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{CaptureError, InputSource, RawInputEvent};

/// A mock implementation of [`InputSource`] that allows tests to inject events.
#[derive(Clone, Default)]
pub struct MockInputSource {
    sender: Arc<Mutex<Option<UnboundedSender<RawInputEvent>>>>,
    script: Arc<Mutex<Option<Vec<RawInputEvent>>>>,
    stop_count: Arc<Mutex<u32>>,
}

impl MockInputSource {
    /// Creates a new mock input source.
    pub fn new() -> Self {
        Self::default()
    }

    /// A source that replays `events` on `start` and then closes the channel,
    /// as if the keyboard listener had finished on its own.
    pub fn scripted(events: impl IntoIterator<Item = RawInputEvent>) -> Self {
        let source = Self::default();
        *source.script.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(events.into_iter().collect());
        source
    }

    /// Injects a synthetic event, as if captured from the keyboard.
    ///
    /// Returns `false` if the source is not running.
    pub fn inject_event(&self, event: RawInputEvent) -> bool {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    /// Injects every event in order.
    pub fn inject_all(&self, events: impl IntoIterator<Item = RawInputEvent>) {
        for event in events {
            self.inject_event(event);
        }
    }

    /// Returns the number of times [`InputSource::stop`] was called.
    pub fn stop_count(&self) -> u32 {
        *self.stop_count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl InputSource for MockInputSource {
    fn start(&self) -> Result<UnboundedReceiver<RawInputEvent>, CaptureError> {
        let mut sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if sender.is_some() {
            return Err(CaptureError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let script = self.script.lock().unwrap_or_else(PoisonError::into_inner).take();
        match script {
            Some(events) => {
                for event in events {
                    let _ = tx.send(event);
                }
            }
            None => *sender = Some(tx),
        }
        Ok(rx)
    }

    fn stop(&self) {
        *self.stop_count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        // Drop the sender to close the channel
        *self.sender.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
