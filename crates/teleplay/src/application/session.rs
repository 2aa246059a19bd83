//! Session: the loop that turns captured keys into callbacks and relayed events.
//!
//! # Data flow
//!
//! ```text
//! InputSource ──RawInputEvent──► Event ──► Engine (local callbacks)
//!                                  │
//!                                  └──────► RelayAdapter ──► remote peer
//! ```
//!
//! The loop ends when the input channel closes, when a system event (the
//! local Esc) has been forwarded, when the relay reports failure, or when an
//! unexpected error escapes a step.  In every case teardown runs in the same
//! order: stop the listener (once), stop the transport, force-release pressed
//! controls, then drain deferred callbacks.
//!
//! A synchronous callback that fails ends the session at that event: the
//! remaining callbacks of the same batch are skipped and the event is not
//! relayed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use teleplay_core::{Event, EventKind, EventName, Sender, UNRESOLVED_TIME};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::application::dispatch::DispatchError;
use crate::application::engine::Engine;
use crate::application::relay::RelayAdapter;
use crate::infrastructure::input_capture::{CaptureError, InputSource, RawInputEvent};

/// Error type for the session loop.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("input capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The input source closed its channel.
    InputClosed,
    /// A system event (the local disconnect gesture) was forwarded.
    Disconnected,
    /// The relay could not deliver an event.
    RelayFailed,
    /// A step failed unexpectedly; the message is the logged error.
    Failed(String),
}

/// What a finished session did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub end: SessionEnd,
    /// Events taken from the input channel.
    pub events: usize,
    /// Controls force-released during teardown.
    pub released: usize,
    /// Callback failures collected from deferred callbacks and teardown.
    pub callback_errors: usize,
}

/// Tunables for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Role stamped on every event this side produces.
    pub role: Sender,
    pub release_on_exit: bool,
    pub drain_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            role: Sender::Player,
            release_on_exit: true,
            drain_timeout: Duration::from_secs(2),
        }
    }
}

/// One run of the input pipeline over a connected transport.
pub struct Session {
    engine: Engine,
    input: Arc<dyn InputSource>,
    relay: RelayAdapter,
    options: SessionOptions,
    started: Instant,
    listener_stopped: bool,
    callback_errors: usize,
}

impl Session {
    /// Creates a session.  The engine is started if it is not already.
    pub fn new(
        mut engine: Engine,
        input: Arc<dyn InputSource>,
        relay: RelayAdapter,
        options: SessionOptions,
    ) -> Self {
        engine.start();
        Self {
            engine,
            input,
            relay,
            options,
            started: Instant::now(),
            listener_stopped: false,
            callback_errors: 0,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn into_engine(self) -> Engine {
        self.engine
    }

    /// Runs until the session ends, then tears down.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Capture`] only if the input source cannot be
    /// started; the transport is stopped before returning.  Every later
    /// failure is logged and reported through [`SessionSummary::end`].
    pub async fn run(&mut self) -> Result<SessionSummary, SessionError> {
        let mut rx = match self.input.start() {
            Ok(rx) => rx,
            Err(e) => {
                self.relay.transport().stop().await;
                return Err(e.into());
            }
        };
        info!("session started as {}", self.options.role);

        let mut events = 0;
        let end = loop {
            let Some(raw) = rx.recv().await else {
                break SessionEnd::InputClosed;
            };
            events += 1;

            let event = self.to_event(raw);
            let step = self.step(event).await;
            self.reap();
            match step {
                Ok(None) => continue,
                Ok(Some(end)) => break end,
                Err(e) => {
                    error!("unexpected internal error: {e}");
                    break SessionEnd::Failed(e.to_string());
                }
            }
        };

        let released = self.teardown().await;
        info!("session ended: {end:?}");
        Ok(SessionSummary {
            end,
            events,
            released,
            callback_errors: self.callback_errors,
        })
    }

    /// Handles one event.  Returns `Some(end)` when the session must stop.
    async fn step(&mut self, event: Event) -> Result<Option<SessionEnd>, SessionError> {
        let outcome = self.engine.handle_event(event.clone())?;
        debug!("{event} -> {outcome:?}");

        if !self.relay.forward(&event).await {
            info!("keyboard disconnected: relay failed");
            self.stop_listener();
            return Ok(Some(SessionEnd::RelayFailed));
        }
        if event.kind() == EventKind::System {
            info!("keyboard disconnected");
            self.stop_listener();
            return Ok(Some(SessionEnd::Disconnected));
        }
        Ok(None)
    }

    fn to_event(&self, raw: RawInputEvent) -> Event {
        let role = self.options.role;
        let stamp = |time_ms: i64| match role {
            // The host stamps relayed player input on arrival.
            Sender::Player => UNRESOLVED_TIME,
            Sender::Host => time_ms,
        };
        match raw {
            RawInputEvent::KeyDown { key, time_ms } => {
                Event::at(EventName::OnPress, role, key, stamp(time_ms))
            }
            RawInputEvent::KeyUp { key, time_ms } => {
                Event::at(EventName::OnRelease, role, key, stamp(time_ms))
            }
            RawInputEvent::Exit { .. } => {
                let name = match role {
                    Sender::Player => EventName::PlayerDisconnect,
                    Sender::Host => EventName::HostDisconnect,
                };
                Event::system(name, role)
            }
        }
    }

    fn stop_listener(&mut self) {
        if !self.listener_stopped {
            self.listener_stopped = true;
            self.input.stop();
        }
    }

    fn reap(&mut self) {
        for e in self.engine.reap() {
            warn!("{e}");
            self.callback_errors += 1;
        }
    }

    async fn teardown(&mut self) -> usize {
        self.stop_listener();
        self.relay.transport().stop().await;

        let mut released = 0;
        if self.options.release_on_exit {
            let time = i64::try_from(self.started.elapsed().as_millis()).unwrap_or(i64::MAX);
            match self.engine.release_all(time) {
                Ok(n) => released = n,
                Err(e) => {
                    error!("release on exit failed: {e}");
                    self.callback_errors += 1;
                }
            }
        }

        for e in self.engine.drain(self.options.drain_timeout).await {
            warn!("{e}");
            self.callback_errors += 1;
        }
        released
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
