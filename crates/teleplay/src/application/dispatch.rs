//! CallbackDispatcher: runs the callbacks a control resolved for an event.
//!
//! Synchronous callbacks run inline, in registration order, and a failure
//! stops the batch and propagates to the caller.  Deferred callbacks are
//! spawned onto the Tokio runtime and never awaited during dispatch; their
//! outcomes surface only when the dispatcher is reaped or drained.

use std::time::Duration;

use teleplay_core::{Callback, CallbackError, Event, Handler};
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

const UNTITLED: &str = "<untitled>";

/// Error type for callback execution.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A callback returned an error.
    #[error("callback '{title}' failed: {source}")]
    Callback {
        title: String,
        #[source]
        source: CallbackError,
    },

    /// A deferred callback task panicked or was cancelled.
    #[error("deferred callback task did not complete: {0}")]
    Join(#[from] JoinError),
}

/// Executes callbacks and keeps track of the deferred ones still running.
#[derive(Default)]
pub struct CallbackDispatcher {
    pending: JoinSet<Result<(), DispatchError>>,
}

impl CallbackDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `callbacks` for `event`.
    ///
    /// Must be called from within a Tokio runtime when any callback is
    /// deferred.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Callback`] for the first synchronous callback
    /// that fails.  Callbacks after it in the list are not run.
    pub fn execute(&mut self, callbacks: &[Callback], event: &Event) -> Result<(), DispatchError> {
        for callback in callbacks {
            let title = callback.title().unwrap_or(UNTITLED);
            match callback.handler() {
                Handler::Sync(f) => f().map_err(|source| failed(title, source))?,
                Handler::SyncWithEvent(f) => f(event).map_err(|source| failed(title, source))?,
                Handler::Deferred(f) => {
                    let fut = f();
                    let title = title.to_string();
                    self.pending
                        .spawn(async move { fut.await.map_err(|source| failed(&title, source)) });
                }
                Handler::DeferredWithEvent(f) => {
                    let fut = f(event.clone());
                    let title = title.to_string();
                    self.pending
                        .spawn(async move { fut.await.map_err(|source| failed(&title, source)) });
                }
            }
        }
        Ok(())
    }

    /// Number of deferred callbacks not yet reaped.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Collects the outcome of every deferred callback that has already
    /// finished, without waiting for the others.
    pub fn reap(&mut self) -> Vec<DispatchError> {
        let mut errors = Vec::new();
        while let Some(outcome) = self.pending.try_join_next() {
            collect(outcome, &mut errors);
        }
        errors
    }

    /// Waits up to `timeout` for all deferred callbacks, then detaches the
    /// stragglers.  Detached tasks keep running but their results are lost.
    pub async fn drain(&mut self, timeout: Duration) -> Vec<DispatchError> {
        let mut errors = Vec::new();
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            match tokio::time::timeout_at(deadline, self.pending.join_next()).await {
                Ok(Some(outcome)) => collect(outcome, &mut errors),
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        "detaching {} deferred callback(s) still running after {:?}",
                        self.pending.len(),
                        timeout
                    );
                    self.pending.detach_all();
                    break;
                }
            }
        }

        debug!("dispatcher drained with {} error(s)", errors.len());
        errors
    }
}

fn failed(title: &str, source: CallbackError) -> DispatchError {
    DispatchError::Callback {
        title: title.to_string(),
        source,
    }
}

fn collect(outcome: Result<Result<(), DispatchError>, JoinError>, errors: &mut Vec<DispatchError>) {
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => errors.push(e),
        Err(e) => errors.push(DispatchError::Join(e)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use teleplay_core::{EventName, Key, Sender};

    fn press() -> Event {
        Event::at(EventName::OnPress, Sender::Player, Key::A, 7)
    }

    fn counter() -> (Arc<AtomicUsize>, Callback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let cb = Callback::sync("count", move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (count, cb)
    }

    #[tokio::test]
    async fn test_sync_callbacks_run_inline_in_order() {
        // Arrange
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (s1, s2) = (Arc::clone(&seen), Arc::clone(&seen));
        let callbacks = vec![
            Callback::sync("first", move || {
                s1.lock().unwrap().push("first");
                Ok(())
            }),
            Callback::sync("second", move || {
                s2.lock().unwrap().push("second");
                Ok(())
            }),
        ];
        let mut dispatcher = CallbackDispatcher::new();

        // Act
        dispatcher.execute(&callbacks, &press()).unwrap();

        // Assert
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_event_is_passed_only_to_event_taking_callbacks() {
        let received = Arc::new(Mutex::new(None));
        let r = Arc::clone(&received);
        let callbacks = vec![Callback::sync_with_event("steer", move |e| {
            *r.lock().unwrap() = Some((e.key(), e.time()));
            Ok(())
        })];

        CallbackDispatcher::new().execute(&callbacks, &press()).unwrap();

        assert_eq!(*received.lock().unwrap(), Some((Some(Key::A), 7)));
    }

    #[tokio::test]
    async fn test_sync_error_propagates_and_stops_batch() {
        // Arrange
        let (count, after) = counter();
        let callbacks = vec![Callback::sync("explode", || Err("boom".into())), after];
        let mut dispatcher = CallbackDispatcher::new();

        // Act
        let err = dispatcher.execute(&callbacks, &press()).unwrap_err();

        // Assert
        assert!(matches!(err, DispatchError::Callback { ref title, .. } if title == "explode"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_deferred_callback_is_tracked_not_awaited() {
        // Arrange
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let rx = Arc::new(Mutex::new(Some(rx)));
        let callbacks = vec![Callback::deferred("wait", move || {
            let rx = rx.lock().unwrap().take();
            async move {
                if let Some(rx) = rx {
                    let _ = rx.await;
                }
                Ok::<(), CallbackError>(())
            }
        })];
        let mut dispatcher = CallbackDispatcher::new();

        // Act
        dispatcher.execute(&callbacks, &press()).unwrap();

        // Assert
        assert_eq!(dispatcher.pending_count(), 1);
        tx.send(()).unwrap();
        let errors = dispatcher.drain(Duration::from_secs(1)).await;
        assert!(errors.is_empty());
        assert_eq!(dispatcher.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_deferred_error_surfaces_on_drain_with_title() {
        let callbacks = vec![Callback::deferred_with_event("drive", |_e| async {
            Err::<(), CallbackError>("motor stalled".into())
        })];
        let mut dispatcher = CallbackDispatcher::new();

        dispatcher.execute(&callbacks, &press()).unwrap();
        let errors = dispatcher.drain(Duration::from_secs(1)).await;

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "callback 'drive' failed: motor stalled");
    }

    #[tokio::test]
    async fn test_reap_collects_only_finished_tasks() {
        // Arrange
        let callbacks = vec![
            Callback::deferred("quick", || async { Err::<(), CallbackError>("fast failure".into()) }),
            Callback::deferred("slow", || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<(), CallbackError>(())
            }),
        ];
        let mut dispatcher = CallbackDispatcher::new();
        dispatcher.execute(&callbacks, &press()).unwrap();

        // Act
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        let errors = dispatcher.reap();

        // Assert
        assert_eq!(errors.len(), 1);
        assert_eq!(dispatcher.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_drain_detaches_callbacks_past_timeout() {
        let callbacks = vec![Callback::deferred("forever", || async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<(), CallbackError>(())
        })];
        let mut dispatcher = CallbackDispatcher::new();
        dispatcher.execute(&callbacks, &press()).unwrap();

        let errors = dispatcher.drain(Duration::from_millis(10)).await;

        assert!(errors.is_empty());
        assert_eq!(dispatcher.pending_count(), 0);
    }
}
