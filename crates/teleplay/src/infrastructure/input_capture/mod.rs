//! Input capture infrastructure.
//!
//! The terminal listener polls the keyboard on a dedicated thread, because
//! reading terminal events blocks.  Raw events are placed into an unbounded
//! channel and consumed by the Tokio session loop.
//!
//! # Testability
//!
//! The `InputSource` trait allows unit tests to inject synthetic events
//! without a terminal.

use teleplay_core::Key;
use tokio::sync::mpsc::UnboundedReceiver;

pub mod mock;
pub mod terminal;

/// A raw input event produced by the input capture infrastructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInputEvent {
    /// A key was pressed down.
    KeyDown {
        key: Key,
        /// Milliseconds since the listener started.
        time_ms: i64,
    },
    /// A key was released.
    KeyUp { key: Key, time_ms: i64 },
    /// The local "disconnect" gesture (Esc).
    Exit { time_ms: i64 },
}

impl RawInputEvent {
    pub fn time_ms(&self) -> i64 {
        match *self {
            RawInputEvent::KeyDown { time_ms, .. }
            | RawInputEvent::KeyUp { time_ms, .. }
            | RawInputEvent::Exit { time_ms } => time_ms,
        }
    }
}

/// Error type for input capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to enable raw terminal mode: {0}")]
    RawModeFailed(String),
    #[error("failed to spawn listener thread: {0}")]
    SpawnFailed(String),
    #[error("input source has already been started")]
    AlreadyStarted,
}

/// Trait abstracting input event production.
///
/// The production implementation reads the terminal; tests use
/// [`mock::MockInputSource`].
pub trait InputSource: Send + Sync {
    /// Starts the input source and returns a receiver for captured events.
    fn start(&self) -> Result<UnboundedReceiver<RawInputEvent>, CaptureError>;

    /// Stops the input source and releases all OS resources.
    ///
    /// Idempotent, and never fails.  The receiver returned by `start` yields
    /// `None` once the listener has shut down.
    fn stop(&self);
}
