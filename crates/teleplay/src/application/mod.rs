//! Application layer: the event pipeline from raw input to callbacks and relay.
//!
//! Everything here depends on traits ([`relay::Transport`],
//! [`crate::infrastructure::input_capture::InputSource`]) rather than on
//! concrete sockets or terminals, so the whole pipeline runs in unit tests.
//!
//! # Sub-modules
//!
//! - **`engine`**   – Owns the controls and the key registry.  Resolves each
//!   event to its control and hands the resulting callbacks to the dispatcher.
//!
//! - **`dispatch`** – Runs synchronous callbacks inline and tracks deferred
//!   ones as background tasks until they are reaped or drained.
//!
//! - **`relay`**    – The transport abstraction and the adapter that turns
//!   every send failure into a plain "stop" signal.
//!
//! - **`session`**  – The loop tying input, engine and relay together, and
//!   the orderly teardown when it ends.

pub mod dispatch;
pub mod engine;
pub mod relay;
pub mod session;
