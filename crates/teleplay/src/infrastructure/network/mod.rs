//! Network infrastructure.
//!
//! # Sub-modules
//!
//! - **`ws_transport`** – The WebSocket implementation of
//!   [`crate::application::relay::Transport`].  Sends a `Hello` on connect,
//!   one JSON text frame per event, and a `Goodbye` plus a close frame on
//!   stop.  A background reader notices when the host goes away.

pub mod ws_transport;

pub use ws_transport::WsTransport;
