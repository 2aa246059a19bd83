//! Infrastructure layer for teleplay.
//!
//! Contains OS-facing adapters: terminal input capture, the WebSocket
//! transport, and file-system storage of the configuration.
//!
//! **Dependency rule**: nothing here is imported by `teleplay_core`.  The
//! `application` layer only uses the `input_capture` types and trait.

pub mod input_capture;
pub mod network;
pub mod storage;
