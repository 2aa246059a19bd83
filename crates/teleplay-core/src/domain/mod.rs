//! Domain entities for teleplay.
//!
//! Pure logic with no infrastructure dependencies: everything here can be
//! constructed and tested without a runtime, a socket or a keyboard.
//!
//! # Sub-modules
//!
//! - **`event`**    – The [`event::Event`] value describing one input occurrence.
//! - **`callback`** – Application callbacks, tagged by arity and by whether
//!   they complete immediately or return a future.
//! - **`control`**  – The [`control::Control`] trait and its [`control::button::Button`]
//!   variant, which own keys and run the press/release state machine.
//! - **`registry`** – Exclusive `(key, sender)` ownership table.
//! - **`listing`**  – Per-control introspection data and its text rendering.
//! - **`error`**    – Configuration errors raised at setup time.

pub mod callback;
pub mod control;
pub mod error;
pub mod event;
pub mod listing;
pub mod registry;
