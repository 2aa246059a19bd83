//! # teleplay-core
//!
//! Shared library for teleplay containing the event model, the control state
//! machines, the key ownership registry, and the JSON wire protocol spoken
//! between a player and a host.
//!
//! It has zero dependencies on OS APIs, async runtimes, or network sockets.
//!
//! # Architecture overview
//!
//! teleplay lets a remote *player* drive a *host* process (usually a robot or
//! other hardware rig) with discrete button presses.  The host registers
//! controls, each owning one or more keys, and attaches callbacks to them.
//! Every incoming press or release is resolved to exactly one control, run
//! through that control's state machine, and turned into a list of callbacks
//! to execute.
//!
//! - **`keymap`** – The closed set of keys a control may own, with name
//!   parsing and wire representation.
//!
//! - **`domain`** – Events, callbacks, controls (`Button`), the
//!   `ControlRegistry` that enforces single ownership of each key, and the
//!   control listing used to print a human-readable summary.
//!
//! - **`protocol`** – JSON messages exchanged over the relay connection.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::callback::{Callback, CallbackError, CallbackResult, Handler};
pub use domain::control::button::{Button, ButtonOptions};
pub use domain::control::{Control, ControlCore, Resolution, SenderRestriction};
pub use domain::error::ConfigError;
pub use domain::event::{Event, EventKind, EventName, Sender, UNRESOLVED_TIME};
pub use domain::listing::{render_input_list, ControlData};
pub use domain::registry::{ControlId, ControlRegistry};
pub use keymap::Key;
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::WireMessage;
