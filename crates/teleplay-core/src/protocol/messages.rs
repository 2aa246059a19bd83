//! Messages exchanged between a player and a host over the relay link.
//!
//! Each message is one JSON text frame tagged by `"type"`:
//!
//! ```text
//! {"type":"hello","role":"player","player_id":"6f1c…"}
//! {"type":"event","name":"on_press","sender":"player","key":"W","time":-1}
//! {"type":"goodbye"}
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::event::{Event, Sender};

/// A relay message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    /// First message on a new connection.
    Hello { role: Sender, player_id: Uuid },
    /// One input or system event.
    Event(Event),
    /// Orderly end of the connection.
    Goodbye,
}

impl WireMessage {
    /// A `Hello` carrying a freshly generated player id.
    pub fn hello(role: Sender) -> Self {
        WireMessage::Hello {
            role,
            player_id: Uuid::new_v4(),
        }
    }
}
