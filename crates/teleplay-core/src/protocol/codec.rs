//! JSON codec for [`WireMessage`].

use thiserror::Error;

use crate::protocol::messages::WireMessage;

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// The text is not a valid message.
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Encodes a [`WireMessage`] as a single-line JSON text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use teleplay_core::protocol::{decode_message, encode_message, WireMessage};
///
/// let text = encode_message(&WireMessage::Goodbye).unwrap();
/// assert_eq!(text, r#"{"type":"goodbye"}"#);
/// assert_eq!(decode_message(&text).unwrap(), WireMessage::Goodbye);
/// ```
pub fn encode_message(msg: &WireMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(ProtocolError::Encode)
}

/// Decodes one [`WireMessage`] from a text frame.
///
/// Decoded events carry an unresolved liveness and are reported active.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if `text` is not a known message.
pub fn decode_message(text: &str) -> Result<WireMessage, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Malformed)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
