//! Configuration errors.
//!
//! Every variant is raised while controls are being set up, before any input
//! is processed.  None of them are retried: a program that hits one has a
//! wrong control definition and must be fixed.

use thiserror::Error;

use crate::domain::event::Sender;
use crate::keymap::Key;

/// Error type for control setup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Another control already owns this `(key, sender)` pair.
    #[error(
        "cannot create {claimant}: {owner} already handles {key} events from {sender}; \
         only one control can handle each event"
    )]
    DuplicateKeyOwner {
        key: Key,
        sender: Sender,
        owner: String,
        claimant: String,
    },

    /// A key name that is not part of the key set.
    #[error("unknown key '{key}'{}", suggestion_hint(.suggestion))]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
    },

    /// The same key appears twice within a single control.
    #[error("control cannot own key {0} more than once")]
    DuplicateControlKey(Key),

    /// The alternate key list does not line up with the primary key list.
    #[error("expected {expected} alternative key(s), got {actual}")]
    AlternativeCountMismatch { expected: usize, actual: usize },

    /// An `on_any` callback was registered without an event parameter.
    #[error("{registration} callback '{title}' must take the event as its parameter")]
    CallbackMissingEvent {
        registration: &'static str,
        title: String,
    },

    /// A control was registered after input processing started.
    #[error("cannot register {0}: controls must be registered before the engine starts")]
    RegistrationClosed(String),
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(", did you mean '{s}'?"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key_message_includes_suggestion_when_present() {
        let err = ConfigError::UnknownKey {
            key: "w".to_string(),
            suggestion: Some("W".to_string()),
        };
        assert_eq!(err.to_string(), "unknown key 'w', did you mean 'W'?");

        let err = ConfigError::UnknownKey {
            key: "F13".to_string(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "unknown key 'F13'");
    }

    #[test]
    fn test_duplicate_owner_message_names_both_controls() {
        let err = ConfigError::DuplicateKeyOwner {
            key: Key::A,
            sender: Sender::Host,
            owner: "Button(A)".to_string(),
            claimant: "Button(A, host_only)".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("cannot create Button(A, host_only)"));
        assert!(msg.contains("Button(A) already handles A events from host"));
    }
}
