//! The closed key set that controls may own.
//!
//! Keys are identified on the wire and in configuration files by their
//! upper-case name (`"A"`, `"7"`, `"LEFT"`, `"SPACE"`).  Anything outside the
//! set is rejected at setup time with [`ConfigError::UnknownKey`].
//!
//! [`ConfigError::UnknownKey`]: crate::domain::error::ConfigError::UnknownKey

pub mod key;

pub use key::Key;
