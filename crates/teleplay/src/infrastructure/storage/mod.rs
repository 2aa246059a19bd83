//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the TOML configuration file from the
//! platform-appropriate directory (or an explicit path given on the command
//! line) and falls back to defaults when it is absent.

pub mod config;
