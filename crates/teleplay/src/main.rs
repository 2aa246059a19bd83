//! teleplay player: relays the local keyboard to a teleplay host.
//!
//! # Usage
//!
//! ```text
//! teleplay [OPTIONS]
//!
//! Options:
//!   --host <HOST>            Host to connect to            [env: TELEPLAY_HOST]
//!   --port <PORT>            Host WebSocket port           [env: TELEPLAY_PORT]
//!   --config <PATH>          Config file to load           [env: TELEPLAY_CONFIG]
//!   --log-level <LEVEL>      Log level when RUST_LOG unset [env: TELEPLAY_LOG_LEVEL]
//! ```
//!
//! Values given on the command line (or through their environment variable)
//! override the config file, which overrides the built-in defaults.  Press
//! keys to send them to the host; Esc or Ctrl+C disconnects.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use teleplay::application::engine::Engine;
use teleplay::application::relay::{RelayAdapter, Transport, TransportError};
use teleplay::application::session::{Session, SessionOptions};
use teleplay::infrastructure::input_capture::terminal::TerminalInputSource;
use teleplay::infrastructure::network::WsTransport;
use teleplay::infrastructure::storage::config::{load_config, load_config_from, AppConfig};
use teleplay_core::Sender;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "teleplay",
    about = "Relay your keyboard to a teleplay host",
    version
)]
struct Cli {
    /// Host name or IP address of the teleplay host.
    #[arg(long, env = "TELEPLAY_HOST")]
    host: Option<String>,

    /// WebSocket port of the teleplay host.
    #[arg(long, env = "TELEPLAY_PORT")]
    port: Option<u16>,

    /// Path of a TOML config file.  Defaults to the platform config directory.
    #[arg(long, env = "TELEPLAY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "TELEPLAY_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Loads the config file and applies the command-line overrides.
    fn into_app_config(self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => load_config().context("failed to load config")?,
        };

        if let Some(host) = self.host {
            config.network.host = host;
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(level) = self.log_level {
            config.player.log_level = level;
        }
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// 1. Parses the CLI and loads the config.
/// 2. Initialises `tracing_subscriber`, preferring `RUST_LOG` over the
///    configured level.
/// 3. Connects to the host.  A refused connection is reported and the
///    program exits normally.
/// 4. Runs the player session until the keyboard disconnects, the input
///    closes or the relay fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_app_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.player.log_level)),
        )
        .init();

    let transport = Arc::new(WsTransport::new(config.network.url()));
    match transport.connect(Sender::Player).await {
        Ok(()) => {}
        Err(TransportError::ConnectionRefused(_)) => {
            println!(
                "Connection refused to {}, wrong address or host not running?",
                config.network.address()
            );
            return Ok(());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to connect to {}", config.network.url()))
        }
    }
    println!("Connected to {}. Press Esc to disconnect.", config.network.address());

    let input = Arc::new(TerminalInputSource::new(config.input.poll_interval()));
    let options = SessionOptions {
        role: Sender::Player,
        release_on_exit: config.player.release_on_exit,
        drain_timeout: config.input.drain_timeout(),
    };
    let mut session = Session::new(Engine::new(), input, RelayAdapter::new(transport), options);
    let summary = session.run().await.context("player session failed")?;

    info!(
        "session summary: {:?}, {} event(s), {} released, {} callback error(s)",
        summary.end, summary.events, summary.released, summary.callback_errors
    );
    println!("Disconnected.");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_config(port: u16) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("teleplay_cli_{}", Uuid::new_v4()))
            .join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.network.port = port;
        cfg.network.host = "10.1.2.3".to_string();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, toml::to_string_pretty(&cfg).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_cli_host_override() {
        // Arrange / Act
        let cli = Cli::parse_from(["teleplay", "--host", "192.168.1.20"]);

        // Assert
        assert_eq!(cli.host.as_deref(), Some("192.168.1.20"));
    }

    #[test]
    fn test_cli_port_override() {
        let cli = Cli::parse_from(["teleplay", "--port", "9999"]);
        assert_eq!(cli.port, Some(9999));
    }

    #[test]
    fn test_cli_rejects_non_numeric_port() {
        let result = Cli::try_parse_from(["teleplay", "--port", "eighty"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_file_values_are_used_when_not_overridden() {
        // Arrange
        let path = temp_config(7000);
        let cli = Cli::parse_from(["teleplay", "--config", path.to_str().unwrap()]);

        // Act
        let cfg = Cli {
            host: None,
            port: None,
            log_level: None,
            ..cli
        }
        .into_app_config()
        .unwrap();

        // Assert
        assert_eq!(cfg.network.address(), "10.1.2.3:7000");
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_cli_values_override_config_file() {
        // Arrange
        let path = temp_config(7000);
        let cli = Cli {
            host: Some("robot.local".to_string()),
            port: Some(8123),
            config: Some(path.clone()),
            log_level: Some("debug".to_string()),
        };

        // Act
        let cfg = cli.into_app_config().unwrap();

        // Assert
        assert_eq!(cfg.network.url(), "ws://robot.local:8123/");
        assert_eq!(cfg.player.log_level, "debug");
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_missing_config_file_falls_back_to_defaults() {
        let cli = Cli {
            host: None,
            port: None,
            config: Some(PathBuf::from("/nonexistent/teleplay/config.toml")),
            log_level: None,
        };

        let cfg = cli.into_app_config().unwrap();

        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_malformed_config_file_is_an_error() {
        let dir = std::env::temp_dir().join(format!("teleplay_cli_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "port = = 1").unwrap();
        let cli = Cli {
            host: None,
            port: None,
            config: Some(path),
            log_level: None,
        };

        let err = cli.into_app_config().unwrap_err();

        assert!(err.to_string().contains("failed to load config"));
        std::fs::remove_dir_all(dir).ok();
    }
}
