//! Relay: forwards resolved events to the remote peer.
//!
//! The session only needs a yes/no answer from the network: "may I keep
//! going?".  [`RelayAdapter::forward`] collapses every transport failure
//! into `false` after logging it, and the session stops on the first `false`.

use std::sync::Arc;

use async_trait::async_trait;
use teleplay_core::{Event, ProtocolError, Sender};
use thiserror::Error;
use tracing::{debug, warn};

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Nothing is listening at the target address.
    #[error("connection refused by {0}")]
    ConnectionRefused(String),

    /// Any other failure while establishing the connection.
    #[error("failed to connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    /// The connection broke while sending.
    #[error("send failed: {0}")]
    Send(String),

    /// The message could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// `send` was called before `connect` or after `stop`.
    #[error("transport is not connected")]
    NotConnected,
}

/// Connection to the remote peer.
///
/// The production implementation speaks WebSocket; tests use `mockall`
/// mocks or recording doubles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens the connection and announces this side's role.
    async fn connect(&self, role: Sender) -> Result<(), TransportError>;

    /// Sends one event.  `Ok(false)` means the peer closed the link in an
    /// orderly way and nothing more should be sent.
    async fn send(&self, event: &Event) -> Result<bool, TransportError>;

    /// Closes the connection.  Must be idempotent.
    async fn stop(&self);
}

/// Turns transport results into a keep-going flag.
pub struct RelayAdapter {
    transport: Arc<dyn Transport>,
}

impl RelayAdapter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Sends `event`, returning whether the session should continue.
    pub async fn forward(&self, event: &Event) -> bool {
        match self.transport.send(event).await {
            Ok(true) => {
                debug!("relayed {event}");
                true
            }
            Ok(false) => {
                warn!("peer closed the link; {event} was not delivered");
                false
            }
            Err(e) => {
                warn!("failed to relay {event}: {e}");
                false
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
