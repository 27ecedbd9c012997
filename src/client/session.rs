//! Session lifecycle.
//!
//! ```text
//! Disconnected ──connect + hello──▶ Handshaking ──connect … success──▶ Ready
//!        │                              │                               │
//!        └──────────────────────────────┴──── loss / huh? / close ──────┴──▶ Closed
//! ```
//!
//! `Ready` is entered at most once. `Closed` is terminal: a client whose
//! connection has gone must be replaced, never revived.

use crate::protocol::message::HandshakeInfo;
use crate::{AppError, Result};

/// Connection lifecycle state of a [`Client`](crate::client::Client).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No transport yet.
    #[default]
    Disconnected,
    /// `hello` sent, waiting for `connect` and the name acknowledgement.
    Handshaking,
    /// Handshake complete; commands may be issued.
    Ready(HandshakeInfo),
    /// Connection lost, refused or closed.
    Closed,
}

impl SessionState {
    /// Whether commands may be issued.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Negotiated display information, once `Ready`.
    #[must_use]
    pub fn handshake(&self) -> Option<&HandshakeInfo> {
        match self {
            Self::Ready(info) => Some(info),
            _ => None,
        }
    }

    /// Gate applied by every command method.
    ///
    /// # Errors
    ///
    /// [`AppError::ConnectionClosed`] once `Closed`, otherwise
    /// [`AppError::NotReady`] until the handshake completes.
    pub fn ensure_ready(&self) -> Result<()> {
        match self {
            Self::Ready(_) => Ok(()),
            Self::Closed => Err(AppError::ConnectionClosed),
            Self::Disconnected | Self::Handshaking => Err(AppError::NotReady),
        }
    }
}

/// Progress of the handshake as seen by the router.
///
/// Separate from [`SessionState`] because the router must remember the
/// `connect` payload while it waits for the name acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Handshake {
    /// `hello` sent, no `connect` yet.
    #[default]
    AwaitingConnect,
    /// `connect` received and `client_set name` sent.
    AwaitingNameAck(HandshakeInfo),
    /// Session established.
    Complete,
    /// Handshake or connection failed.
    Failed,
}
