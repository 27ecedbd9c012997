//! Error types shared across the client.

use std::fmt::{Display, Formatter};

/// Shared client result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Client error enumeration covering all protocol and transport failure modes.
///
/// The argument-validation variants (`Invalid*`) are raised before any
/// network I/O and never touch the pending-call queues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Key reservation mode is not `shared` or `exclusive`.
    InvalidKeyMode(String),
    /// Widget type is outside the LCDd widget vocabulary.
    InvalidWidgetType(String),
    /// Icon name is outside the LCDd icon vocabulary.
    InvalidIconName(String),
    /// Scroll direction is unknown or unsupported by the widget.
    InvalidDirection(String),
    /// Numeric argument falls outside its permitted range.
    InvalidNumberRange(String),
    /// Command attempted before the handshake completed.
    NotReady,
    /// Server answered `huh?`; carries the raw server line.
    ServerRejected(String),
    /// Server refused the session during the handshake.
    HandshakeFailed(String),
    /// Connection is gone; no further commands can be issued.
    ConnectionClosed,
    /// `connect` was called on a client that already owns a connection.
    AlreadyConnected,
    /// A required list argument (key names, widget parameters) was empty.
    MissingArgument(String),
    /// Socket-level I/O failure.
    Io(String),
    /// Configuration parsing or validation failure.
    Config(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKeyMode(msg) => write!(f, "invalid key mode: {msg}"),
            Self::InvalidWidgetType(msg) => write!(f, "invalid widget type: {msg}"),
            Self::InvalidIconName(msg) => write!(f, "invalid icon name: {msg}"),
            Self::InvalidDirection(msg) => write!(f, "invalid direction: {msg}"),
            Self::InvalidNumberRange(msg) => write!(f, "invalid number range: {msg}"),
            Self::NotReady => write!(f, "not ready: handshake has not completed"),
            Self::ServerRejected(msg) => write!(f, "server rejected: {msg}"),
            Self::HandshakeFailed(msg) => write!(f, "handshake failed: {msg}"),
            Self::ConnectionClosed => write!(f, "connection closed"),
            Self::AlreadyConnected => write!(f, "already connected"),
            Self::MissingArgument(msg) => write!(f, "missing argument: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}
