//! Client configuration parsing and validation.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::client::keepalive::KeepAlive;
use crate::{AppError, Result};

/// Default TCP port LCDd listens on.
pub const DEFAULT_PORT: u16 = 13666;

fn default_host() -> String {
    "localhost".into()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_name() -> String {
    "lcdd-client".into()
}

/// Connection settings for a single LCDd session, parsed from TOML.
///
/// ```toml
/// host = "localhost"
/// port = 13666
/// name = "living room"
/// keep_alive_seconds = 30
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ClientConfig {
    /// LCDd host name or address.
    #[serde(default = "default_host")]
    pub host: String,
    /// LCDd TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Client name announced with `client_set name`.
    #[serde(default = "default_name")]
    pub name: String,
    /// Seconds between keep-alive `noop` commands; 0 disables the timer.
    #[serde(default)]
    pub keep_alive_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            name: default_name(),
            keep_alive_seconds: 0,
        }
    }
}

impl ClientConfig {
    /// Configuration for `host:port` with the default client name.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Replace the announced client name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the keep-alive interval (whole seconds; sub-second parts are dropped).
    #[must_use]
    pub fn with_keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive_seconds = interval.as_secs();
        self
    }

    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Keep-alive setting derived from `keep_alive_seconds`.
    #[must_use]
    pub fn keep_alive(&self) -> KeepAlive {
        KeepAlive::from(Duration::from_secs(self.keep_alive_seconds))
    }

    /// Check field invariants.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an empty host or name, or port 0.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(AppError::Config("host must not be empty".into()));
        }

        if self.port == 0 {
            return Err(AppError::Config("port must be greater than zero".into()));
        }

        if self.name.trim().is_empty() {
            return Err(AppError::Config("name must not be empty".into()));
        }

        Ok(())
    }
}
