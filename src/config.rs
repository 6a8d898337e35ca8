//! Server configuration parsing and validation.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_queue_capacity() -> usize {
    100
}

fn default_registry_capacity() -> usize {
    10
}

fn default_ping_interval_seconds() -> u64 {
    10
}

fn default_drain_seconds() -> u64 {
    3
}

/// Global configuration parsed from `config.toml`.
///
/// Every field is defaulted, so the server runs without a config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RelayConfig {
    /// Address the HTTP/WebSocket listener binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Maximum pending outbound frames per session before drops begin.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Maximum processes admitted over one session's lifetime.
    #[serde(default = "default_registry_capacity")]
    pub registry_capacity: usize,
    /// Interval between liveness probes on an active session.
    #[serde(default = "default_ping_interval_seconds")]
    pub ping_interval_seconds: u64,
    /// Grace period between the teardown group-kill and queue closure.
    #[serde(default = "default_drain_seconds")]
    pub drain_seconds: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            queue_capacity: default_queue_capacity(),
            registry_capacity: default_registry_capacity(),
            ping_interval_seconds: default_ping_interval_seconds(),
            drain_seconds: default_drain_seconds(),
        }
    }
}

impl RelayConfig {
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

    /// Interval between liveness probes.
    #[must_use]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_seconds)
    }

    /// Grace period for in-flight frames during teardown.
    #[must_use]
    pub fn drain_interval(&self) -> Duration {
        Duration::from_secs(self.drain_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(AppError::Config(
                "queue_capacity must be greater than zero".into(),
            ));
        }
        if self.registry_capacity == 0 {
            return Err(AppError::Config(
                "registry_capacity must be greater than zero".into(),
            ));
        }
        if self.ping_interval_seconds == 0 {
            return Err(AppError::Config(
                "ping_interval_seconds must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
