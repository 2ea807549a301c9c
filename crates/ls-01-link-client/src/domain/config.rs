//! Link configuration with validation.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default host endpoint.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8765";

/// Default per-call timeout.
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 30_000;

/// Link client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// WebSocket endpoint of the host (`ws://` or `wss://`)
    pub endpoint: String,
    /// How long a call waits for its reply
    pub call_timeout_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
        }
    }
}

impl LinkConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.endpoint.starts_with("ws://") || self.endpoint.starts_with("wss://")) {
            return Err(ConfigError::InvalidEndpoint(self.endpoint.clone()));
        }

        if self.call_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "call timeout cannot be 0".into(),
            ));
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid endpoint {0}: expected ws:// or wss://")]
    InvalidEndpoint(String),
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
}
