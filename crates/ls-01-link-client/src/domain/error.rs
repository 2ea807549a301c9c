//! Link error types.
//!
//! A reply with `success: false` is NOT an error at this layer; it resolves
//! the call normally and the caller inspects it.

use shared_types::OperationTag;
use thiserror::Error;

/// Failures of the link itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// No open connection; nothing was transmitted.
    #[error("not connected")]
    NotConnected,

    /// The connection attempt failed before the link opened.
    #[error("connect to {endpoint} failed: {reason}")]
    Connect { endpoint: String, reason: String },

    /// Writing a frame failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The connection went away while the call was pending.
    #[error("connection closed")]
    ConnectionClosed,

    /// No matching reply within the timeout window.
    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout {
        operation: OperationTag,
        timeout_ms: u64,
    },

    /// The outbound envelope could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),
}

impl LinkError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LinkError::Timeout { .. })
    }

    pub fn is_not_connected(&self) -> bool {
        matches!(self, LinkError::NotConnected)
    }
}

impl From<serde_json::Error> for LinkError {
    fn from(e: serde_json::Error) -> Self {
        LinkError::Encode(e.to_string())
    }
}

/// Result type for link operations
pub type LinkResult<T> = Result<T, LinkError>;
