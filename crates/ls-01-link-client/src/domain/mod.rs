//! Domain types for the link client.
//!
//! Correlation, the pending call table, typed requests, configuration and
//! errors. Nothing here touches a socket.

pub mod config;
pub mod correlation;
pub mod error;
pub mod pending;
pub mod requests;

pub use config::{ConfigError, LinkConfig, DEFAULT_CALL_TIMEOUT_MS, DEFAULT_ENDPOINT};
pub use correlation::CorrelationId;
pub use error::{LinkError, LinkResult};
pub use pending::{CallOutcome, PendingCallStore, PendingStatsSnapshot};
pub use requests::{LinkRequest, NewNode};
