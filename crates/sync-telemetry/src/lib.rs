//! # Sync Telemetry
//!
//! Logging and metrics for the image folder sync.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter`, pretty or JSON
//! - **Metrics**: Prometheus counters in a process-wide registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sync_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LS_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `LS_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `LS_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `LS_SERVICE_NAME` | `image-sync` | Service name in startup logs |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};
pub use metrics::{
    encode_metrics, observe_total, register_metrics, FILE_EVENTS_FAILED, FILE_EVENTS_HANDLED,
    FILE_EVENTS_IGNORED, LINK_CALLS, LINK_CANCELLED, LINK_DISCARDED, LINK_PENDING, LINK_REPLIES,
    LINK_TIMEOUTS, OBJECTS_CONSTRUCTED, OBJECTS_NOT_UPDATABLE, OBJECTS_REFRESHED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Register metrics, then install the global subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
