//! # Runtime Configuration
//!
//! Built in three layers: defaults, then `LS_*` environment variables, then
//! command line arguments. The result is validated before anything connects.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `LS_ENDPOINT` | `ws://localhost:8765` |
//! | `LS_WATCH_DIR` | `./images` |
//! | `LS_CALL_TIMEOUT_MS` | `30000` |
//! | `LS_LOOKUP_DEPTH` | `1` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use ls_01_link_client::LinkConfig;
use ls_02_scene_builder::{SceneConfig, SceneConfigError};
use ls_03_folder_watch::{RouterConfig, WatchConfig};
use thiserror::Error;
use tracing::warn;

use crate::cli::Args;

/// Folder watched when nothing else is configured, relative to the working directory.
pub const DEFAULT_WATCH_DIR: &str = "images";

/// How often link and router counters are copied into Prometheus.
pub const DEFAULT_METRICS_INTERVAL_SECS: u64 = 15;

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub link: LinkConfig,
    pub scene: SceneConfig,
    pub router: RouterConfig,
    pub watch: WatchConfig,
    pub watch_dir: PathBuf,
    pub metrics_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            scene: SceneConfig::default(),
            router: RouterConfig::default(),
            watch: WatchConfig::default(),
            watch_dir: PathBuf::from(".").join(DEFAULT_WATCH_DIR),
            metrics_interval: Duration::from_secs(DEFAULT_METRICS_INTERVAL_SECS),
        }
    }
}

impl RuntimeConfig {
    /// Override fields from `LS_*` variables. Unparseable values are logged
    /// and ignored.
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup("LS_ENDPOINT") {
            self.link.endpoint = endpoint;
        }
        if let Some(dir) = lookup("LS_WATCH_DIR") {
            self.watch_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("LS_CALL_TIMEOUT_MS") {
            match raw.parse() {
                Ok(ms) => self.link.call_timeout_ms = ms,
                Err(_) => warn!(value = %raw, "LS_CALL_TIMEOUT_MS is not a number, ignoring"),
            }
        }
        if let Some(raw) = lookup("LS_LOOKUP_DEPTH") {
            match raw.parse() {
                Ok(depth) => self.scene.lookup_depth = depth,
                Err(_) => warn!(value = %raw, "LS_LOOKUP_DEPTH is not a number, ignoring"),
            }
        }
        self
    }

    /// Override fields from the command line.
    pub fn apply_args(mut self, args: &Args) -> Self {
        if let Some(endpoint) = &args.endpoint {
            self.link.endpoint = endpoint.clone();
        }
        if let Some(dir) = &args.watch_dir {
            self.watch_dir = dir.clone();
        }
        if let Some(ms) = args.timeout_ms {
            self.link.call_timeout_ms = ms;
        }
        if let Some(depth) = args.lookup_depth {
            self.scene.lookup_depth = depth;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.link.validate()?;
        self.scene.validate()?;
        if self.watch_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyWatchDir);
        }
        if self.watch_dir.exists() && !self.watch_dir.is_dir() {
            return Err(ConfigError::NotADirectory(self.watch_dir.clone()));
        }
        if self.metrics_interval.is_zero() {
            return Err(ConfigError::InvalidMetricsInterval);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("link: {0}")]
    Link(#[from] ls_01_link_client::ConfigError),

    #[error("scene: {0}")]
    Scene(#[from] SceneConfigError),

    #[error("watch folder path is empty")]
    EmptyWatchDir,

    #[error("watch folder {0} exists but is not a directory")]
    NotADirectory(PathBuf),

    #[error("metrics interval cannot be 0")]
    InvalidMetricsInterval,
}

/// Load configuration from the environment and command line.
pub fn load_config(args: &Args) -> Result<RuntimeConfig, ConfigError> {
    let config = RuntimeConfig::default()
        .apply_env(|key| env::var(key).ok())
        .apply_args(args);
    config.validate()?;
    Ok(config)
}
