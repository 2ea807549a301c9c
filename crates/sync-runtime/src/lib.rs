//! # image-sync Runtime
//!
//! Wires the link client, scene builder and folder watch into one process.
//!
//! ```text
//!  ./images ──notify──► FolderWatcher ──► ChangeRouter ──► SceneBuilder
//!                                                             │
//!                                        LinkClient ◄─────────┘
//!                                            │ one WebSocket
//!                                            ▼
//!                                          host
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Telemetry (logging, metrics registry)
//! 2. Configuration: defaults, `LS_*` environment, command line
//! 3. Connect to the host; failure ends the process
//! 4. Create and watch the image folder
//! 5. Route events until Ctrl-C

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod runtime;

pub use cli::Args;
pub use config::{load_config, ConfigError, RuntimeConfig};
pub use runtime::{mirror_metrics, RuntimeError, SyncRuntime};
