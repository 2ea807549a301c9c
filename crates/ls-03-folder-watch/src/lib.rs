//! LS-03 Folder Watch - file changes in, scene updates out.
//!
//! ```text
//! notify ─► FolderWatcher ─(settled FileEvent)─► ChangeRouter ─► SceneBuilder
//!            500 ms quiet, sampled every 100 ms     import, then construct
//!                                                   or refresh by name
//! ```
//!
//! The watcher reports a file once it has stopped changing. The router keeps
//! the set of names it has already materialized, serializes events per name
//! and logs failures without stopping the stream.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod error;
pub mod router;
pub mod watcher;

pub use error::{RouteError, WatchError};
pub use router::{
    is_image, ChangeRouter, InMemoryKnownImages, KnownImages, RouteOutcome, RouterConfig,
    RouterStatsSnapshot, IMAGE_EXTENSIONS,
};
pub use watcher::{
    FileEvent, FileEventKind, FileSignature, FolderWatcher, StabilityTracker, WatchConfig,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_QUIET_PERIOD_MS,
};
