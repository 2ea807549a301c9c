//! Folder watch and routing errors.

use ls_02_scene_builder::SceneError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures handling one file event.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// The host refused to import the image; nothing was built.
    #[error("import of {name} rejected: {detail}")]
    ImportRejected { name: String, detail: String },

    #[error("invalid path {0}")]
    InvalidPath(PathBuf),
}

/// Failures setting up the folder watch.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watch directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("filesystem watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
