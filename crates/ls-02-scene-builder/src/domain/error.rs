//! Scene builder error types.

use ls_01_link_client::LinkError;
use shared_types::OperationTag;
use thiserror::Error;

/// Scene builder errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    /// The link failed (not connected, transport, timeout, closed).
    #[error(transparent)]
    Link(#[from] LinkError),

    /// The host answered `success: false`.
    #[error("{operation} rejected: {detail}")]
    Rejected {
        operation: OperationTag,
        detail: String,
    },

    /// A node created moments ago could not be found again by name.
    #[error("node {name:?} not found after creation")]
    NodeNotFound { name: String },

    /// A reply did not carry the expected payload.
    #[error("{operation} reply could not be decoded: {reason}")]
    Decode {
        operation: OperationTag,
        reason: String,
    },
}

impl SceneError {
    /// Host-side business failure, as opposed to a link or protocol failure.
    pub fn is_rejection(&self) -> bool {
        matches!(self, SceneError::Rejected { .. })
    }
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
