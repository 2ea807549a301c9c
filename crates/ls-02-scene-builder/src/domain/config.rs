//! Scene builder configuration.

use serde::{Deserialize, Serialize};
use shared_types::{Float3, ROOT_NODE_ID};
use thiserror::Error;

/// Default depth of the name lookup below the root.
pub const DEFAULT_LOOKUP_DEPTH: u32 = 1;

/// Scene builder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Node new objects are created under and lookups start from
    pub root_id: String,
    /// How far below the root a name lookup searches
    pub lookup_depth: u32,
    /// Position used when a refresh falls through to construction without one
    pub default_position: Float3,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            root_id: ROOT_NODE_ID.to_string(),
            lookup_depth: DEFAULT_LOOKUP_DEPTH,
            default_position: Float3::ZERO,
        }
    }
}

impl SceneConfig {
    pub fn with_lookup_depth(mut self, depth: u32) -> Self {
        self.lookup_depth = depth;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), SceneConfigError> {
        if self.root_id.is_empty() {
            return Err(SceneConfigError::EmptyRoot);
        }
        if self.lookup_depth == 0 {
            return Err(SceneConfigError::InvalidLookupDepth);
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneConfigError {
    #[error("root node id cannot be empty")]
    EmptyRoot,
    #[error("lookup depth must be at least 1")]
    InvalidLookupDepth,
}
