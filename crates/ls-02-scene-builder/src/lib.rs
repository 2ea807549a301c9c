//! LS-02 Scene Builder - image objects in the remote scene.
//!
//! Turns "this image now has asset locator X" into remote scene state: a
//! container node under the root carrying a fixed catalogue of components
//! wired to each other.
//!
//! # Pipelines
//!
//! ```text
//! construct(name, asset, position)
//!   addSlot ─► lookup by name ─► addComponent × 13 ─► getSlot (components)
//!     ─► texture URL ─► cross-reference wiring ─► materials list append
//!
//! refresh_or_construct(name, asset, position?)
//!   lookup by name ─┬─ found, has texture ─► update texture URL   (Updated)
//!                   ├─ found, no texture  ─► nothing              (NotUpdatable)
//!                   └─ not found          ─► construct            (Constructed)
//! ```
//!
//! The host acknowledges create calls without returning ids, so every
//! created node and component is found again by reading the tree back.
//!
//! # Usage
//!
//! ```ignore
//! use ls_02_scene_builder::{LinkSceneHost, SceneBuilder, SceneConfig};
//!
//! let host = Arc::new(LinkSceneHost::new(client));
//! let builder = SceneBuilder::new(host, SceneConfig::default());
//! let outcome = builder.refresh_or_construct("cat.png", &asset_url, None).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::LinkSceneHost;
pub use domain::{
    find_all_by_name, find_by_name, ComponentRole, ConstructReport, ListSlot, RefreshOutcome, SceneConfig,
    SceneConfigError, SceneError, SceneResult, StepNote, WiringStep, DEFAULT_LOOKUP_DEPTH,
};
pub use ports::SceneHost;
pub use service::SceneBuilder;
