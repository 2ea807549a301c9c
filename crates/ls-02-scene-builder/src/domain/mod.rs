//! Domain layer for the scene builder.
//!
//! The component catalogue, name lookup, wiring plans, run reports and
//! errors. Pure logic; all host access goes through
//! [`crate::ports::SceneHost`].

pub mod catalogue;
pub mod config;
pub mod error;
pub mod lookup;
pub mod report;
pub mod wiring;

pub use catalogue::{strip_qualifiers, ComponentRole, TYPE_NAMESPACE};
pub use config::{SceneConfig, SceneConfigError, DEFAULT_LOOKUP_DEPTH};
pub use error::{SceneError, SceneResult};
pub use lookup::{find_all_by_name, find_by_name};
pub use report::{ConstructReport, ListSlot, RefreshOutcome, StepNote};
pub use wiring::{
    materials_target, texture_url_patch, WiringContext, WiringStep, MATERIALS_MEMBER, SIZE_MEMBER,
    SNAP_NORMAL, TEXTURE_URL_MEMBER,
};
