//! Adapters implementing the scene host port.

pub mod link;

pub use link::LinkSceneHost;
