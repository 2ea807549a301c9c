//! Ports for the scene builder.

pub mod outbound;

pub use outbound::SceneHost;
