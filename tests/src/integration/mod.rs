//! Cross-crate integration flows over a real WebSocket.

pub mod folder_sync;
pub mod link_flows;
pub mod scene_flows;
