//! Driven ports (outbound dependencies).

use crate::domain::SceneResult;
use async_trait::async_trait;
use ls_01_link_client::NewNode;
use shared_types::{MemberPatch, RemoteComponent, RemoteNode};
use std::path::Path;

/// Typed access to the remote scene.
///
/// `success: false` replies surface as
/// [`SceneError::Rejected`](crate::domain::SceneError::Rejected), link
/// failures as `SceneError::Link`.
#[async_trait]
pub trait SceneHost: Send + Sync {
    /// Import an image file and return its asset locator.
    async fn import_texture(&self, file_path: &Path) -> SceneResult<String>;

    /// Create a node. The host does not report the new id.
    async fn add_node(&self, node: NewNode) -> SceneResult<()>;

    async fn get_node(
        &self,
        node_id: &str,
        depth: u32,
        include_components: bool,
    ) -> SceneResult<RemoteNode>;

    /// Attach a component. The host does not report the new id.
    async fn add_component(&self, node_id: &str, component_type: &str) -> SceneResult<()>;

    async fn get_component(&self, component_id: &str) -> SceneResult<RemoteComponent>;

    /// Merge `members` into the component.
    async fn update_component(&self, component_id: &str, members: MemberPatch) -> SceneResult<()>;
}
