//! Link client adapter.
//!
//! Implements [`SceneHost`] over [`LinkClient`]: turns `success: false`
//! replies into [`SceneError::Rejected`] and decodes `data` payloads into the
//! snapshot types.

use crate::domain::{SceneError, SceneResult};
use crate::ports::SceneHost;
use async_trait::async_trait;
use ls_01_link_client::{LinkClient, NewNode};
use serde::de::DeserializeOwned;
use shared_types::{MemberPatch, OperationTag, RemoteComponent, RemoteNode, Reply};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// [`SceneHost`] backed by a connected [`LinkClient`].
pub struct LinkSceneHost {
    client: Arc<LinkClient>,
}

impl LinkSceneHost {
    pub fn new(client: Arc<LinkClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<LinkClient> {
        &self.client
    }
}

fn accept(operation: OperationTag, reply: Reply) -> SceneResult<Reply> {
    if reply.success {
        Ok(reply)
    } else {
        debug!(%operation, detail = reply.error_detail(), "Host rejected call");
        Err(SceneError::Rejected {
            operation,
            detail: reply.error_detail().to_string(),
        })
    }
}

fn decode<T: DeserializeOwned>(operation: OperationTag, reply: Reply) -> SceneResult<T> {
    let data = reply.data.ok_or_else(|| SceneError::Decode {
        operation,
        reason: "reply has no data".into(),
    })?;
    serde_json::from_value(data).map_err(|e| SceneError::Decode {
        operation,
        reason: e.to_string(),
    })
}

#[async_trait]
impl SceneHost for LinkSceneHost {
    async fn import_texture(&self, file_path: &Path) -> SceneResult<String> {
        let operation = OperationTag::ImportTexture;
        let reply = accept(operation, self.client.import_texture(file_path).await?)?;
        reply.asset_url.ok_or_else(|| SceneError::Decode {
            operation,
            reason: "reply has no assetURL".into(),
        })
    }

    async fn add_node(&self, node: NewNode) -> SceneResult<()> {
        accept(OperationTag::AddNode, self.client.add_node(node).await?).map(drop)
    }

    async fn get_node(
        &self,
        node_id: &str,
        depth: u32,
        include_components: bool,
    ) -> SceneResult<RemoteNode> {
        let operation = OperationTag::GetNode;
        let reply = self.client.get_node(node_id, depth, include_components).await?;
        decode(operation, accept(operation, reply)?)
    }

    async fn add_component(&self, node_id: &str, component_type: &str) -> SceneResult<()> {
        let reply = self.client.add_component(node_id, component_type).await?;
        accept(OperationTag::AddComponent, reply).map(drop)
    }

    async fn get_component(&self, component_id: &str) -> SceneResult<RemoteComponent> {
        let operation = OperationTag::GetComponent;
        let reply = self.client.get_component(component_id).await?;
        decode(operation, accept(operation, reply)?)
    }

    async fn update_component(&self, component_id: &str, members: MemberPatch) -> SceneResult<()> {
        let reply = self.client.update_component(component_id, members).await?;
        accept(OperationTag::UpdateComponent, reply).map(drop)
    }
}
