//! Typed requests and their wire payloads.
//!
//! Each variant maps to one [`OperationTag`] and knows how to shape the
//! operation-specific fields that sit next to `$type` and `messageId`.

use crate::domain::error::LinkError;
use serde_json::{json, Map, Value};
use shared_types::{Float3, MemberPatch, OperationTag, ROOT_NODE_ID};
use std::path::PathBuf;

/// Parameters for `addSlot`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode {
    pub name: String,
    /// Parent node; the host root when absent.
    pub parent_id: Option<String>,
    pub position: Option<Float3>,
    pub active: Option<bool>,
}

impl NewNode {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
            position: None,
            active: None,
        }
    }

    pub fn under(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn at(mut self, position: Float3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    fn to_data(&self) -> Value {
        let mut data = Map::new();
        data.insert(
            "parent".into(),
            json!({
                "$type": "reference",
                "targetId": self.parent_id.as_deref().unwrap_or(ROOT_NODE_ID),
            }),
        );
        data.insert("name".into(), json!({ "$type": "string", "value": self.name }));
        if let Some(p) = self.position {
            data.insert(
                "position".into(),
                json!({ "$type": "float3", "value": { "x": p.x, "y": p.y, "z": p.z } }),
            );
        }
        if let Some(active) = self.active {
            data.insert("isActive".into(), json!({ "$type": "bool", "value": active }));
        }
        Value::Object(data)
    }
}

/// One request to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkRequest {
    ImportTexture {
        file_path: PathBuf,
    },
    AddNode(NewNode),
    GetNode {
        node_id: String,
        depth: u32,
        include_components: bool,
    },
    AddComponent {
        node_id: String,
        component_type: String,
    },
    GetComponent {
        component_id: String,
    },
    UpdateComponent {
        component_id: String,
        members: MemberPatch,
    },
}

impl LinkRequest {
    pub fn operation(&self) -> OperationTag {
        match self {
            LinkRequest::ImportTexture { .. } => OperationTag::ImportTexture,
            LinkRequest::AddNode(_) => OperationTag::AddNode,
            LinkRequest::GetNode { .. } => OperationTag::GetNode,
            LinkRequest::AddComponent { .. } => OperationTag::AddComponent,
            LinkRequest::GetComponent { .. } => OperationTag::GetComponent,
            LinkRequest::UpdateComponent { .. } => OperationTag::UpdateComponent,
        }
    }

    /// Operation-specific fields of the envelope.
    pub fn into_payload(self) -> Result<Map<String, Value>, LinkError> {
        let mut payload = Map::new();
        match self {
            LinkRequest::ImportTexture { file_path } => {
                let path = file_path.to_str().ok_or_else(|| {
                    LinkError::Encode(format!(
                        "path is not valid UTF-8: {}",
                        file_path.display()
                    ))
                })?;
                payload.insert("filePath".into(), Value::String(path.to_string()));
            }
            LinkRequest::AddNode(node) => {
                payload.insert("data".into(), node.to_data());
            }
            LinkRequest::GetNode {
                node_id,
                depth,
                include_components,
            } => {
                payload.insert("slotId".into(), Value::String(node_id));
                payload.insert("depth".into(), json!(depth));
                payload.insert("includeComponentData".into(), Value::Bool(include_components));
            }
            LinkRequest::AddComponent {
                node_id,
                component_type,
            } => {
                payload.insert("containerSlotId".into(), Value::String(node_id));
                payload.insert("data".into(), json!({ "componentType": component_type }));
            }
            LinkRequest::GetComponent { component_id } => {
                payload.insert("componentId".into(), Value::String(component_id));
            }
            LinkRequest::UpdateComponent {
                component_id,
                members,
            } => {
                payload.insert(
                    "data".into(),
                    json!({ "id": component_id, "members": serde_json::to_value(&members)? }),
                );
            }
        }
        Ok(payload)
    }
}
