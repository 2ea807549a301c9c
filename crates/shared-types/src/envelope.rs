//! # Envelope and Reply
//!
//! Outbound frames are `{ "$type": <operation>, "messageId": <id>, ...fields }`.
//! Inbound frames are `{ "$type", "sourceMessageId", "success", "errorInfo"?,
//! "data"?, "assetURL"? }`.
//!
//! The host never invents ids: a reply is matched to its call only through
//! `sourceMessageId == messageId`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Remote operations understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationTag {
    /// Upload a local image file; the reply carries an asset locator.
    #[serde(rename = "importTexture2DFile")]
    ImportTexture,
    /// Create a container node.
    #[serde(rename = "addSlot")]
    AddNode,
    /// Fetch a node subtree.
    #[serde(rename = "getSlot")]
    GetNode,
    /// Attach a component to a node.
    #[serde(rename = "addComponent")]
    AddComponent,
    /// Fetch a component with its members.
    #[serde(rename = "getComponent")]
    GetComponent,
    /// Merge a partial member mapping into a component.
    #[serde(rename = "updateComponent")]
    UpdateComponent,
}

impl OperationTag {
    /// All operations, in protocol order.
    pub const ALL: [OperationTag; 6] = [
        OperationTag::ImportTexture,
        OperationTag::AddNode,
        OperationTag::GetNode,
        OperationTag::AddComponent,
        OperationTag::GetComponent,
        OperationTag::UpdateComponent,
    ];

    /// Wire name of the operation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OperationTag::ImportTexture => "importTexture2DFile",
            OperationTag::AddNode => "addSlot",
            OperationTag::GetNode => "getSlot",
            OperationTag::AddComponent => "addComponent",
            OperationTag::GetComponent => "getComponent",
            OperationTag::UpdateComponent => "updateComponent",
        }
    }
}

impl fmt::Display for OperationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Operation tag.
    #[serde(rename = "$type")]
    pub operation: OperationTag,
    /// Unique id echoed back by the host as `sourceMessageId`.
    #[serde(rename = "messageId")]
    pub message_id: String,
    /// Operation-specific fields, flattened next to the header.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Envelope {
    pub fn new(
        operation: OperationTag,
        message_id: impl Into<String>,
        payload: Map<String, Value>,
    ) -> Self {
        Self {
            operation,
            message_id: message_id.into(),
            payload,
        }
    }

    /// Encode as a single text frame.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a text frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Payload field lookup.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }
}

/// One inbound reply.
///
/// `success: false` is a business outcome, not a transport error; callers
/// inspect it explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    /// Reply kind as reported by the host (e.g. `response`, `slotData`).
    #[serde(rename = "$type", default)]
    pub kind: String,
    /// Id of the call this reply answers.
    pub source_message_id: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Asset locator returned by texture imports.
    #[serde(rename = "assetURL", default, skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,
}

impl Reply {
    /// Successful acknowledgement with no payload.
    pub fn ok(source_message_id: impl Into<String>) -> Self {
        Self {
            kind: "response".to_string(),
            source_message_id: source_message_id.into(),
            success: true,
            error_info: None,
            data: None,
            asset_url: None,
        }
    }

    /// Business failure with an error detail.
    pub fn failed(source_message_id: impl Into<String>, error_info: impl Into<String>) -> Self {
        Self {
            success: false,
            error_info: Some(error_info.into()),
            ..Self::ok(source_message_id)
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_asset_url(mut self, asset_url: impl Into<String>) -> Self {
        self.asset_url = Some(asset_url.into());
        self
    }

    /// Decode a text frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Encode as a single text frame.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Error detail for logging, or a placeholder when the host sent none.
    pub fn error_detail(&self) -> &str {
        self.error_info.as_deref().unwrap_or("no error detail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_flattens_payload() {
        let mut payload = Map::new();
        payload.insert("componentId".into(), json!("C1"));
        let envelope = Envelope::new(OperationTag::GetComponent, "m-1", payload);

        let value: Value = serde_json::from_str(&envelope.to_text().unwrap()).unwrap();
        assert_eq!(value["$type"], "getComponent");
        assert_eq!(value["messageId"], "m-1");
        assert_eq!(value["componentId"], "C1");
    }

    #[test]
    fn test_envelope_parse_keeps_unknown_fields_in_payload() {
        let text = r#"{"$type":"addSlot","messageId":"x","data":{"name":{"$type":"string","value":"a"}}}"#;
        let envelope = Envelope::parse(text).unwrap();
        assert_eq!(envelope.operation, OperationTag::AddNode);
        assert_eq!(envelope.message_id, "x");
        assert_eq!(envelope.field("data").unwrap()["name"]["value"], "a");
    }

    #[test]
    fn test_reply_parse_with_optional_fields_missing() {
        let reply = Reply::parse(r#"{"$type":"response","sourceMessageId":"abc","success":true}"#)
            .unwrap();
        assert!(reply.success);
        assert_eq!(reply.source_message_id, "abc");
        assert!(reply.error_info.is_none());
        assert!(reply.asset_url.is_none());
    }

    #[test]
    fn test_reply_asset_url_field_name() {
        let reply = Reply::parse(
            r#"{"$type":"assetData","sourceMessageId":"1","success":true,"assetURL":"res://abc"}"#,
        )
        .unwrap();
        assert_eq!(reply.asset_url.as_deref(), Some("res://abc"));

        let text = Reply::ok("2").with_asset_url("res://def").to_text().unwrap();
        assert!(text.contains("\"assetURL\":\"res://def\""));
    }

    #[test]
    fn test_reply_without_source_id_is_rejected() {
        assert!(Reply::parse(r#"{"$type":"response","success":true}"#).is_err());
        assert!(Reply::parse("not json").is_err());
    }

    #[test]
    fn test_failed_reply_detail() {
        let reply = Reply::failed("9", "Component not found");
        assert!(!reply.success);
        assert_eq!(reply.error_detail(), "Component not found");
        assert_eq!(Reply::ok("9").error_detail(), "no error detail");
    }

    #[test]
    fn test_operation_tag_names_match_serde() {
        for tag in OperationTag::ALL {
            let encoded = serde_json::to_value(tag).unwrap();
            assert_eq!(encoded, Value::String(tag.as_str().to_string()));
        }
    }
}
