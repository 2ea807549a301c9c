//! # Member updates
//!
//! Outbound wrappers for `updateComponent`. A literal is sent as
//! `{ "$type": <type>, "value": ... }`, a reference as
//! `{ "$type": "reference", "targetId": ... }`, and a collection as
//! `{ "$type": "list", "elements": [...] }`.
//!
//! An element without `id` asks the host to allocate a new slot; an element
//! with `id` retargets that existing slot.

use crate::scene::{Float3, RawMember, LIST_KIND, REFERENCE_KIND};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// One member assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "RawMember")]
pub enum MemberUpdate {
    Value { type_tag: String, value: Value },
    Reference { target_id: String },
    Collection { elements: Vec<ElementUpdate> },
}

/// One collection element assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementUpdate {
    /// Existing element id; `None` appends a new element.
    pub id: Option<String>,
    pub target_id: String,
}

impl ElementUpdate {
    /// New element; the host assigns its id.
    pub fn append(target_id: impl Into<String>) -> Self {
        Self {
            id: None,
            target_id: target_id.into(),
        }
    }

    /// Retarget an existing element.
    pub fn existing(id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            target_id: target_id.into(),
        }
    }
}

impl MemberUpdate {
    pub fn value(type_tag: impl Into<String>, value: Value) -> Self {
        MemberUpdate::Value {
            type_tag: type_tag.into(),
            value,
        }
    }

    pub fn uri(uri: impl Into<String>) -> Self {
        Self::value("Uri", Value::String(uri.into()))
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self::value("string", Value::String(text.into()))
    }

    pub fn boolean(flag: bool) -> Self {
        Self::value("bool", Value::Bool(flag))
    }

    pub fn int(number: i32) -> Self {
        Self::value("int", json!(number))
    }

    pub fn float3(vector: Float3) -> Self {
        Self::value("float3", json!({ "x": vector.x, "y": vector.y, "z": vector.z }))
    }

    /// Enum members travel as their variant name.
    pub fn enumeration(variant: impl Into<String>) -> Self {
        Self::value("enum", Value::String(variant.into()))
    }

    pub fn reference(target_id: impl Into<String>) -> Self {
        MemberUpdate::Reference {
            target_id: target_id.into(),
        }
    }

    pub fn list(elements: Vec<ElementUpdate>) -> Self {
        MemberUpdate::Collection { elements }
    }
}

impl From<MemberUpdate> for RawMember {
    fn from(update: MemberUpdate) -> Self {
        match update {
            MemberUpdate::Value { type_tag, value } => RawMember {
                kind: type_tag,
                value: Some(value),
                ..Default::default()
            },
            MemberUpdate::Reference { target_id } => RawMember {
                kind: REFERENCE_KIND.to_string(),
                target_id: Some(target_id),
                ..Default::default()
            },
            MemberUpdate::Collection { elements } => RawMember {
                kind: LIST_KIND.to_string(),
                elements: Some(
                    elements
                        .into_iter()
                        .map(|element| RawMember {
                            kind: REFERENCE_KIND.to_string(),
                            id: element.id,
                            target_id: Some(element.target_id),
                            ..Default::default()
                        })
                        .collect(),
                ),
                ..Default::default()
            },
        }
    }
}

/// Partial member mapping merged by `updateComponent`. Ordered by member name
/// so encoded frames are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MemberPatch(BTreeMap<String, MemberUpdate>);

impl MemberPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn set(mut self, name: impl Into<String>, update: MemberUpdate) -> Self {
        self.0.insert(name.into(), update);
        self
    }

    pub fn get(&self, name: &str) -> Option<&MemberUpdate> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
