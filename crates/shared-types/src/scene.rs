//! # Remote scene snapshots
//!
//! Read-only views of host state as returned by `getSlot` and `getComponent`.
//! They are request-scoped: never cached, never mutated locally.
//!
//! The host wraps most scalars as `{ "$type": "string", "value": ... }`; the
//! deserializers here accept both the wrapped and the plain form.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Id of the scene root on the host.
pub const ROOT_NODE_ID: &str = "Root";

/// 3-component vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Float3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Float3 {
    pub const ZERO: Float3 = Float3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Offset along the X axis.
    pub fn offset_x(self, dx: f32) -> Self {
        Self { x: self.x + dx, ..self }
    }
}

impl From<[f32; 3]> for Float3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeWrapped<T> {
    Wrapped { value: T },
    Plain(T),
}

impl<T> MaybeWrapped<T> {
    fn into_inner(self) -> T {
        match self {
            MaybeWrapped::Wrapped { value } | MaybeWrapped::Plain(value) => value,
        }
    }
}

fn wrapped<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    MaybeWrapped::<T>::deserialize(deserializer).map(MaybeWrapped::into_inner)
}

fn wrapped_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<MaybeWrapped<T>>::deserialize(deserializer).map(|v| v.map(MaybeWrapped::into_inner))
}

fn default_active() -> bool {
    true
}

/// Node snapshot. Children are bounded by the depth the caller requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNode {
    pub id: String,
    #[serde(deserialize_with = "wrapped")]
    pub name: String,
    #[serde(default, deserialize_with = "wrapped_opt", skip_serializing_if = "Option::is_none")]
    pub position: Option<Float3>,
    #[serde(default = "default_active", deserialize_with = "wrapped")]
    pub is_active: bool,
    #[serde(default)]
    pub children: Vec<RemoteNode>,
    /// Present only when component data was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<RemoteComponent>>,
}

impl RemoteNode {
    /// Components attached to this node, empty when they were not requested.
    pub fn components(&self) -> &[RemoteComponent] {
        self.components.as_deref().unwrap_or(&[])
    }
}

/// Component snapshot. `members` is populated only on detailed fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteComponent {
    pub id: String,
    #[serde(rename = "componentType", alias = "type")]
    pub component_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub members: BTreeMap<String, Member>,
}

impl RemoteComponent {
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    /// Id of a member, when the host reported one.
    pub fn member_id(&self, name: &str) -> Option<&str> {
        self.member(name).and_then(Member::id)
    }
}

/// One component member.
///
/// The host shares one envelope shape across variants; `$type` decides which
/// one applies: `reference`, `list`, or any scalar type name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMember", into = "RawMember")]
pub enum Member {
    Field {
        id: Option<String>,
        type_tag: String,
        value: Value,
    },
    Reference {
        id: Option<String>,
        target_id: Option<String>,
    },
    Collection {
        id: Option<String>,
        elements: Vec<Member>,
    },
}

impl Member {
    pub fn id(&self) -> Option<&str> {
        match self {
            Member::Field { id, .. } | Member::Reference { id, .. } | Member::Collection { id, .. } => {
                id.as_deref()
            }
        }
    }

    /// Reference target, for reference members.
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Member::Reference { target_id, .. } => target_id.as_deref(),
            _ => None,
        }
    }

    /// Scalar value, for field members.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Member::Field { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Elements, for collection members.
    pub fn elements(&self) -> Option<&[Member]> {
        match self {
            Member::Collection { elements, .. } => Some(elements),
            _ => None,
        }
    }
}

/// Wire form shared by member snapshots and member updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct RawMember {
    #[serde(rename = "$type")]
    pub(crate) kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) value: Option<Value>,
    #[serde(rename = "targetId", default, skip_serializing_if = "Option::is_none")]
    pub(crate) target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) elements: Option<Vec<RawMember>>,
}

pub(crate) const REFERENCE_KIND: &str = "reference";
pub(crate) const LIST_KIND: &str = "list";

impl From<RawMember> for Member {
    fn from(raw: RawMember) -> Self {
        match raw.kind.as_str() {
            REFERENCE_KIND => Member::Reference {
                id: raw.id,
                target_id: raw.target_id,
            },
            LIST_KIND => Member::Collection {
                id: raw.id,
                elements: raw
                    .elements
                    .unwrap_or_default()
                    .into_iter()
                    .map(Member::from)
                    .collect(),
            },
            _ => Member::Field {
                id: raw.id,
                type_tag: raw.kind,
                value: raw.value.unwrap_or(Value::Null),
            },
        }
    }
}

impl From<Member> for RawMember {
    fn from(member: Member) -> Self {
        match member {
            Member::Field { id, type_tag, value } => RawMember {
                kind: type_tag,
                id,
                value: Some(value),
                ..Default::default()
            },
            Member::Reference { id, target_id } => RawMember {
                kind: REFERENCE_KIND.to_string(),
                id,
                target_id,
                ..Default::default()
            },
            Member::Collection { id, elements } => RawMember {
                kind: LIST_KIND.to_string(),
                id,
                elements: Some(elements.into_iter().map(RawMember::from).collect()),
                ..Default::default()
            },
        }
    }
}
