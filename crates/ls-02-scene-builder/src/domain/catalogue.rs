//! The fixed component catalogue of an image object.
//!
//! Attachment order is [`ComponentRole::CATALOGUE`]. Hosts report component
//! types with assembly qualifiers (`[FrooxEngine]FrooxEngine.QuadMesh`);
//! matching ignores every `[...]` segment so both the qualified and the bare
//! namespace form resolve to the same role.

use std::fmt;

/// Namespace every catalogue type lives in.
pub const TYPE_NAMESPACE: &str = "[FrooxEngine]FrooxEngine.";

/// What each attached component does for the image object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentRole {
    Behavior,
    Texture,
    Exporter,
    Thumbnail,
    SnapPlane,
    ReferenceProxy,
    AssetProxy,
    Material,
    Mesh,
    Renderer,
    SizeDriver,
    Collider,
    SwizzleDriver,
}

impl ComponentRole {
    /// Every role, in attachment order.
    pub const CATALOGUE: [ComponentRole; 13] = [
        ComponentRole::Behavior,
        ComponentRole::Texture,
        ComponentRole::Exporter,
        ComponentRole::Thumbnail,
        ComponentRole::SnapPlane,
        ComponentRole::ReferenceProxy,
        ComponentRole::AssetProxy,
        ComponentRole::Material,
        ComponentRole::Mesh,
        ComponentRole::Renderer,
        ComponentRole::SizeDriver,
        ComponentRole::Collider,
        ComponentRole::SwizzleDriver,
    ];

    /// Unqualified host type name.
    pub const fn type_name(&self) -> &'static str {
        match self {
            ComponentRole::Behavior => "Grabbable",
            ComponentRole::Texture => "StaticTexture2D",
            ComponentRole::Exporter => "TextureExportable",
            ComponentRole::Thumbnail => "ItemTextureThumbnailSource",
            ComponentRole::SnapPlane => "SnapPlane",
            ComponentRole::ReferenceProxy => "ReferenceProxySource",
            ComponentRole::AssetProxy => "AssetProxy<[FrooxEngine]FrooxEngine.Texture2D>",
            ComponentRole::Material => "UnlitMaterial",
            ComponentRole::Mesh => "QuadMesh",
            ComponentRole::Renderer => "MeshRenderer",
            ComponentRole::SizeDriver => "TextureSizeDriver",
            ComponentRole::Collider => "BoxCollider",
            ComponentRole::SwizzleDriver => "Float2ToFloat3SwizzleDriver",
        }
    }

    /// Fully qualified type tag sent with `addComponent`.
    pub fn type_tag(&self) -> String {
        format!("{TYPE_NAMESPACE}{}", self.type_name())
    }

    /// Whether a host-reported type string denotes this role.
    pub fn matches(&self, reported: &str) -> bool {
        let reported = strip_qualifiers(reported);
        reported == strip_qualifiers(&self.type_tag()) || reported == strip_qualifiers(self.type_name())
    }

    /// Role for a host-reported type string, if it is part of the catalogue.
    pub fn classify(reported: &str) -> Option<ComponentRole> {
        Self::CATALOGUE.into_iter().find(|role| role.matches(reported))
    }

    pub const fn label(&self) -> &'static str {
        match self {
            ComponentRole::Behavior => "behavior",
            ComponentRole::Texture => "texture",
            ComponentRole::Exporter => "exporter",
            ComponentRole::Thumbnail => "thumbnail",
            ComponentRole::SnapPlane => "snap-plane",
            ComponentRole::ReferenceProxy => "reference-proxy",
            ComponentRole::AssetProxy => "asset-proxy",
            ComponentRole::Material => "material",
            ComponentRole::Mesh => "mesh",
            ComponentRole::Renderer => "renderer",
            ComponentRole::SizeDriver => "size-driver",
            ComponentRole::Collider => "collider",
            ComponentRole::SwizzleDriver => "swizzle-driver",
        }
    }
}

impl fmt::Display for ComponentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Drop every bracketed assembly qualifier.
pub fn strip_qualifiers(type_tag: &str) -> String {
    let mut out = String::with_capacity(type_tag.len());
    let mut depth = 0usize;
    for ch in type_tag.chars() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}
