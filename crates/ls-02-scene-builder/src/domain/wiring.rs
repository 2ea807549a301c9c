//! Cross-reference wiring between the catalogue components.
//!
//! Each [`WiringStep`] plans one `updateComponent` call from the resolved
//! component ids. Planning is pure: a missing prerequisite yields the reason
//! the step is skipped instead of a patch.

use super::catalogue::ComponentRole;
use shared_types::{Float3, MemberPatch, MemberUpdate};
use std::collections::BTreeMap;

/// Member holding the texture's asset locator.
pub const TEXTURE_URL_MEMBER: &str = "URL";

/// Renderer collection that references materials.
pub const MATERIALS_MEMBER: &str = "Materials";

/// Size field shared by the mesh and the collider.
pub const SIZE_MEMBER: &str = "Size";

/// Snap plane normal, facing the viewer.
pub const SNAP_NORMAL: Float3 = Float3::new(0.0, 0.0, 1.0);

/// Inputs the wiring steps draw from.
#[derive(Debug, Clone, Copy)]
pub struct WiringContext<'a> {
    /// Resolved component id per role.
    pub components: &'a BTreeMap<ComponentRole, String>,
    pub asset_url: &'a str,
    /// Member id of the mesh `Size` field.
    pub mesh_size_id: Option<&'a str>,
    /// Member id of the collider `Size` field.
    pub collider_size_id: Option<&'a str>,
}

impl WiringContext<'_> {
    fn component(&self, role: ComponentRole) -> Result<&str, String> {
        self.components
            .get(&role)
            .map(String::as_str)
            .ok_or_else(|| format!("{role} component missing"))
    }

    fn mesh_size(&self) -> Result<&str, String> {
        self.mesh_size_id
            .ok_or_else(|| format!("mesh {SIZE_MEMBER} member missing"))
    }

    fn collider_size(&self) -> Result<&str, String> {
        self.collider_size_id
            .ok_or_else(|| format!("collider {SIZE_MEMBER} member missing"))
    }
}

/// One wiring step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WiringStep {
    TextureUrl,
    Exporter,
    Thumbnail,
    SnapPlane,
    ReferenceProxy,
    AssetProxy,
    Material,
    RendererMesh,
    RendererMaterials,
    SizeDriver,
    Collider,
    SwizzleDriver,
}

impl WiringStep {
    pub const ORDER: [WiringStep; 12] = [
        WiringStep::TextureUrl,
        WiringStep::Exporter,
        WiringStep::Thumbnail,
        WiringStep::SnapPlane,
        WiringStep::ReferenceProxy,
        WiringStep::AssetProxy,
        WiringStep::Material,
        WiringStep::RendererMesh,
        WiringStep::RendererMaterials,
        WiringStep::SizeDriver,
        WiringStep::Collider,
        WiringStep::SwizzleDriver,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            WiringStep::TextureUrl => "texture-url",
            WiringStep::Exporter => "exporter",
            WiringStep::Thumbnail => "thumbnail",
            WiringStep::SnapPlane => "snap-plane",
            WiringStep::ReferenceProxy => "reference-proxy",
            WiringStep::AssetProxy => "asset-proxy",
            WiringStep::Material => "material",
            WiringStep::RendererMesh => "renderer-mesh",
            WiringStep::RendererMaterials => "renderer-materials",
            WiringStep::SizeDriver => "size-driver",
            WiringStep::Collider => "collider",
            WiringStep::SwizzleDriver => "swizzle-driver",
        }
    }

    /// Target component and patch for a single-update step.
    ///
    /// `RendererMaterials` is a list mutation and is planned by
    /// [`materials_target`] instead.
    pub fn plan(&self, ctx: &WiringContext<'_>) -> Result<(String, MemberPatch), String> {
        use ComponentRole as Role;

        let (target, patch) = match self {
            WiringStep::TextureUrl => (
                ctx.component(Role::Texture)?,
                texture_url_patch(ctx.asset_url),
            ),
            WiringStep::Exporter => (
                ctx.component(Role::Exporter)?,
                MemberPatch::new().set("Texture", MemberUpdate::reference(ctx.component(Role::Texture)?)),
            ),
            WiringStep::Thumbnail => (
                ctx.component(Role::Thumbnail)?,
                MemberPatch::new().set("Texture", MemberUpdate::reference(ctx.component(Role::Texture)?)),
            ),
            WiringStep::SnapPlane => (
                ctx.component(Role::SnapPlane)?,
                MemberPatch::new().set("Normal", MemberUpdate::float3(SNAP_NORMAL)),
            ),
            WiringStep::ReferenceProxy => (
                ctx.component(Role::ReferenceProxy)?,
                MemberPatch::new().set("Reference", MemberUpdate::reference(ctx.component(Role::Texture)?)),
            ),
            WiringStep::AssetProxy => (
                ctx.component(Role::AssetProxy)?,
                MemberPatch::new().set(
                    "AssetReference",
                    MemberUpdate::reference(ctx.component(Role::Texture)?),
                ),
            ),
            WiringStep::Material => (
                ctx.component(Role::Material)?,
                MemberPatch::new()
                    .set("Texture", MemberUpdate::reference(ctx.component(Role::Texture)?))
                    .set("BlendMode", MemberUpdate::enumeration("Alpha"))
                    .set("Sidedness", MemberUpdate::enumeration("Double")),
            ),
            WiringStep::RendererMesh => (
                ctx.component(Role::Renderer)?,
                MemberPatch::new().set("Mesh", MemberUpdate::reference(ctx.component(Role::Mesh)?)),
            ),
            WiringStep::RendererMaterials => {
                return Err("planned as a list mutation".into());
            }
            WiringStep::SizeDriver => (
                ctx.component(Role::SizeDriver)?,
                MemberPatch::new()
                    .set("Texture", MemberUpdate::reference(ctx.component(Role::Texture)?))
                    .set("Target", MemberUpdate::reference(ctx.mesh_size()?))
                    .set("DriveMode", MemberUpdate::enumeration("Normalized")),
            ),
            WiringStep::Collider => (
                ctx.component(Role::Collider)?,
                MemberPatch::new().set("Type", MemberUpdate::enumeration("NoCollision")),
            ),
            WiringStep::SwizzleDriver => (
                ctx.component(Role::SwizzleDriver)?,
                MemberPatch::new()
                    .set("Source", MemberUpdate::reference(ctx.mesh_size()?))
                    .set("Target", MemberUpdate::reference(ctx.collider_size()?))
                    .set("X", MemberUpdate::int(0))
                    .set("Y", MemberUpdate::int(1))
                    .set("Z", MemberUpdate::int(-1)),
            ),
        };
        Ok((target.to_string(), patch))
    }
}

/// Renderer and material ids for the materials list.
pub fn materials_target(ctx: &WiringContext<'_>) -> Result<(String, String), String> {
    let renderer = ctx.component(ComponentRole::Renderer)?;
    let material = ctx.component(ComponentRole::Material)?;
    Ok((renderer.to_string(), material.to_string()))
}

/// Patch pointing a texture at a new asset.
pub fn texture_url_patch(asset_url: &str) -> MemberPatch {
    MemberPatch::new().set(TEXTURE_URL_MEMBER, MemberUpdate::uri(asset_url))
}
