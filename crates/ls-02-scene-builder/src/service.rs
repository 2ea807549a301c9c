//! Scene builder service.
//!
//! Construct and refresh are linear pipelines over [`SceneHost`] calls, each
//! awaited before the next. The host never returns ids from create calls, so
//! every new node or component is rediscovered by reading the tree back.
//!
//! Failure policy:
//! - link failures (timeout, transport, closed) abort the run;
//! - a rejected `addSlot` aborts the run;
//! - rejected component and wiring calls are recorded in the report and the
//!   run continues; steps whose prerequisites are missing are skipped.

use crate::domain::{
    find_all_by_name, find_by_name, materials_target, texture_url_patch, ComponentRole, ConstructReport, ListSlot,
    RefreshOutcome, SceneConfig, SceneError, SceneResult, WiringContext, WiringStep,
    MATERIALS_MEMBER, SIZE_MEMBER,
};
use crate::ports::SceneHost;
use ls_01_link_client::NewNode;
use shared_types::{
    ElementUpdate, Float3, MemberPatch, MemberUpdate, OperationTag, RemoteComponent, RemoteNode,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds and refreshes image objects in the remote scene.
pub struct SceneBuilder {
    host: Arc<dyn SceneHost>,
    config: SceneConfig,
}

impl SceneBuilder {
    pub fn new(host: Arc<dyn SceneHost>, config: SceneConfig) -> Self {
        Self { host, config }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn host(&self) -> &Arc<dyn SceneHost> {
        &self.host
    }

    /// Fetch the subtree under `root_id` and search it for `name`.
    ///
    /// Every call re-fetches; the remote tree may change between calls.
    pub async fn lookup(
        &self,
        name: &str,
        root_id: &str,
        max_depth: u32,
    ) -> SceneResult<Option<RemoteNode>> {
        let tree = self.host.get_node(root_id, max_depth, false).await?;
        Ok(find_by_name(&tree, name, max_depth).cloned())
    }

    /// [`lookup`](Self::lookup) under the configured root and depth.
    pub async fn find_by_name(&self, name: &str) -> SceneResult<Option<RemoteNode>> {
        self.lookup(name, &self.config.root_id, self.config.lookup_depth)
            .await
    }

    /// Every node named `name` under the configured root, in lookup order.
    pub async fn find_all_by_name(&self, name: &str) -> SceneResult<Vec<RemoteNode>> {
        let depth = self.config.lookup_depth;
        let tree = self.host.get_node(&self.config.root_id, depth, false).await?;
        Ok(find_all_by_name(&tree, name, depth)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Create a node named `name` and attach the full component catalogue
    /// pointing at `asset_url`.
    pub async fn construct(
        &self,
        name: &str,
        asset_url: &str,
        position: Float3,
    ) -> SceneResult<ConstructReport> {
        info!(name, asset_url, "Constructing image object");

        // Nodes already carrying this name; the new one is whichever is not.
        let existing: HashSet<String> = match self.find_all_by_name(name).await {
            Ok(nodes) => nodes.into_iter().map(|n| n.id).collect(),
            // A missing root holds nothing; addSlot reports the real failure.
            Err(e) if e.is_rejection() => HashSet::new(),
            Err(e) => return Err(e),
        };

        let node = NewNode::named(name)
            .under(self.config.root_id.clone())
            .at(position)
            .active(true);
        self.host.add_node(node).await?;

        let node = self
            .find_all_by_name(name)
            .await?
            .into_iter()
            .find(|n| !existing.contains(&n.id))
            .ok_or_else(|| SceneError::NodeNotFound {
                name: name.to_string(),
            })?;
        if !existing.is_empty() {
            debug!(name, node_id = %node.id, previous = existing.len(), "Name already in use");
        }
        let mut report = ConstructReport::new(node.id.clone());

        for role in ComponentRole::CATALOGUE {
            if let Err(e) = self.host.add_component(&node.id, &role.type_tag()).await {
                record(&mut report, role.label(), e)?;
            }
        }

        let resolved = self.resolve_components(&node.id).await?;
        report.components = resolved
            .iter()
            .map(|(role, component)| (*role, component.id.clone()))
            .collect();
        for role in ComponentRole::CATALOGUE {
            if !resolved.contains_key(&role) {
                debug!(node_id = %node.id, %role, "Component not found after attach");
            }
        }

        self.wire(&mut report, &resolved, asset_url).await?;

        info!(
            name,
            node_id = %report.node_id,
            components = report.components.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Image object constructed"
        );
        Ok(report)
    }

    /// Point an existing object at `asset_url`, or build it if absent.
    pub async fn refresh_or_construct(
        &self,
        name: &str,
        asset_url: &str,
        position: Option<Float3>,
    ) -> SceneResult<RefreshOutcome> {
        let default = self.config.default_position;
        self.refresh_or_construct_at(name, asset_url, || position.unwrap_or(default))
            .await
    }

    /// Like [`refresh_or_construct`](Self::refresh_or_construct), but only
    /// asks `place` for a position when a new object is actually built.
    pub async fn refresh_or_construct_at<P>(
        &self,
        name: &str,
        asset_url: &str,
        place: P,
    ) -> SceneResult<RefreshOutcome>
    where
        P: FnOnce() -> Float3 + Send,
    {
        let Some(node) = self.find_by_name(name).await? else {
            let report = self.construct(name, asset_url, place()).await?;
            return Ok(RefreshOutcome::Constructed(report));
        };

        let detailed = self.host.get_node(&node.id, 0, true).await?;
        let texture = detailed
            .components()
            .iter()
            .find(|c| ComponentRole::Texture.matches(&c.component_type));

        match texture {
            Some(texture) => {
                self.host
                    .update_component(&texture.id, texture_url_patch(asset_url))
                    .await?;
                info!(name, node_id = %node.id, asset_url, "Image object refreshed");
                Ok(RefreshOutcome::Updated {
                    node_id: node.id,
                    texture_id: texture.id.clone(),
                })
            }
            None => {
                warn!(name, node_id = %node.id, "Node has no texture component");
                Ok(RefreshOutcome::NotUpdatable { node_id: node.id })
            }
        }
    }

    /// Make the first element of collection `list` on `component_id`
    /// reference `target_id`.
    ///
    /// An element cannot be targeted before the host has allocated it, so an
    /// empty collection takes two updates: append an element without an id,
    /// read back the id the host assigned, then retarget that element. A
    /// non-empty collection only gets the retarget, which makes repeated runs
    /// leave exactly one element.
    pub async fn ensure_list_reference(
        &self,
        component_id: &str,
        list: &str,
        target_id: &str,
    ) -> SceneResult<ListSlot> {
        let current = self.host.get_component(component_id).await?;

        let (element_id, created) = match first_element_id(&current, list) {
            Some(id) => {
                debug!(component_id, list, element_id = %id, "Collection populated, retargeting");
                (id, false)
            }
            None => {
                let append = MemberPatch::new().set(
                    list,
                    MemberUpdate::list(vec![ElementUpdate::append(target_id)]),
                );
                self.host.update_component(component_id, append).await?;

                let refreshed = self.host.get_component(component_id).await?;
                let id = first_element_id(&refreshed, list).ok_or_else(|| SceneError::Decode {
                    operation: OperationTag::GetComponent,
                    reason: format!("{list} still empty after append"),
                })?;
                debug!(component_id, list, element_id = %id, "Collection slot allocated");
                (id, true)
            }
        };

        let fill = MemberPatch::new().set(
            list,
            MemberUpdate::list(vec![ElementUpdate::existing(element_id.clone(), target_id)]),
        );
        self.host.update_component(component_id, fill).await?;

        Ok(ListSlot {
            element_id,
            created,
        })
    }

    /// Components attached to `node_id`, first match per catalogue role.
    async fn resolve_components(
        &self,
        node_id: &str,
    ) -> SceneResult<BTreeMap<ComponentRole, RemoteComponent>> {
        let node = self.host.get_node(node_id, 0, true).await?;
        let mut resolved = BTreeMap::new();
        for component in node.components() {
            if let Some(role) = ComponentRole::classify(&component.component_type) {
                resolved.entry(role).or_insert_with(|| component.clone());
            }
        }
        Ok(resolved)
    }

    /// Id of `member` on `component`, fetching member detail if needed.
    async fn member_id(
        &self,
        component: Option<&RemoteComponent>,
        member: &str,
    ) -> SceneResult<Option<String>> {
        let Some(component) = component else {
            return Ok(None);
        };
        if let Some(id) = component.member_id(member) {
            return Ok(Some(id.to_string()));
        }
        match self.host.get_component(&component.id).await {
            Ok(detailed) => Ok(detailed.member_id(member).map(str::to_string)),
            Err(e) if e.is_rejection() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn wire(
        &self,
        report: &mut ConstructReport,
        resolved: &BTreeMap<ComponentRole, RemoteComponent>,
        asset_url: &str,
    ) -> SceneResult<()> {
        let mesh_size = self
            .member_id(resolved.get(&ComponentRole::Mesh), SIZE_MEMBER)
            .await?;
        let collider_size = self
            .member_id(resolved.get(&ComponentRole::Collider), SIZE_MEMBER)
            .await?;
        let components = report.components.clone();
        let ctx = WiringContext {
            components: &components,
            asset_url,
            mesh_size_id: mesh_size.as_deref(),
            collider_size_id: collider_size.as_deref(),
        };

        for step in WiringStep::ORDER {
            let label = step.label();

            if step == WiringStep::RendererMaterials {
                match materials_target(&ctx) {
                    Ok((renderer, material)) => {
                        let slot = self
                            .ensure_list_reference(&renderer, MATERIALS_MEMBER, &material)
                            .await;
                        if let Err(e) = slot {
                            record(report, label, e)?;
                        }
                    }
                    Err(reason) => skip(report, label, reason),
                }
                continue;
            }

            match step.plan(&ctx) {
                Ok((target, patch)) => {
                    if let Err(e) = self.host.update_component(&target, patch).await {
                        record(report, label, e)?;
                    }
                }
                Err(reason) => skip(report, label, reason),
            }
        }
        Ok(())
    }
}

fn first_element_id(component: &RemoteComponent, list: &str) -> Option<String> {
    component
        .member(list)
        .and_then(|m| m.elements())
        .and_then(|elements| elements.first())
        .and_then(|element| element.id())
        .map(str::to_string)
}

fn skip(report: &mut ConstructReport, step: &'static str, reason: String) {
    debug!(step, %reason, "Skipping step");
    report.skip(step, reason);
}

/// Keep host rejections and decode failures in the report; anything else
/// aborts the run.
fn record(report: &mut ConstructReport, step: &'static str, error: SceneError) -> SceneResult<()> {
    match error {
        SceneError::Rejected { .. } | SceneError::Decode { .. } => {
            warn!(step, error = %error, "Step failed");
            report.fail(step, error.to_string());
            Ok(())
        }
        other => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LinkSceneHost;
    use ls_01_link_client::test_utils::{LoopbackTransport, SimulatedHost};
    use ls_01_link_client::{LinkClient, LinkConfig, LinkError};
    use serde_json::json;
    use shared_types::ROOT_NODE_ID;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn builder_over(host: Arc<SimulatedHost>, config: SceneConfig) -> SceneBuilder {
        let transport = Arc::new(LoopbackTransport::new(host));
        let client = Arc::new(LinkClient::new(
            transport,
            LinkConfig::default().with_call_timeout(Duration::from_millis(500)),
        ));
        client.connect().await.unwrap();
        SceneBuilder::new(Arc::new(LinkSceneHost::new(client)), config)
    }

    fn added_component_types(host: &SimulatedHost) -> Vec<String> {
        host.received()
            .into_iter()
            .filter(|e| e.operation == OperationTag::AddComponent)
            .filter_map(|e| e.payload["data"]["componentType"].as_str().map(str::to_string))
            .collect()
    }

    #[tokio::test]
    async fn test_lookup_on_root_only_tree() {
        let host = Arc::new(SimulatedHost::new());
        let builder = builder_over(host, SceneConfig::default()).await;

        assert!(builder.lookup("cat.png", ROOT_NODE_ID, 5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lookup_finds_depth_three_within_five() {
        let host = Arc::new(SimulatedHost::new());
        let a = host.seed_node(ROOT_NODE_ID, "a").unwrap();
        let b = host.seed_node(&a, "b").unwrap();
        let c = host.seed_node(&b, "cat.png").unwrap();
        let builder = builder_over(host, SceneConfig::default()).await;

        let found = builder.lookup("cat.png", ROOT_NODE_ID, 5).await.unwrap();
        assert_eq!(found.map(|n| n.id), Some(c));
    }

    #[tokio::test]
    async fn test_construct_attaches_catalogue_in_order() {
        let host = Arc::new(SimulatedHost::new());
        let builder = builder_over(host.clone(), SceneConfig::default()).await;

        let report = builder
            .construct("cat.png", "res://abc", Float3::ZERO)
            .await
            .unwrap();
        assert!(report.is_complete(), "{report:?}");

        let ops = host.operations();
        assert_eq!(ops[0], OperationTag::GetNode);
        assert_eq!(ops[1], OperationTag::AddNode);
        assert_eq!(ops[2], OperationTag::GetNode);
        assert!(ops[3..16].iter().all(|op| *op == OperationTag::AddComponent));

        let expected: Vec<String> = ComponentRole::CATALOGUE.iter().map(|r| r.type_tag()).collect();
        assert_eq!(added_component_types(&host), expected);
        assert_eq!(host.nodes_named("cat.png"), vec![report.node_id.clone()]);
    }

    #[tokio::test]
    async fn test_construct_order_is_deterministic() {
        let host = Arc::new(SimulatedHost::new());
        let builder = builder_over(host.clone(), SceneConfig::default()).await;

        builder.construct("a.png", "res://a", Float3::ZERO).await.unwrap();
        let first = host.operations();
        host.clear_received();
        builder.construct("b.png", "res://b", Float3::ZERO).await.unwrap();

        assert_eq!(host.operations(), first);
    }

    #[tokio::test]
    async fn test_construct_wires_references() {
        let host = Arc::new(SimulatedHost::new());
        let builder = builder_over(host.clone(), SceneConfig::default()).await;

        let report = builder
            .construct("cat.png", "res://abc", Float3::new(1.0, 0.0, 0.0))
            .await
            .unwrap();
        let node = report.node_id.as_str();
        let texture_id = report.component_id(ComponentRole::Texture).unwrap();
        let material_id = report.component_id(ComponentRole::Material).unwrap();

        let texture = host.find_component(node, "StaticTexture2D").unwrap();
        assert_eq!(texture.member("URL").unwrap().value(), Some(&json!("res://abc")));

        let exporter = host.find_component(node, "TextureExportable").unwrap();
        assert_eq!(exporter.member("Texture").unwrap().target_id(), Some(texture_id));

        let material = host.find_component(node, "UnlitMaterial").unwrap();
        assert_eq!(material.member("Texture").unwrap().target_id(), Some(texture_id));
        assert_eq!(material.member("BlendMode").unwrap().value(), Some(&json!("Alpha")));
        assert_eq!(material.member("Sidedness").unwrap().value(), Some(&json!("Double")));

        let renderer = host.find_component(node, "MeshRenderer").unwrap();
        let elements = renderer.member("Materials").unwrap().elements().unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].target_id(), Some(material_id));

        let mesh = host.find_component(node, "QuadMesh").unwrap();
        let collider = host.find_component(node, "BoxCollider").unwrap();
        let driver = host.find_component(node, "TextureSizeDriver").unwrap();
        assert_eq!(driver.member("Target").unwrap().target_id(), mesh.member_id("Size"));
        assert_eq!(driver.member("DriveMode").unwrap().value(), Some(&json!("Normalized")));
        assert_eq!(collider.member("Type").unwrap().value(), Some(&json!("NoCollision")));

        let swizzle = host.find_component(node, "Float2ToFloat3SwizzleDriver").unwrap();
        assert_eq!(swizzle.member("Source").unwrap().target_id(), mesh.member_id("Size"));
        assert_eq!(swizzle.member("Target").unwrap().target_id(), collider.member_id("Size"));
        assert_eq!(swizzle.member("Z").unwrap().value(), Some(&json!(-1)));

        assert_eq!(host.node_position(node), Some(Float3::new(1.0, 0.0, 0.0)));
    }

    #[tokio::test]
    async fn test_list_append_is_idempotent() {
        let host = Arc::new(SimulatedHost::new());
        let node = host.seed_node(ROOT_NODE_ID, "n").unwrap();
        let renderer = host.seed_component(&node, "MeshRenderer").unwrap();
        let builder = builder_over(host.clone(), SceneConfig::default()).await;

        let first = builder
            .ensure_list_reference(&renderer, MATERIALS_MEMBER, "MAT")
            .await
            .unwrap();
        assert!(first.created);

        host.clear_received();
        let second = builder
            .ensure_list_reference(&renderer, MATERIALS_MEMBER, "MAT")
            .await
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.element_id, first.element_id);
        // Fetch, then a single retarget: no append phase.
        assert_eq!(
            host.operations(),
            vec![OperationTag::GetComponent, OperationTag::UpdateComponent]
        );

        let component = host.component(&renderer).unwrap();
        let elements = component.member(MATERIALS_MEMBER).unwrap().elements().unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].target_id(), Some("MAT"));
    }

    #[tokio::test]
    async fn test_list_append_retargets_existing_element() {
        let host = Arc::new(SimulatedHost::new());
        let node = host.seed_node(ROOT_NODE_ID, "n").unwrap();
        let renderer = host.seed_component(&node, "MeshRenderer").unwrap();
        let builder = builder_over(host.clone(), SceneConfig::default()).await;

        builder
            .ensure_list_reference(&renderer, MATERIALS_MEMBER, "OLD")
            .await
            .unwrap();
        builder
            .ensure_list_reference(&renderer, MATERIALS_MEMBER, "NEW")
            .await
            .unwrap();

        let component = host.component(&renderer).unwrap();
        let elements = component.member(MATERIALS_MEMBER).unwrap().elements().unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].target_id(), Some("NEW"));
    }

    #[tokio::test]
    async fn test_missing_mesh_skips_dependent_steps() {
        let host = Arc::new(SimulatedHost::new());
        host.reject_component_type("QuadMesh");
        let builder = builder_over(host.clone(), SceneConfig::default()).await;

        let report = builder
            .construct("cat.png", "res://abc", Float3::ZERO)
            .await
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].step, "mesh");
        let skipped: Vec<_> = report.skipped.iter().map(|s| s.step).collect();
        assert_eq!(skipped, vec!["renderer-mesh", "size-driver", "swizzle-driver"]);
        assert!(report.component_id(ComponentRole::Mesh).is_none());

        // Independent wiring still happened.
        let node = report.node_id.as_str();
        let collider = host.find_component(node, "BoxCollider").unwrap();
        assert_eq!(collider.member("Type").unwrap().value(), Some(&json!("NoCollision")));
        let renderer = host.find_component(node, "MeshRenderer").unwrap();
        assert_eq!(renderer.member("Materials").unwrap().elements().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_add_node_aborts() {
        let host = Arc::new(SimulatedHost::new());
        let config = SceneConfig {
            root_id: "Nowhere".into(),
            ..SceneConfig::default()
        };
        let builder = builder_over(host.clone(), config).await;

        let err = builder
            .construct("cat.png", "res://abc", Float3::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SceneError::Rejected {
                operation: OperationTag::AddNode,
                ..
            }
        ));
        assert_eq!(
            host.operations(),
            vec![OperationTag::GetNode, OperationTag::AddNode]
        );
    }

    #[tokio::test]
    async fn test_construct_over_existing_name_uses_new_node() {
        let host = Arc::new(SimulatedHost::new());
        let old = host.seed_node(ROOT_NODE_ID, "bare.png").unwrap();
        let builder = builder_over(host.clone(), SceneConfig::default()).await;

        let report = builder
            .construct("bare.png", "res://x", Float3::new(3.0, 0.0, 0.0))
            .await
            .unwrap();

        assert_ne!(report.node_id, old);
        assert_eq!(host.nodes_named("bare.png"), vec![old.clone(), report.node_id.clone()]);
        assert_eq!(host.node_position(&report.node_id), Some(Float3::new(3.0, 0.0, 0.0)));
        assert!(host.find_component(&report.node_id, "StaticTexture2D").is_some());
        assert!(host.node_components(&old).is_empty());
    }

    #[tokio::test]
    async fn test_refresh_existing_updates_only_url() {
        let host = Arc::new(SimulatedHost::new());
        let builder = builder_over(host.clone(), SceneConfig::default()).await;
        let report = builder
            .construct("cat.png", "res://abc", Float3::ZERO)
            .await
            .unwrap();
        host.clear_received();

        let outcome = builder
            .refresh_or_construct("cat.png", "res://def", None)
            .await
            .unwrap();

        let texture_id = report.component_id(ComponentRole::Texture).unwrap().to_string();
        assert_eq!(
            outcome,
            RefreshOutcome::Updated {
                node_id: report.node_id.clone(),
                texture_id: texture_id.clone(),
            }
        );
        assert!(host
            .operations()
            .iter()
            .all(|op| !matches!(op, OperationTag::AddNode | OperationTag::AddComponent)));

        let updates: Vec<_> = host
            .received()
            .into_iter()
            .filter(|e| e.operation == OperationTag::UpdateComponent)
            .collect();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].payload["data"]["id"], json!(texture_id));
        assert_eq!(
            updates[0].payload["data"]["members"],
            json!({ "URL": { "$type": "Uri", "value": "res://def" } })
        );
        assert_eq!(host.nodes_named("cat.png").len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_absent_constructs() {
        let host = Arc::new(SimulatedHost::new());
        let builder = builder_over(host.clone(), SceneConfig::default()).await;

        let outcome = builder
            .refresh_or_construct("dog.png", "res://dog", Some(Float3::new(2.0, 0.0, 0.0)))
            .await
            .unwrap();

        match outcome {
            RefreshOutcome::Constructed(report) => {
                assert!(report.is_complete());
                assert_eq!(host.node_position(&report.node_id), Some(Float3::new(2.0, 0.0, 0.0)));
            }
            other => panic!("expected construction, got {other:?}"),
        }
        assert_eq!(added_component_types(&host).len(), ComponentRole::CATALOGUE.len());
    }

    #[tokio::test]
    async fn test_refresh_without_texture_is_not_updatable() {
        let host = Arc::new(SimulatedHost::new());
        let node = host.seed_node(ROOT_NODE_ID, "bare.png").unwrap();
        let builder = builder_over(host.clone(), SceneConfig::default()).await;

        let outcome = builder
            .refresh_or_construct("bare.png", "res://x", None)
            .await
            .unwrap();
        assert_eq!(outcome, RefreshOutcome::NotUpdatable { node_id: node });
    }

    #[tokio::test]
    async fn test_placement_is_only_requested_for_new_objects() {
        let host = Arc::new(SimulatedHost::new());
        let builder = builder_over(host.clone(), SceneConfig::default()).await;
        builder
            .construct("cat.png", "res://abc", Float3::ZERO)
            .await
            .unwrap();
        let asked = AtomicUsize::new(0);
        let place = || {
            asked.fetch_add(1, Ordering::SeqCst);
            Float3::new(4.5, 0.0, 0.0)
        };

        let refreshed = builder
            .refresh_or_construct_at("cat.png", "res://def", place)
            .await
            .unwrap();
        assert!(matches!(refreshed, RefreshOutcome::Updated { .. }));
        assert_eq!(asked.load(Ordering::SeqCst), 0);

        let built = builder
            .refresh_or_construct_at("dog.png", "res://dog", place)
            .await
            .unwrap();
        let RefreshOutcome::Constructed(report) = built else {
            panic!("expected construction, got {built:?}");
        };
        assert_eq!(asked.load(Ordering::SeqCst), 1);
        assert_eq!(host.node_position(&report.node_id), Some(Float3::new(4.5, 0.0, 0.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_link_timeout_aborts_run() {
        let host = Arc::new(SimulatedHost::new());
        host.set_silent(true);
        let builder = builder_over(host.clone(), SceneConfig::default()).await;

        let err = builder
            .construct("cat.png", "res://abc", Float3::ZERO)
            .await
            .unwrap_err();
        match err {
            SceneError::Link(LinkError::Timeout { operation, .. }) => {
                assert_eq!(operation, OperationTag::GetNode)
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        // Nothing is created once the link has failed.
        assert_eq!(host.operations(), vec![OperationTag::GetNode]);
    }
}
