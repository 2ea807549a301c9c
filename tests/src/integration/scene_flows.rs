//! # Scene Flows
//!
//! Scene builder and change router talking to the host over the wire.
//!
//! ## Scenarios
//!
//! 1. `cat.png` created then modified: one node, texture repointed
//! 2. Materials list append is idempotent across reruns
//! 3. Refresh of an existing name issues no add calls

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use ls_01_link_client::test_utils::SimulatedHost;
    use ls_01_link_client::{LinkClient, LinkConfig};
    use ls_02_scene_builder::domain::MATERIALS_MEMBER;
    use ls_02_scene_builder::{
        ComponentRole, LinkSceneHost, RefreshOutcome, SceneBuilder, SceneConfig,
    };
    use ls_03_folder_watch::{
        ChangeRouter, FileEvent, InMemoryKnownImages, RouteOutcome, RouterConfig,
    };
    use serde_json::{json, Value};
    use shared_types::{Float3, OperationTag};

    use crate::support::HostServer;

    struct Harness {
        server: HostServer,
        client: Arc<LinkClient>,
        builder: Arc<SceneBuilder>,
    }

    async fn harness() -> Harness {
        let server = HostServer::start(Arc::new(SimulatedHost::new()))
            .await
            .unwrap();
        let client = Arc::new(LinkClient::websocket(
            LinkConfig::new(server.endpoint()).with_call_timeout(Duration::from_secs(5)),
        ));
        client.connect().await.unwrap();
        let host = Arc::new(LinkSceneHost::new(Arc::clone(&client)));
        let builder = Arc::new(SceneBuilder::new(host, SceneConfig::default()));
        Harness {
            server,
            client,
            builder,
        }
    }

    fn host(h: &Harness) -> &SimulatedHost {
        h.server.host()
    }

    fn texture_url(host: &SimulatedHost, name: &str) -> Option<Value> {
        let node = host.nodes_named(name).into_iter().next()?;
        let texture = host.find_component(&node, "StaticTexture2D")?;
        texture.member("URL")?.value().cloned()
    }

    #[tokio::test]
    async fn test_cat_png_created_then_modified() {
        let h = harness().await;
        host(&h).queue_asset_url("res://abc");
        host(&h).queue_asset_url("res://def");
        let router = ChangeRouter::new(
            Arc::clone(&h.builder),
            Arc::new(InMemoryKnownImages::new()),
            RouterConfig::default(),
        );

        let created = router
            .handle(&FileEvent::created("/img/cat.png"))
            .await
            .unwrap();
        let RouteOutcome::Constructed(report) = created else {
            panic!("expected construction, got {created:?}");
        };
        assert!(report.is_complete(), "{report:?}");
        assert_eq!(texture_url(host(&h), "cat.png"), Some(json!("res://abc")));

        host(&h).clear_received();
        let modified = router
            .handle(&FileEvent::modified("/img/cat.png"))
            .await
            .unwrap();
        assert!(matches!(modified, RouteOutcome::Updated { .. }));
        assert_eq!(texture_url(host(&h), "cat.png"), Some(json!("res://def")));
        assert_eq!(host(&h).nodes_named("cat.png").len(), 1);

        let ops = host(&h).operations();
        assert!(!ops.contains(&OperationTag::AddNode));
        assert!(!ops.contains(&OperationTag::AddComponent));
        h.client.close().await;
    }

    #[tokio::test]
    async fn test_constructed_object_is_fully_wired() {
        let h = harness().await;
        let report = h
            .builder
            .construct("dog.png", "res://dog", Float3::new(3.0, 0.0, 0.0))
            .await
            .unwrap();

        assert!(report.is_complete(), "{report:?}");
        assert_eq!(report.components.len(), ComponentRole::CATALOGUE.len());
        assert_eq!(
            host(&h).node_position(&report.node_id),
            Some(Float3::new(3.0, 0.0, 0.0))
        );

        // Renderer materials hold exactly one element pointing at the material.
        let renderer = report.component_id(ComponentRole::Renderer).unwrap();
        let material = report.component_id(ComponentRole::Material).unwrap();
        let renderer = host(&h).component(renderer).unwrap();
        let elements = renderer
            .member(MATERIALS_MEMBER)
            .unwrap()
            .elements()
            .unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].target_id(), Some(material));
        h.client.close().await;
    }

    #[tokio::test]
    async fn test_materials_append_is_idempotent_over_the_wire() {
        let h = harness().await;
        let report = h
            .builder
            .construct("cat.png", "res://abc", Float3::ZERO)
            .await
            .unwrap();
        let renderer = report.component_id(ComponentRole::Renderer).unwrap().to_string();
        let material = report.component_id(ComponentRole::Material).unwrap().to_string();

        host(&h).clear_received();
        let slot = h
            .builder
            .ensure_list_reference(&renderer, MATERIALS_MEMBER, &material)
            .await
            .unwrap();

        assert!(!slot.created);
        assert_eq!(
            host(&h).operations(),
            vec![OperationTag::GetComponent, OperationTag::UpdateComponent]
        );
        let component = host(&h).component(&renderer).unwrap();
        let elements = component
            .member(MATERIALS_MEMBER)
            .unwrap()
            .elements()
            .unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].target_id(), Some(material.as_str()));
        h.client.close().await;
    }

    #[tokio::test]
    async fn test_refresh_touches_only_the_texture_url() {
        let h = harness().await;
        let report = h
            .builder
            .construct("cat.png", "res://abc", Float3::ZERO)
            .await
            .unwrap();
        let texture_id = report
            .component_id(ComponentRole::Texture)
            .unwrap()
            .to_string();

        host(&h).clear_received();
        let outcome = h
            .builder
            .refresh_or_construct("cat.png", "res://def", None)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RefreshOutcome::Updated {
                node_id: report.node_id.clone(),
                texture_id,
            }
        );
        let updates: Vec<_> = host(&h)
            .received()
            .into_iter()
            .filter(|e| e.operation == OperationTag::UpdateComponent)
            .collect();
        assert_eq!(updates.len(), 1);
        assert_eq!(
            updates[0].payload["data"]["members"]
                .as_object()
                .map(|m| m.keys().cloned().collect::<Vec<_>>()),
            Some(vec!["URL".to_string()])
        );
        h.client.close().await;
    }
}
