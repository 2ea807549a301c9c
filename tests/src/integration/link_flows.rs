//! # Link Flows
//!
//! The correlated client against a real WebSocket server:
//!
//! 1. Concurrent calls each resolve with their own reply
//! 2. Calls on a closed link fail without transmitting
//! 3. A silent host produces timeouts and leaves nothing pending
//! 4. A server hang-up fails every call still in flight

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use ls_01_link_client::test_utils::SimulatedHost;
    use ls_01_link_client::{LinkClient, LinkConfig, LinkError};
    use shared_types::{OperationTag, ROOT_NODE_ID};

    use crate::support::HostServer;

    async fn server() -> HostServer {
        HostServer::start(Arc::new(SimulatedHost::new())).await.unwrap()
    }

    fn client_for(server: &HostServer, timeout: Duration) -> LinkClient {
        LinkClient::websocket(LinkConfig::new(server.endpoint()).with_call_timeout(timeout))
    }

    #[tokio::test]
    async fn test_concurrent_calls_resolve_independently() {
        let server = server().await;
        server.host().queue_asset_url("res://abc");
        let client = client_for(&server, Duration::from_secs(5));
        client.connect().await.unwrap();

        let (root, imported, missing) = tokio::join!(
            client.get_node(ROOT_NODE_ID, 0, false),
            client.import_texture(Path::new("/img/cat.png")),
            client.get_node("no-such-node", 0, false),
        );

        let root = root.unwrap();
        assert!(root.success);
        assert_eq!(root.data.unwrap()["name"]["value"], "Root");

        let imported = imported.unwrap();
        assert!(imported.success);
        assert_eq!(imported.asset_url.as_deref(), Some("res://abc"));

        // A business failure still resolves the call.
        let missing = missing.unwrap();
        assert!(!missing.success);
        assert!(!missing.error_detail().is_empty());

        assert_eq!(client.pending_count(), 0);
        let stats = client.stats();
        assert_eq!((stats.registered, stats.completed), (3, 3));
        client.close().await;
    }

    #[tokio::test]
    async fn test_calls_before_connect_are_not_sent() {
        let server = server().await;
        let client = client_for(&server, Duration::from_secs(5));

        let err = client.get_node(ROOT_NODE_ID, 0, false).await.unwrap_err();
        assert_eq!(err, LinkError::NotConnected);
        assert!(server.host().received().is_empty());
        assert_eq!(client.stats().registered, 0);
    }

    #[tokio::test]
    async fn test_calls_after_close_are_not_sent() {
        let server = server().await;
        let client = client_for(&server, Duration::from_secs(5));
        client.connect().await.unwrap();
        client.get_node(ROOT_NODE_ID, 0, false).await.unwrap();
        client.close().await;
        server.host().clear_received();

        let err = client.get_component("C1").await.unwrap_err();
        assert!(err.is_not_connected());
        assert!(server.host().received().is_empty());
    }

    #[tokio::test]
    async fn test_silent_host_times_out() {
        let server = server().await;
        server.host().set_silent(true);
        let client = client_for(&server, Duration::from_millis(200));
        client.connect().await.unwrap();

        let err = client.get_node(ROOT_NODE_ID, 0, false).await.unwrap_err();
        assert_eq!(
            err,
            LinkError::Timeout {
                operation: OperationTag::GetNode,
                timeout_ms: 200,
            }
        );
        assert_eq!(client.pending_count(), 0);
        assert_eq!(client.stats().timeouts, 1);

        // The host did see the call; only the reply was missing.
        assert_eq!(server.host().operations(), vec![OperationTag::GetNode]);
        client.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_hang_up_fails_calls_in_flight() {
        let server = server().await;
        server.host().set_silent(true);
        let client = Arc::new(client_for(&server, Duration::from_secs(30)));
        client.connect().await.unwrap();

        let calls: Vec<_> = (0..3)
            .map(|_| {
                let client = Arc::clone(&client);
                tokio::spawn(async move { client.get_node(ROOT_NODE_ID, 0, false).await })
            })
            .collect();

        tokio::time::timeout(Duration::from_secs(5), async {
            while server.host().received().len() < 3 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(client.pending_count(), 3);

        server.hang_up();

        for call in calls {
            let result = tokio::time::timeout(Duration::from_secs(5), call)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(result.unwrap_err(), LinkError::ConnectionClosed);
        }
        assert_eq!(client.pending_count(), 0);
        assert!(!client.is_connected());
    }
}
