//! # Folder Sync
//!
//! The whole `image-sync` runtime: a temp folder on one side, a WebSocket
//! host on the other.

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use ls_01_link_client::test_utils::SimulatedHost;
    use serde_json::{json, Value};
    use sync_runtime::{Args, RuntimeConfig, RuntimeError, SyncRuntime};

    use crate::support::HostServer;

    fn config_for(server: &HostServer, dir: &Path) -> RuntimeConfig {
        let mut config = RuntimeConfig::default().apply_args(&Args {
            endpoint: Some(server.endpoint()),
            watch_dir: Some(dir.to_path_buf()),
            timeout_ms: Some(5_000),
            ..Args::default()
        });
        config.watch.quiet_period = Duration::from_millis(100);
        config.watch.poll_interval = Duration::from_millis(20);
        config.metrics_interval = Duration::from_millis(50);
        config
    }

    async fn eventually<F: Fn() -> bool>(what: &str, condition: F) {
        let reached = tokio::time::timeout(Duration::from_secs(10), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
        })
        .await;
        assert!(reached.is_ok(), "timed out waiting for {what}");
    }

    fn texture_url(host: &SimulatedHost, name: &str) -> Option<Value> {
        let node = host.nodes_named(name).into_iter().next()?;
        let texture = host.find_component(&node, "StaticTexture2D")?;
        texture.member("URL")?.value().cloned()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_image_lifecycle_in_watched_folder() {
        let server = HostServer::start(Arc::new(SimulatedHost::new()))
            .await
            .unwrap();
        server.host().queue_asset_url("res://abc");
        server.host().queue_asset_url("res://def");
        let dir = tempfile::tempdir().unwrap();
        let watch_dir = dir.path().join("images");

        let mut runtime = SyncRuntime::new(config_for(&server, &watch_dir));
        runtime.start().await.unwrap();
        assert!(watch_dir.is_dir());

        std::fs::write(watch_dir.join("cat.png"), b"first").unwrap();
        eventually("construction", || runtime.router().stats().constructed == 1).await;
        assert_eq!(texture_url(server.host(), "cat.png"), Some(json!("res://abc")));

        std::fs::write(watch_dir.join("cat.png"), b"second, longer").unwrap();
        eventually("refresh", || runtime.router().stats().updated == 1).await;
        assert_eq!(texture_url(server.host(), "cat.png"), Some(json!("res://def")));
        assert_eq!(server.host().nodes_named("cat.png").len(), 1);

        let client = Arc::clone(runtime.client());
        runtime.shutdown().await;
        assert!(!client.is_connected());
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_images_are_laid_out_in_a_row() {
        let server = HostServer::start(Arc::new(SimulatedHost::new()))
            .await
            .unwrap();
        let dir = tempfile::tempdir().unwrap();

        let mut runtime = SyncRuntime::new(config_for(&server, dir.path()));
        runtime.start().await.unwrap();

        std::fs::write(dir.path().join("one.png"), b"1").unwrap();
        eventually("first image", || runtime.router().stats().constructed == 1).await;
        std::fs::write(dir.path().join("two.jpg"), b"2").unwrap();
        eventually("second image", || runtime.router().stats().constructed == 2).await;
        std::fs::write(dir.path().join("readme.txt"), b"3").unwrap();
        eventually("ignored file", || runtime.router().stats().ignored == 1).await;

        let host = server.host();
        let first = host.nodes_named("one.png").pop().unwrap();
        let second = host.nodes_named("two.jpg").pop().unwrap();
        let x = |id: &str| host.node_position(id).map(|p| p.x);
        assert_eq!(x(&first), Some(0.0));
        assert_eq!(x(&second), Some(1.5));
        assert!(host.nodes_named("readme.txt").is_empty());

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_unreachable_host_stops_startup() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let dir = tempfile::tempdir().unwrap();

        let config = RuntimeConfig::default().apply_args(&Args {
            endpoint: Some(format!("ws://127.0.0.1:{port}")),
            watch_dir: Some(dir.path().join("images")),
            ..Args::default()
        });
        let mut runtime = SyncRuntime::new(config);

        let err = runtime.start().await.unwrap_err();
        assert!(matches!(err, RuntimeError::Connect { .. }));
        assert!(!dir.path().join("images").exists());
    }
}
