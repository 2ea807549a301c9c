//! Startup and shutdown of the sync pipeline.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use ls_01_link_client::{LinkClient, LinkError, PendingStatsSnapshot};
use ls_02_scene_builder::{LinkSceneHost, SceneBuilder};
use ls_03_folder_watch::{
    ChangeRouter, FolderWatcher, InMemoryKnownImages, RouterStatsSnapshot, WatchError,
};
use sync_telemetry::metrics::{
    observe_total, FILE_EVENTS_FAILED, FILE_EVENTS_HANDLED, FILE_EVENTS_IGNORED, LINK_CALLS,
    LINK_CANCELLED, LINK_DISCARDED, LINK_PENDING, LINK_REPLIES, LINK_TIMEOUTS,
    OBJECTS_CONSTRUCTED, OBJECTS_NOT_UPDATABLE, OBJECTS_REFRESHED,
};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::RuntimeConfig;

/// Startup failures.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("cannot connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: LinkError,
    },

    #[error("cannot prepare watch folder {path}: {source}")]
    WatchDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// Copy link and router counters into the Prometheus registry.
pub fn mirror_metrics(link: PendingStatsSnapshot, pending: usize, routed: RouterStatsSnapshot) {
    observe_total(&LINK_CALLS, link.registered);
    observe_total(&LINK_REPLIES, link.completed);
    observe_total(&LINK_TIMEOUTS, link.timeouts);
    observe_total(&LINK_CANCELLED, link.cancelled);
    observe_total(&LINK_DISCARDED, link.discarded);
    LINK_PENDING.set(pending as i64);

    observe_total(&OBJECTS_CONSTRUCTED, routed.constructed);
    observe_total(&OBJECTS_REFRESHED, routed.updated);
    observe_total(&OBJECTS_NOT_UPDATABLE, routed.not_updatable);
    observe_total(&FILE_EVENTS_HANDLED, routed.handled);
    observe_total(&FILE_EVENTS_FAILED, routed.failed);
    observe_total(&FILE_EVENTS_IGNORED, routed.ignored);
}

/// The running synchronizer: one link, one watcher, one router.
pub struct SyncRuntime {
    config: RuntimeConfig,
    client: Arc<LinkClient>,
    router: Arc<ChangeRouter>,
    watcher: Option<FolderWatcher>,
    router_task: Option<JoinHandle<()>>,
    metrics_task: Option<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl SyncRuntime {
    /// Runtime talking to `config.link.endpoint` over WebSocket.
    pub fn new(config: RuntimeConfig) -> Self {
        let client = Arc::new(LinkClient::websocket(config.link.clone()));
        Self::with_client(config, client)
    }

    /// Runtime over an already built client.
    pub fn with_client(config: RuntimeConfig, client: Arc<LinkClient>) -> Self {
        let host = Arc::new(LinkSceneHost::new(Arc::clone(&client)));
        let scene = Arc::new(SceneBuilder::new(host, config.scene.clone()));
        let router = Arc::new(ChangeRouter::new(
            scene,
            Arc::new(InMemoryKnownImages::new()),
            config.router,
        ));
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            client,
            router,
            watcher: None,
            router_task: None,
            metrics_task: None,
            shutdown_tx,
        }
    }

    pub fn client(&self) -> &Arc<LinkClient> {
        &self.client
    }

    pub fn router(&self) -> &Arc<ChangeRouter> {
        &self.router
    }

    /// Connect, then start watching and routing.
    ///
    /// A failed connection is returned before anything else starts.
    pub async fn start(&mut self) -> Result<(), RuntimeError> {
        info!("===========================================");
        info!("  image-sync v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let endpoint = self.config.link.endpoint.clone();
        self.client
            .connect()
            .await
            .map_err(|source| RuntimeError::Connect {
                endpoint: endpoint.clone(),
                source,
            })?;
        info!(endpoint = %endpoint, "Connected to host");

        let dir = &self.config.watch_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| RuntimeError::WatchDir {
                path: dir.clone(),
                source,
            })?;
        let dir = std::path::absolute(dir).map_err(|source| RuntimeError::WatchDir {
            path: dir.clone(),
            source,
        })?;

        let (watcher, events) = FolderWatcher::start(&dir, self.config.watch.clone())?;
        self.watcher = Some(watcher);
        self.router_task = Some(tokio::spawn(Arc::clone(&self.router).run(events)));
        self.metrics_task = Some(self.spawn_metrics_mirror());

        info!(
            dir = %dir.display(),
            timeout_ms = self.config.link.call_timeout_ms,
            lookup_depth = self.config.scene.lookup_depth,
            "Sync running"
        );
        Ok(())
    }

    fn spawn_metrics_mirror(&self) -> JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let router = Arc::clone(&self.router);
        let mut shutdown = self.shutdown_tx.subscribe();
        let period = self.config.metrics_interval;

        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tick.tick() => {
                        mirror_metrics(client.stats(), client.pending_count(), router.stats());
                    }
                }
            }
        })
    }

    /// Shut down gracefully.
    ///
    /// ## Shutdown Sequence
    ///
    /// 1. Stop the watcher, which ends the event stream
    /// 2. Wait for the router to finish events already in flight
    /// 3. Close the link
    /// 4. Publish and log the final counters
    pub async fn shutdown(mut self) {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            // No metrics task was started.
            debug!(error = %e, "No shutdown listeners");
        }

        if let Some(watcher) = self.watcher.take() {
            watcher.stop().await;
        }
        if let Some(task) = self.router_task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Router task ended abnormally");
            }
        }
        if let Some(task) = self.metrics_task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Metrics task ended abnormally");
            }
        }

        self.client.close().await;

        let link = self.client.stats();
        let routed = self.router.stats();
        mirror_metrics(link, self.client.pending_count(), routed);
        info!(
            calls = link.registered,
            replies = link.completed,
            timeouts = link.timeouts,
            cancelled = link.cancelled,
            discarded = link.discarded,
            constructed = routed.constructed,
            updated = routed.updated,
            not_updatable = routed.not_updatable,
            failed = routed.failed,
            "Final metrics"
        );
        info!("Shutdown complete");
    }
}
