//! Change-event router.
//!
//! Decides, per settled file event, whether to build a new image object or
//! refresh an existing one:
//!
//! | event      | name known? | action                                          |
//! |------------|-------------|-------------------------------------------------|
//! | `Created`  | no          | construct                                       |
//! | `Created`  | yes         | refresh, construct if the node is not updatable |
//! | `Modified` | either      | refresh (constructs when no node exists)        |
//!
//! Every event imports the image first; a rejected import ends that event.
//! Events for the same file name run one at a time; different names run
//! concurrently.

use crate::error::RouteError;
use crate::watcher::{FileEvent, FileEventKind};
use dashmap::DashMap;
use ls_02_scene_builder::{ConstructReport, RefreshOutcome, SceneBuilder, SceneError};
use parking_lot::RwLock;
use shared_types::Float3;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Extensions the router acts on, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Whether `path` names an image the router acts on.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// File names already materialized in the remote scene by this process.
pub trait KnownImages: Send + Sync {
    fn contains(&self, name: &str) -> bool;

    /// Returns `true` if the name was not known before.
    fn insert(&self, name: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-lifetime [`KnownImages`]; forgets everything on restart.
#[derive(Debug, Default)]
pub struct InMemoryKnownImages {
    names: RwLock<HashSet<String>>,
}

impl InMemoryKnownImages {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KnownImages for InMemoryKnownImages {
    fn contains(&self, name: &str) -> bool {
        self.names.read().contains(name)
    }

    fn insert(&self, name: &str) -> bool {
        self.names.write().insert(name.to_string())
    }

    fn len(&self) -> usize {
        self.names.read().len()
    }
}

/// Placement of new objects along the X axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterConfig {
    pub origin: Float3,
    pub spacing: f32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            origin: Float3::ZERO,
            spacing: 1.5,
        }
    }
}

/// What handling one event did.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Not an image file.
    Ignored,
    Constructed(ConstructReport),
    Updated { node_id: String, texture_id: String },
    NotUpdatable { node_id: String },
}

impl From<RefreshOutcome> for RouteOutcome {
    fn from(outcome: RefreshOutcome) -> Self {
        match outcome {
            RefreshOutcome::Updated {
                node_id,
                texture_id,
            } => RouteOutcome::Updated {
                node_id,
                texture_id,
            },
            RefreshOutcome::NotUpdatable { node_id } => RouteOutcome::NotUpdatable { node_id },
            RefreshOutcome::Constructed(report) => RouteOutcome::Constructed(report),
        }
    }
}

/// Router counters
#[derive(Debug, Default)]
struct RouterStats {
    handled: AtomicU64,
    failed: AtomicU64,
    ignored: AtomicU64,
    constructed: AtomicU64,
    updated: AtomicU64,
    not_updatable: AtomicU64,
}

/// Point-in-time copy of the router counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStatsSnapshot {
    pub handled: u64,
    pub failed: u64,
    pub ignored: u64,
    pub constructed: u64,
    pub updated: u64,
    pub not_updatable: u64,
}

/// Routes settled file events to the scene builder.
pub struct ChangeRouter {
    scene: Arc<SceneBuilder>,
    known: Arc<dyn KnownImages>,
    config: RouterConfig,
    in_flight: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    /// Next free index on the placement row.
    next_slot: AtomicUsize,
    stats: RouterStats,
}

impl ChangeRouter {
    pub fn new(scene: Arc<SceneBuilder>, known: Arc<dyn KnownImages>, config: RouterConfig) -> Self {
        let placed = known.len();
        Self {
            scene,
            known,
            config,
            in_flight: DashMap::new(),
            next_slot: AtomicUsize::new(placed),
            stats: RouterStats::default(),
        }
    }

    pub fn known(&self) -> &Arc<dyn KnownImages> {
        &self.known
    }

    pub fn stats(&self) -> RouterStatsSnapshot {
        RouterStatsSnapshot {
            handled: self.stats.handled.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            ignored: self.stats.ignored.load(Ordering::Relaxed),
            constructed: self.stats.constructed.load(Ordering::Relaxed),
            updated: self.stats.updated.load(Ordering::Relaxed),
            not_updatable: self.stats.not_updatable.load(Ordering::Relaxed),
        }
    }

    /// Handle one event to completion.
    pub async fn handle(&self, event: &FileEvent) -> Result<RouteOutcome, RouteError> {
        if !is_image(&event.path) {
            debug!(path = %event.path.display(), "Ignoring non-image file");
            self.stats.ignored.fetch_add(1, Ordering::Relaxed);
            return Ok(RouteOutcome::Ignored);
        }

        let name = event
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| RouteError::InvalidPath(event.path.clone()))?
            .to_string();

        let lock = self
            .in_flight
            .entry(name.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let result = {
            let _guard = lock.lock().await;
            self.route(&name, event).await
        };
        drop(lock);
        self.in_flight
            .remove_if(&name, |_, lock| Arc::strong_count(lock) == 1);

        self.record(&result);
        result
    }

    async fn route(&self, name: &str, event: &FileEvent) -> Result<RouteOutcome, RouteError> {
        let path = std::path::absolute(&event.path)
            .map_err(|_| RouteError::InvalidPath(event.path.clone()))?;
        // The host takes the path as a JSON string.
        if path.to_str().is_none() {
            warn!(name, path = %path.display(), "Image path is not valid UTF-8");
            return Err(RouteError::InvalidPath(path));
        }

        let asset_url = match self.scene.host().import_texture(&path).await {
            Ok(url) => url,
            Err(SceneError::Rejected { detail, .. }) => {
                warn!(name, error_info = %detail, "Image import rejected");
                return Err(RouteError::ImportRejected {
                    name: name.to_string(),
                    detail,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let known = self.known.contains(name);
        debug!(name, kind = ?event.kind, known, %asset_url, "Routing image");

        let outcome = match (event.kind, known) {
            (FileEventKind::Created, false) => {
                let position = self.reserve_position();
                RouteOutcome::Constructed(self.scene.construct(name, &asset_url, position).await?)
            }
            (FileEventKind::Created, true) => {
                match self
                    .scene
                    .refresh_or_construct_at(name, &asset_url, || self.reserve_position())
                    .await?
                {
                    RefreshOutcome::NotUpdatable { node_id } => {
                        info!(name, %node_id, "Existing node not updatable, constructing");
                        let position = self.reserve_position();
                        RouteOutcome::Constructed(
                            self.scene.construct(name, &asset_url, position).await?,
                        )
                    }
                    other => other.into(),
                }
            }
            (FileEventKind::Modified, _) => self
                .scene
                .refresh_or_construct_at(name, &asset_url, || self.reserve_position())
                .await?
                .into(),
        };

        match &outcome {
            RouteOutcome::NotUpdatable { node_id } => {
                warn!(name, %node_id, "Node has no texture, left unchanged");
            }
            _ => {
                self.known.insert(name);
            }
        }
        Ok(outcome)
    }

    /// Claim the next spot on the row. Each construction gets its own slot,
    /// even when several run at once.
    fn reserve_position(&self) -> Float3 {
        let index = self.next_slot.fetch_add(1, Ordering::Relaxed) as f32;
        self.config.origin.offset_x(index * self.config.spacing)
    }

    fn record(&self, result: &Result<RouteOutcome, RouteError>) {
        let counter = match result {
            Ok(RouteOutcome::Ignored) => return,
            Ok(RouteOutcome::Constructed(_)) => &self.stats.constructed,
            Ok(RouteOutcome::Updated { .. }) => &self.stats.updated,
            Ok(RouteOutcome::NotUpdatable { .. }) => &self.stats.not_updatable,
            Err(_) => &self.stats.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if result.is_ok() {
            self.stats.handled.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Handle one event, logging instead of returning errors.
    pub async fn dispatch(&self, event: FileEvent) -> Option<RouteOutcome> {
        match self.handle(&event).await {
            Ok(RouteOutcome::Ignored) => Some(RouteOutcome::Ignored),
            Ok(outcome) => {
                info!(path = %event.path.display(), kind = ?event.kind, outcome = outcome_label(&outcome), "File event handled");
                Some(outcome)
            }
            Err(e) => {
                error!(path = %event.path.display(), kind = ?event.kind, error = %e, "File event failed");
                None
            }
        }
    }

    /// Consume events until the stream closes, each on its own task.
    ///
    /// Returns after every spawned event has finished.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<FileEvent>) {
        let mut tasks = JoinSet::new();
        while let Some(event) = events.recv().await {
            let router = Arc::clone(&self);
            tasks.spawn(async move {
                router.dispatch(event).await;
            });
            while tasks.try_join_next().is_some() {}
        }
        while tasks.join_next().await.is_some() {}
        debug!("Event stream closed, router stopped");
    }
}

fn outcome_label(outcome: &RouteOutcome) -> &'static str {
    match outcome {
        RouteOutcome::Ignored => "ignored",
        RouteOutcome::Constructed(_) => "constructed",
        RouteOutcome::Updated { .. } => "updated",
        RouteOutcome::NotUpdatable { .. } => "not-updatable",
    }
}
