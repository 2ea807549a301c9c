//! Folder watcher.
//!
//! Raw `notify` events only mark a path dirty. A periodic tick samples each
//! dirty file's length and modification time; once both have held still for
//! the quiet period the path is emitted, as [`FileEventKind::Created`] the
//! first time this process sees it and [`FileEventKind::Modified`] after
//! that. A file still being written therefore produces one event, not a
//! burst.

use crate::error::WatchError;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How long a file must stay unchanged before it is reported.
pub const DEFAULT_QUIET_PERIOD_MS: u64 = 500;

/// How often dirty files are sampled.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Created,
    Modified,
}

/// A file that finished changing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: FileEventKind,
}

impl FileEvent {
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: FileEventKind::Created,
        }
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: FileEventKind::Modified,
        }
    }
}

/// Watcher timing and startup behaviour.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub quiet_period: Duration,
    pub poll_interval: Duration,
    /// Report files already in the folder at startup as created.
    pub emit_existing: bool,
    pub channel_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_millis(DEFAULT_QUIET_PERIOD_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            emit_existing: true,
            channel_capacity: 256,
        }
    }
}

/// Length and modification time; equal samples mean "no write in between".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSignature {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl FileSignature {
    /// Sample a regular file. `None` if it is gone or not a file.
    pub fn sample(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        if !meta.is_file() {
            return None;
        }
        Some(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

struct DirtyFile {
    signature: Option<FileSignature>,
    stable_since: Instant,
}

/// Debounces dirty paths into stable file events.
pub struct StabilityTracker {
    quiet_period: Duration,
    dirty: HashMap<PathBuf, DirtyFile>,
    seen: HashSet<PathBuf>,
}

impl StabilityTracker {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            dirty: HashMap::new(),
            seen: HashSet::new(),
        }
    }

    /// A write was observed; restart the quiet period.
    pub fn mark_dirty(&mut self, path: PathBuf, now: Instant) {
        self.dirty
            .entry(path)
            .and_modify(|file| file.stable_since = now)
            .or_insert(DirtyFile {
                signature: None,
                stable_since: now,
            });
    }

    /// The file was removed; a later file at the same path counts as new.
    pub fn forget(&mut self, path: &Path) {
        self.dirty.remove(path);
        self.seen.remove(path);
    }

    pub fn pending(&self) -> usize {
        self.dirty.len()
    }

    /// Sample every dirty path and emit the ones that have settled.
    pub fn poll<F>(&mut self, now: Instant, sample: F) -> Vec<FileEvent>
    where
        F: Fn(&Path) -> Option<FileSignature>,
    {
        let mut settled = Vec::new();
        let mut vanished = Vec::new();

        for (path, file) in self.dirty.iter_mut() {
            match sample(path) {
                None => vanished.push(path.clone()),
                Some(signature) if file.signature != Some(signature) => {
                    file.signature = Some(signature);
                    file.stable_since = now;
                }
                Some(_) => {
                    if now.saturating_duration_since(file.stable_since) >= self.quiet_period {
                        settled.push(path.clone());
                    }
                }
            }
        }

        for path in vanished {
            self.forget(&path);
        }

        settled.sort();
        settled
            .into_iter()
            .map(|path| {
                self.dirty.remove(&path);
                let kind = if self.seen.insert(path.clone()) {
                    FileEventKind::Created
                } else {
                    FileEventKind::Modified
                };
                FileEvent { path, kind }
            })
            .collect()
    }
}

enum RawChange {
    Dirty(PathBuf),
    Removed(PathBuf),
}

fn classify(event: Event) -> Vec<RawChange> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => {
            event.paths.into_iter().map(RawChange::Dirty).collect()
        }
        EventKind::Remove(_) => event.paths.into_iter().map(RawChange::Removed).collect(),
        _ => Vec::new(),
    }
}

/// Running folder watch. Dropping it (or [`stop`](Self::stop)) ends the
/// event stream.
#[derive(Debug)]
pub struct FolderWatcher {
    dir: PathBuf,
    watcher: Option<RecommendedWatcher>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl FolderWatcher {
    /// Watch `dir` (non-recursive) and stream stable file events.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(
        dir: &Path,
        config: WatchConfig,
    ) -> Result<(Self, mpsc::Receiver<FileEvent>), WatchError> {
        if !dir.is_dir() {
            return Err(WatchError::MissingDirectory(dir.to_path_buf()));
        }

        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<RawChange>();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for change in classify(event) {
                    // Receiver gone means the watcher is stopping.
                    let _ = raw_tx.send(change);
                }
            }
            Err(e) => warn!(error = %e, "Filesystem watch error"),
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        let mut tracker = StabilityTracker::new(config.quiet_period);
        if config.emit_existing {
            let now = Instant::now();
            for entry in std::fs::read_dir(dir)?.flatten() {
                if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                    tracker.mark_dirty(entry.path(), now);
                }
            }
        }

        let (events_tx, events_rx) = mpsc::channel(config.channel_capacity);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let poll_interval = config.poll_interval;
        let task = tokio::spawn(async move {
            let mut tick = tokio::time::interval(poll_interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    change = raw_rx.recv() => match change {
                        Some(RawChange::Dirty(path)) => tracker.mark_dirty(path, Instant::now()),
                        Some(RawChange::Removed(path)) => {
                            debug!(path = %path.display(), "File removed");
                            tracker.forget(&path);
                        }
                        None => break,
                    },
                    _ = tick.tick() => {
                        for event in tracker.poll(Instant::now(), FileSignature::sample) {
                            debug!(path = %event.path.display(), kind = ?event.kind, "File settled");
                            if events_tx.send(event).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        });

        info!(dir = %dir.display(), "Watching folder");
        Ok((
            Self {
                dir: dir.to_path_buf(),
                watcher: Some(watcher),
                shutdown: Some(shutdown_tx),
                task: Some(task),
            },
            events_rx,
        ))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stop watching and wait for the event stream to close.
    pub async fn stop(mut self) {
        self.watcher.take();
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Watch task ended abnormally");
            }
        }
        info!(dir = %self.dir.display(), "Stopped watching folder");
    }
}

impl Drop for FolderWatcher {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
