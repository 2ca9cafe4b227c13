// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// A stream of changed paths plus whatever keeps its producer alive.
#[derive(Debug)]
pub struct ChangeSubscription {
    pub changes: mpsc::UnboundedReceiver<PathBuf>,
    _guard: Option<WatcherHandle>,
}

impl ChangeSubscription {
    /// A subscription fed by something other than a filesystem watcher.
    pub fn from_receiver(changes: mpsc::UnboundedReceiver<PathBuf>) -> Self {
        Self {
            changes,
            _guard: None,
        }
    }
}

/// Source of file-change notifications for watch tasks.
pub trait ChangeSource: Send + Sync {
    fn subscribe(&self, root: &Path) -> Result<ChangeSubscription>;
}

/// Production change source backed by `notify`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyChangeSource;

impl ChangeSource for NotifyChangeSource {
    fn subscribe(&self, root: &Path) -> Result<ChangeSubscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = spawn_watcher(root, tx)?;
        Ok(ChangeSubscription {
            changes: rx,
            _guard: Some(handle),
        })
    }
}

/// Watch `root` recursively and forward every created, modified or removed
/// path to `tx`.
pub fn spawn_watcher(root: &Path, tx: mpsc::UnboundedSender<PathBuf>) -> Result<WatcherHandle> {
    // Canonicalize once so we have a stable base path.
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                for path in event.paths {
                    if tx.send(path).is_err() {
                        // Subscriber dropped; nothing left to notify.
                        return;
                    }
                }
            }
            Err(err) => {
                // We can't log via tracing here easily, so fallback to stderr.
                eprintln!("taskgate: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);
    debug!("notify events are filtered to create/modify/remove");

    Ok(WatcherHandle { _inner: watcher })
}
