// src/watch/trigger.rs

//! Re-invokes a target task on every relevant file change.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::fs::FileSystem;
use crate::types::TaskName;
use crate::watch::hash::ContentHashes;
use crate::watch::patterns::PatternSet;

/// Watch loop of one watch task.
///
/// Each accepted change produces one invocation of `target`; changes that
/// arrive while an invocation is running are coalesced into at most one
/// follow-up invocation.
pub struct WatchTrigger {
    task: TaskName,
    target: TaskName,
    root: PathBuf,
    patterns: PatternSet,
    fs: Arc<dyn FileSystem>,
    hashes: Option<ContentHashes>,
}

impl std::fmt::Debug for WatchTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchTrigger")
            .field("task", &self.task)
            .field("target", &self.target)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl WatchTrigger {
    pub fn new(
        task: impl Into<TaskName>,
        target: impl Into<TaskName>,
        root: impl Into<PathBuf>,
        patterns: PatternSet,
        fs: Arc<dyn FileSystem>,
        use_hash: bool,
    ) -> Self {
        // Notifications carry canonical paths; deleted files can no longer
        // be canonicalized, so the root has to be canonical up front.
        let root = root.into();
        let root = root.canonicalize().unwrap_or(root);
        Self {
            task: task.into(),
            target: target.into(),
            root,
            patterns,
            fs,
            hashes: use_hash.then(ContentHashes::new),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Whether a changed path should trigger the target.
    pub fn accepts(&mut self, path: &Path) -> bool {
        let Some(rel) = relative_str(&self.root, path) else {
            debug!(task = %self.task, ?path, "change outside the project root; ignoring");
            return false;
        };
        if !self.patterns.matches(&rel) {
            return false;
        }
        match self.hashes.as_mut() {
            Some(hashes) => hashes.changed(self.fs.as_ref(), path),
            None => true,
        }
    }

    /// Run until `shutdown` flips to `true` (or its sender goes away) or the
    /// change stream ends. Returns how many times the target was invoked.
    ///
    /// An invocation in progress is never interrupted.
    pub async fn run<F, Fut>(
        mut self,
        mut changes: mpsc::UnboundedReceiver<PathBuf>,
        mut shutdown: watch::Receiver<bool>,
        mut invoke: F,
    ) -> usize
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        info!(
            task = %self.task,
            target = %self.target,
            patterns = ?self.patterns.patterns(),
            "watching for changes"
        );

        let mut runs = 0;
        loop {
            if *shutdown.borrow() {
                break;
            }

            let path = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                next = changes.recv() => match next {
                    Some(path) => path,
                    None => break,
                },
            };

            if !self.accepts(&path) {
                continue;
            }

            let mut pending = true;
            while pending {
                info!(task = %self.task, target = %self.target, ?path, "change detected; invoking target");
                invoke().await;
                runs += 1;

                // Coalesce everything that queued up during the run.
                pending = false;
                while let Ok(queued) = changes.try_recv() {
                    if self.accepts(&queued) {
                        pending = true;
                    }
                }
                if *shutdown.borrow() {
                    pending = false;
                }
            }
        }

        info!(task = %self.task, runs, "watch loop finished");
        runs
    }
}

/// Path relative to `root` with forward slashes, trying the canonical form
/// when the plain prefix does not match (symlinked temp dirs on macOS).
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = match path.strip_prefix(root) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => canonical(path)?.strip_prefix(root).ok()?.to_path_buf(),
    };
    Some(rel.to_string_lossy().replace('\\', "/"))
}

/// Canonical form of `path`, resolving through the parent directory when the
/// file itself is gone.
fn canonical(path: &Path) -> Option<PathBuf> {
    if let Ok(path) = path.canonicalize() {
        return Some(path);
    }
    let parent = path.parent()?.canonicalize().ok()?;
    Some(parent.join(path.file_name()?))
}
