//! Filesystem watcher for the references tree
//!
//! Watches `.references/` recursively and runs a reconcile pass after a
//! debounced burst of changes under `artifacts/`. Reconciling rewrites the
//! manifest, which itself produces events; those fall outside the artifacts
//! directory and do not retrigger.

use crate::error::{Error, Result};
use crate::references::ReferencesStore;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Debounced watcher that keeps the manifest reconciled with disk
pub struct ReferencesWatcher {
    // Held for its Drop: dropping the watcher stops event delivery.
    _watcher: RecommendedWatcher,
    handle: tokio::task::JoinHandle<()>,
}

impl ReferencesWatcher {
    /// Start watching the store's references directory.
    pub fn spawn(store: Arc<ReferencesStore>, debounce: Duration) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel::<PathBuf>();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else { return };
            if matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                for path in event.paths {
                    let _ = tx.send(path);
                }
            }
        })
        .map_err(|e| Error::Watcher(e.to_string()))?;

        watcher
            .watch(&store.refs_dir, RecursiveMode::Recursive)
            .map_err(|e| Error::Watcher(e.to_string()))?;

        tracing::info!(dir = %store.refs_dir.display(), "watching references directory");

        let handle = tokio::spawn(Self::drive(store, rx, debounce));

        Ok(Self {
            _watcher: watcher,
            handle,
        })
    }

    async fn drive(
        store: Arc<ReferencesStore>,
        mut rx: mpsc::UnboundedReceiver<PathBuf>,
        debounce: Duration,
    ) {
        while let Some(first) = rx.recv().await {
            let mut artifacts_changed = first.starts_with(&store.artifacts_dir);

            // Absorb the rest of the burst before acting.
            let deadline = tokio::time::sleep(debounce);
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    _ = &mut deadline => break,
                    more = rx.recv() => match more {
                        Some(path) => {
                            artifacts_changed |= path.starts_with(&store.artifacts_dir);
                        }
                        None => break,
                    },
                }
            }

            if !artifacts_changed {
                continue;
            }

            match store.reconcile().await {
                Ok(report) if report.added + report.removed > 0 => {
                    tracing::info!(
                        added = report.added,
                        removed = report.removed,
                        total = report.total,
                        "watch-triggered reindex"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("watch-triggered reindex failed: {}", e),
            }
        }
    }

    /// Stop watching and cancel the drive task.
    pub fn stop(self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_watcher_reindexes_dropped_in_file() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(ReferencesStore::new(dir.path()).await.unwrap());
        let watcher =
            ReferencesWatcher::spawn(store.clone(), Duration::from_millis(100)).unwrap();

        tokio::fs::write(store.artifacts_dir.join("dropped.md"), "hello")
            .await
            .unwrap();

        // Poll until the debounced reconcile lands.
        let mut indexed = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let artifacts = store.list().await.unwrap();
            if artifacts.iter().any(|a| a.filename == "dropped.md") {
                indexed = true;
                break;
            }
        }
        watcher.stop();
        assert!(indexed, "watcher never indexed the new file");
    }

    #[tokio::test]
    async fn test_watcher_ignores_changes_outside_artifacts() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(ReferencesStore::new(dir.path()).await.unwrap());
        let watcher =
            ReferencesWatcher::spawn(store.clone(), Duration::from_millis(50)).unwrap();

        // A scratch file next to the manifest must not produce an entry.
        tokio::fs::write(store.refs_dir.join("scratch.txt"), "noise")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;

        let artifacts = store.list().await.unwrap();
        watcher.stop();
        assert!(artifacts.is_empty());
    }
}
