// src/index/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::fs::{FileSystem, RealFileSystem};
use crate::index::FileTable;

/// Handle for the filesystem watcher.
///
/// Dropping this handle stops file watching; the background task that
/// applies changes to the index then finishes on its own.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and keep `table` in sync with created and
/// removed test files.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_watcher(root: impl Into<PathBuf>, table: FileTable) -> Result<WatcherHandle> {
    let root = root.into();

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    warn!(error = %err, "failed to forward notify event");
                }
            }
            Err(err) => {
                warn!(error = %err, "file watch error");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("test file watcher started on {:?}", root);

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");

            for path in event.paths {
                if fs.is_file(&path) {
                    if let Some(file) = table.insert_path(&path) {
                        debug!(file = %file.relative, "test file added to index");
                    }
                } else if !fs.exists(&path) && table.remove_path(&path) {
                    debug!(?path, "test file removed from index");
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
