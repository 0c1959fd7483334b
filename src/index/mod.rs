// src/index/mod.rs

//! Test file index.
//!
//! This module is responsible for:
//! - Compiling `match` / `ignore` glob patterns.
//! - Scanning the target directory for test files (through the
//!   [`FileSystem`] abstraction, so discovery can run against a mock).
//! - Optionally keeping the index current with a `notify` watcher.
//!
//! It does **not** run anything; the orchestrator only reads from it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use anyhow::Result;
use tracing::{debug, info};

use crate::fs::FileSystem;

pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use path_utils::{relative_path, relative_str};
pub use patterns::FilePatterns;
pub use watcher::{WatcherHandle, spawn_watcher};

/// One discovered test file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    /// Path relative to the target directory, with forward slashes.
    pub relative: String,
    pub absolute: PathBuf,
}

/// Shared, cloneable table of indexed files.
///
/// Cloning is cheap; every clone sees the same entries. The watcher task
/// holds one clone, the owning [`FileIndex`] another.
#[derive(Debug, Clone)]
pub struct FileTable {
    root: PathBuf,
    patterns: FilePatterns,
    files: Arc<RwLock<BTreeMap<String, IndexedFile>>>,
}

impl FileTable {
    fn new(root: PathBuf, patterns: FilePatterns) -> Self {
        Self {
            root,
            patterns,
            files: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Add `path` if it is a test file under the root.
    pub fn insert_path(&self, path: &Path) -> Option<IndexedFile> {
        let relative = relative_str(&self.root, path)?;
        if !self.patterns.is_test_file(&relative) {
            return None;
        }

        let file = IndexedFile {
            relative: relative.clone(),
            absolute: path.to_path_buf(),
        };
        self.files
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(relative, file.clone());
        Some(file)
    }

    /// Remove `path`; returns whether it was indexed.
    pub fn remove_path(&self, path: &Path) -> bool {
        let Some(relative) = relative_str(&self.root, path) else {
            return false;
        };
        self.files
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&relative)
            .is_some()
    }

    pub fn lookup(&self, relative: &str) -> Option<IndexedFile> {
        let relative = relative.trim_start_matches("./");
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(relative)
            .cloned()
    }

    /// All indexed files, sorted by relative path.
    pub fn files(&self) -> Vec<IndexedFile> {
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Index of test files under a target directory.
#[derive(Debug)]
pub struct FileIndex {
    table: FileTable,
    watcher: Mutex<Option<WatcherHandle>>,
}

impl FileIndex {
    /// Walk `root` and index every file accepted by `patterns`.
    pub fn scan(fs: &dyn FileSystem, root: impl AsRef<Path>, patterns: FilePatterns) -> Result<Self> {
        let root = fs.canonicalize(root.as_ref())?;
        let table = FileTable::new(root.clone(), patterns);

        let mut pending = vec![root.clone()];
        while let Some(dir) = pending.pop() {
            for entry in fs.read_dir(&dir)? {
                let Some(relative) = relative_str(&root, &entry) else {
                    continue;
                };

                if fs.is_dir(&entry) {
                    if table.patterns.is_ignored_dir(&relative) {
                        debug!(dir = %relative, "skipping ignored directory");
                    } else {
                        pending.push(entry);
                    }
                } else if fs.is_file(&entry) {
                    table.insert_path(&entry);
                }
            }
        }

        info!(root = ?root, files = table.len(), "indexed test files");

        Ok(Self {
            table,
            watcher: Mutex::new(None),
        })
    }

    /// Empty index rooted at `root`; files are added with [`FileIndex::insert_path`].
    pub fn empty(root: impl Into<PathBuf>, patterns: FilePatterns) -> Self {
        Self {
            table: FileTable::new(root.into(), patterns),
            watcher: Mutex::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.table.root
    }

    pub fn lookup(&self, relative: &str) -> Option<IndexedFile> {
        self.table.lookup(relative)
    }

    pub fn files(&self) -> Vec<IndexedFile> {
        self.table.files()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert_path(&self, path: &Path) -> Option<IndexedFile> {
        self.table.insert_path(path)
    }

    pub fn remove_path(&self, path: &Path) -> bool {
        self.table.remove_path(path)
    }

    /// Start watching the root for added/removed test files.
    pub fn watch(&self) -> Result<()> {
        let mut slot = self.watcher.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_none() {
            *slot = Some(spawn_watcher(self.table.root.clone(), self.table.clone())?);
        }
        Ok(())
    }

    pub fn is_watching(&self) -> bool {
        self.watcher
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Stop watching. Safe to call more than once.
    pub fn destroy(&self) {
        let handle = self
            .watcher
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if handle.is_some() {
            info!(root = ?self.table.root, "test file watcher stopped");
        }
    }
}
