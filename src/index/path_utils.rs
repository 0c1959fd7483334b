// src/index/path_utils.rs

//! Utility functions for turning absolute paths into target-relative ones.

use std::path::{Component, Path, PathBuf};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` if the path is not located under `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    // Different absolute prefixes may name the same directory
    // (symlinks, /private/var on macOS, ...).
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash(rel));
        }
    }

    None
}

/// Path of `path` relative to `root`, never absolute.
///
/// Paths under `root` are stripped; paths elsewhere are expressed with `..`
/// components. Already-relative paths are returned unchanged.
pub fn relative_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        return path.to_path_buf();
    }

    if let Some(rel) = relative_str(root, path) {
        return PathBuf::from(rel);
    }

    let root_parts: Vec<Component<'_>> = root.components().collect();
    let path_parts: Vec<Component<'_>> = path.components().collect();

    let common = root_parts
        .iter()
        .zip(path_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for part in &root_parts[common..] {
        if matches!(part, Component::Normal(_)) {
            rel.push("..");
        }
    }
    for part in &path_parts[common..] {
        if let Component::Normal(name) = part {
            rel.push(name);
        }
    }
    rel
}

fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
