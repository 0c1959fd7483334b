// src/index/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::ConfigFile;

/// Compiled `match` / `ignore` globs deciding which files are test files.
///
/// Patterns are evaluated against paths relative to the target directory,
/// using forward slashes (e.g. `"src/math.test.ts"`).
#[derive(Clone)]
pub struct FilePatterns {
    match_set: GlobSet,
    ignore_set: GlobSet,
    /// Ignore patterns that name whole directories, so the scan can prune.
    ignore_dir_set: GlobSet,
    match_patterns: Vec<String>,
    ignore_patterns: Vec<String>,
}

impl fmt::Debug for FilePatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePatterns")
            .field("match", &self.match_patterns)
            .field("ignore", &self.ignore_patterns)
            .finish()
    }
}

impl FilePatterns {
    pub fn new(match_patterns: &[String], ignore_patterns: &[String]) -> Result<Self> {
        let match_set = build_globset(match_patterns)?;
        let ignore_set = build_globset(ignore_patterns)?;

        // "**/node_modules/**" also prunes the "node_modules" directory itself.
        let dir_patterns: Vec<String> = ignore_patterns
            .iter()
            .flat_map(|p| match p.strip_suffix("/**") {
                Some(dir) => vec![p.clone(), dir.to_string()],
                None => vec![p.clone()],
            })
            .collect();
        let ignore_dir_set = build_globset(&dir_patterns)?;

        Ok(Self {
            match_set,
            ignore_set,
            ignore_dir_set,
            match_patterns: match_patterns.to_vec(),
            ignore_patterns: ignore_patterns.to_vec(),
        })
    }

    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        Self::new(&cfg.files.match_patterns, &cfg.files.ignore_patterns)
    }

    /// True if the relative file path is a test file.
    pub fn is_test_file(&self, rel: &str) -> bool {
        self.match_set.is_match(rel) && !self.ignore_set.is_match(rel)
    }

    /// True if the scan should not descend into this relative directory.
    pub fn is_ignored_dir(&self, rel: &str) -> bool {
        self.ignore_dir_set.is_match(rel)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("invalid glob pattern '{pattern}'"))?;
        builder.add(glob);
    }
    builder.build().context("building glob set")
}
