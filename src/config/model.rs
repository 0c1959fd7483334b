// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [runner]
/// target_directory = "."
/// max_workers = 4
/// job_timeout = "30s"
///
/// [files]
/// match = ["**/*.test.*"]
/// ignore = ["**/node_modules/**"]
///
/// [worker]
/// command = "node"
/// args = ["worker.js"]
/// ```
///
/// All sections are optional and have reasonable defaults, except that a
/// worker command must be provided before anything can run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub runner: RunnerSection,

    #[serde(default)]
    pub files: FilesSection,

    #[serde(default)]
    pub worker: WorkerSection,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holders can rely on
/// the checks in `validate.rs` having passed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub runner: RunnerSection,
    pub files: FilesSection,
    pub worker: WorkerSection,
    job_timeout: Option<Duration>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile, job_timeout: Option<Duration>) -> Self {
        Self {
            runner: raw.runner,
            files: raw.files,
            worker: raw.worker,
            job_timeout,
        }
    }

    /// Parsed `[runner].job_timeout`.
    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout
    }

    /// Effective worker count: configured value or available parallelism.
    pub fn max_workers(&self) -> usize {
        self.runner
            .max_workers
            .unwrap_or_else(crate::pool::default_max_workers)
    }
}

/// `[runner]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSection {
    /// Root directory for discovery; reported paths are relative to it.
    #[serde(default = "default_target_directory")]
    pub target_directory: PathBuf,

    /// Concurrency ceiling. Defaults to the available parallelism.
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// Duration string (e.g. `"30s"`); jobs running longer are killed.
    #[serde(default)]
    pub job_timeout: Option<String>,

    /// Keep the file index up to date with a filesystem watcher.
    #[serde(default)]
    pub watch: bool,
}

fn default_target_directory() -> PathBuf {
    PathBuf::from(".")
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            target_directory: default_target_directory(),
            max_workers: None,
            job_timeout: None,
            watch: false,
        }
    }
}

/// `[files]` section: which files are test files.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesSection {
    #[serde(default = "default_match", rename = "match")]
    pub match_patterns: Vec<String>,

    #[serde(default = "default_ignore", rename = "ignore")]
    pub ignore_patterns: Vec<String>,
}

fn default_match() -> Vec<String> {
    vec!["**/*.test.*".to_string(), "**/*.spec.*".to_string()]
}

fn default_ignore() -> Vec<String> {
    vec![
        "**/node_modules/**".to_string(),
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
    ]
}

impl Default for FilesSection {
    fn default() -> Self {
        Self {
            match_patterns: default_match(),
            ignore_patterns: default_ignore(),
        }
    }
}

/// `[worker]` section: the program that compiles and runs one test file.
///
/// It is invoked as `<command> <args...> <absolute test file path>`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerSection {
    #[serde(default)]
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,
}
