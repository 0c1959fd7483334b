// src/types.rs

//! Shared data model for jobs, suites and run results.
//!
//! These types cross the worker boundary as JSON (camelCase keys) and are
//! also what observers and the CLI see after a run.

use std::fmt;
use std::ops::AddAssign;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One compile-and-run request for a single test file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFileJob {
    /// Absolute path of the test file.
    pub entry: PathBuf,
}

impl TestFileJob {
    pub fn new(entry: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
        }
    }
}

/// Identity of one job, assigned by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestInfo {
    pub id: String,
    pub title: String,
}

/// A named group of tests. `id` is unique only within one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteInfo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub file_path: PathBuf,
    #[serde(default)]
    pub tests: Vec<TestInfo>,
    /// Number of failed tests in this suite.
    #[serde(default)]
    pub errors: u32,
}

impl SuiteInfo {
    pub fn find_test(&self, id: &str) -> Option<&TestInfo> {
        self.tests.iter().find(|t| t.id == id)
    }

    pub fn passed_count(&self) -> usize {
        self.tests.len().saturating_sub(self.errors as usize)
    }
}

/// Error details reported by a worker (build error or failed assertion).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }
}

/// Counters for one file, or summed over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunStats {
    pub suite_count: u32,
    pub error_suite_count: u32,
    pub test_count: u32,
    pub error_test_count: u32,
}

impl RunStats {
    /// Counters derived from suite outcomes.
    pub fn from_suites(suites: &[SuiteInfo]) -> Self {
        let mut stats = RunStats::default();
        for suite in suites {
            stats.suite_count += 1;
            stats.test_count += suite.tests.len() as u32;
            stats.error_test_count += suite.errors;
            if suite.errors > 0 {
                stats.error_suite_count += 1;
            }
        }
        stats
    }

    pub fn is_empty(&self) -> bool {
        *self == RunStats::default()
    }
}

impl AddAssign for RunStats {
    fn add_assign(&mut self, other: Self) {
        self.suite_count += other.suite_count;
        self.error_suite_count += other.error_suite_count;
        self.test_count += other.test_count;
        self.error_test_count += other.error_test_count;
    }
}

/// Final result of one file job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    #[serde(default)]
    pub suites: Vec<SuiteInfo>,
    #[serde(default)]
    pub stats: RunStats,
    /// Set when the file failed to build; `suites` is then empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_error: Option<ErrorInfo>,
}

impl RunResult {
    /// Result for a file whose build failed: nothing was executed.
    pub fn build_failed(error: ErrorInfo) -> Self {
        Self {
            suites: Vec::new(),
            stats: RunStats::default(),
            build_error: Some(error),
        }
    }
}
