// src/engine/summary.rs

//! Pure aggregation of per-file outcomes into run-wide statistics.
//!
//! No Tokio, no IO: the orchestrator feeds finished files in, the CLI reads
//! the verdict out.

use std::time::Duration;

use crate::types::{RunResult, RunStats};

/// Outcome of one test file within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// Path relative to the target directory.
    pub path: String,
    /// Empty when the job failed before producing a result.
    pub result: RunResult,
    /// Why the job failed (crash, timeout, protocol violation), if it did.
    pub failure: Option<String>,
}

impl FileReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
            && self.result.build_error.is_none()
            && self.result.stats.error_suite_count == 0
    }
}

/// Aggregated result of running every indexed test file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// One report per file, in index order.
    pub files: Vec<FileReport>,
    /// Field-wise sum of every file's stats.
    pub stats: RunStats,
    pub duration: Duration,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_reports(reports: impl IntoIterator<Item = FileReport>) -> Self {
        let mut summary = Self::new();
        for report in reports {
            summary.push(report);
        }
        summary
    }

    /// Record a file that produced a result.
    pub fn record(&mut self, path: impl Into<String>, result: RunResult) {
        self.push(FileReport {
            path: path.into(),
            result,
            failure: None,
        });
    }

    /// Record a file whose job failed without a result.
    pub fn record_failure(&mut self, path: impl Into<String>, failure: impl Into<String>) {
        self.push(FileReport {
            path: path.into(),
            result: RunResult::default(),
            failure: Some(failure.into()),
        });
    }

    fn push(&mut self, report: FileReport) {
        self.stats += report.result.stats;
        self.files.push(report);
    }

    /// Files that failed to build or whose job failed.
    pub fn failed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| f.failure.is_some() || f.result.build_error.is_some())
    }

    /// True when no suite failed and every file built and reported a result.
    ///
    /// Stricter than looking at `error_suite_count` alone: a file that failed
    /// to build, crashed or timed out also fails the run.
    pub fn is_success(&self) -> bool {
        self.stats.error_suite_count == 0 && self.failed_files().next().is_none()
    }
}
