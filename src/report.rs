// src/report.rs

//! Console reporter: an ordinary observer that logs progress via `tracing`.

use tracing::{error, info, warn};

use crate::engine::RunSummary;
use crate::event::{RelayedEvent, RunnerEvent};

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report(&self, event: &RelayedEvent) {
        let suite_title = event
            .context
            .as_ref()
            .map(|c| c.suite_title.as_str())
            .unwrap_or_default();
        let test_title = event
            .context
            .as_ref()
            .and_then(|c| c.test_title.as_deref())
            .unwrap_or_default();

        match &event.event {
            RunnerEvent::BuildFailed(p) => {
                error!(file = %event.file, "Test build failed: {}", p.error.message);
            }
            RunnerEvent::BuildCompleted(p) => {
                info!("Built {} in {}ms", p.test_file_path.display(), p.duration);
            }
            RunnerEvent::SuiteStart(_) => {
                info!(file = %event.file, "{}", suite_title);
            }
            RunnerEvent::SuiteCompleted(p) => {
                let total = event.context.as_ref().map(|c| c.test_count).unwrap_or(0);
                let passed = total.saturating_sub(p.suite.errors as usize);
                if p.suite.errors > 0 {
                    warn!(
                        "  {} / {} tests passed: {} ({}ms)",
                        passed, total, suite_title, p.duration
                    );
                } else {
                    info!(
                        "  {} / {} tests passed: {} ({}ms)",
                        passed, total, suite_title, p.duration
                    );
                }
            }
            RunnerEvent::TestError(p) => {
                error!("  FAIL {} ({}ms)", test_title, p.duration);
                let stack = p.stack.as_deref().or(p.error.stack.as_deref()).unwrap_or("");
                error!(suite = %suite_title, "{}\n{}", p.error.message, stack);
            }
            RunnerEvent::TestSuccess(p) => {
                info!("  ok {} ({}ms)", test_title, p.duration);
            }
        }
    }

    /// Log the final tally of a run.
    pub fn summarize(&self, summary: &RunSummary) {
        for file in summary.failed_files() {
            let reason = file
                .failure
                .as_deref()
                .or(file.result.build_error.as_ref().map(|e| e.message.as_str()))
                .unwrap_or("unknown failure");
            error!(file = %file.path, "{}", reason);
        }

        let stats = &summary.stats;
        info!(
            "{} files, {} suites ({} failed), {} tests ({} failed) in {}ms",
            summary.files.len(),
            stats.suite_count,
            stats.error_suite_count,
            stats.test_count,
            stats.error_test_count,
            summary.duration.as_millis()
        );
    }
}
