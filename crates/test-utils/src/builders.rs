#![allow(dead_code)]

use std::path::PathBuf;

use testpool::config::{ConfigFile, RawConfigFile};
use testpool::event::{
    BuildCompletedPayload, BuildFailedPayload, RunnerEvent, SuiteCompletedPayload, SuiteRef,
    SuiteStartPayload, TestErrorPayload, TestRef, TestSuccessPayload,
};
use testpool::types::{ErrorInfo, SuiteInfo, TestInfo};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.worker.command = "testpool-worker".to_string();
        Self { config }
    }

    pub fn target_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.runner.target_directory = dir.into();
        self
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.config.runner.max_workers = Some(n);
        self
    }

    pub fn job_timeout(mut self, duration: &str) -> Self {
        self.config.runner.job_timeout = Some(duration.to_string());
        self
    }

    pub fn watch(mut self, val: bool) -> Self {
        self.config.runner.watch = val;
        self
    }

    /// Replace the default match globs.
    pub fn match_patterns(mut self, patterns: &[&str]) -> Self {
        self.config.files.match_patterns = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.config.files.ignore_patterns.push(pattern.to_string());
        self
    }

    pub fn worker(mut self, command: &str, args: &[&str]) -> Self {
        self.config.worker.command = command.to_string();
        self.config.worker.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Suite with the given `(id, title)` tests.
pub fn suite(id: &str, title: &str, tests: &[(&str, &str)]) -> SuiteInfo {
    SuiteInfo {
        id: id.to_string(),
        title: title.to_string(),
        file_path: PathBuf::new(),
        tests: tests
            .iter()
            .map(|(id, title)| TestInfo {
                id: id.to_string(),
                title: title.to_string(),
            })
            .collect(),
        errors: 0,
    }
}

pub fn build_failed(message: &str) -> RunnerEvent {
    RunnerEvent::BuildFailed(BuildFailedPayload {
        error: ErrorInfo::new(message),
    })
}

pub fn build_completed(path: impl Into<PathBuf>, duration: u64) -> RunnerEvent {
    RunnerEvent::BuildCompleted(BuildCompletedPayload {
        test_file_path: path.into(),
        duration,
    })
}

pub fn suite_start(suite: SuiteInfo) -> RunnerEvent {
    RunnerEvent::SuiteStart(SuiteStartPayload { suite })
}

pub fn suite_completed(suite_id: &str, errors: u32, duration: u64) -> RunnerEvent {
    RunnerEvent::SuiteCompleted(SuiteCompletedPayload {
        suite: SuiteRef {
            id: suite_id.to_string(),
            errors,
        },
        duration,
    })
}

pub fn test_success(suite_id: &str, test_id: &str, duration: u64) -> RunnerEvent {
    RunnerEvent::TestSuccess(TestSuccessPayload {
        suite: SuiteRef::new(suite_id),
        test: TestRef::new(test_id),
        duration,
    })
}

pub fn test_error(suite_id: &str, test_id: &str, message: &str, duration: u64) -> RunnerEvent {
    RunnerEvent::TestError(TestErrorPayload {
        suite: SuiteRef::new(suite_id),
        test: TestRef::new(test_id),
        error: ErrorInfo::new(message),
        stack: None,
        duration,
    })
}

/// `TEST_SUCCESS` for a test that `SUITE_START` did not enumerate.
pub fn test_success_titled(suite_id: &str, test_id: &str, title: &str, duration: u64) -> RunnerEvent {
    RunnerEvent::TestSuccess(TestSuccessPayload {
        suite: SuiteRef::new(suite_id),
        test: TestRef {
            id: test_id.to_string(),
            title: Some(title.to_string()),
        },
        duration,
    })
}
