// src/event/relay.rs

//! Per-job event relay.
//!
//! Exactly one `EventRelay` exists per in-flight job. It is created by the
//! orchestrator when the job is submitted and lives inside that job's run
//! future, so its suite map is never visible to any other job. Two files
//! that happen to use the same suite ids therefore cannot interfere.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::errors::{Result, RunnerError};
use crate::event::{
    BuildCompletedPayload, EventKind, ObserverRegistry, RunnerEvent, SuiteRef, TestRef,
};
use crate::index::path_utils::relative_path;
use crate::types::{ErrorInfo, JobId, SuiteInfo, TestInfo};

/// Human-readable context resolved from the job's suite map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    pub suite_title: String,
    /// Number of tests known for the suite at the time of the event.
    pub test_count: usize,
    /// Set for `TEST_ERROR` / `TEST_SUCCESS`.
    pub test_title: Option<String>,
}

/// A worker event tagged with its job and enriched with resolved context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayedEvent {
    pub job_id: JobId,
    /// Test file of the job, relative to the target directory.
    pub file: String,
    pub event: RunnerEvent,
    /// `None` for build events.
    pub context: Option<EventContext>,
}

impl RelayedEvent {
    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }
}

#[derive(Debug)]
pub struct EventRelay {
    job_id: JobId,
    file: String,
    target_dir: PathBuf,
    suites: HashMap<String, SuiteInfo>,
    build_error: Option<ErrorInfo>,
    observers: ObserverRegistry,
}

impl EventRelay {
    pub fn new(
        job_id: JobId,
        file: impl Into<String>,
        target_dir: impl Into<PathBuf>,
        observers: ObserverRegistry,
    ) -> Self {
        Self {
            job_id,
            file: file.into(),
            target_dir: target_dir.into(),
            suites: HashMap::new(),
            build_error: None,
            observers,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Suite as recorded by `SUITE_START` (and later updates).
    pub fn suite(&self, id: &str) -> Option<&SuiteInfo> {
        self.suites.get(id)
    }

    pub fn suite_count(&self) -> usize {
        self.suites.len()
    }

    /// Error of the last `BUILD_FAILED` seen in this job.
    pub fn build_error(&self) -> Option<&ErrorInfo> {
        self.build_error.as_ref()
    }

    /// Resolve `event` and forward it to every observer.
    ///
    /// Returns `ProtocolViolation` when the event references a suite that
    /// was never started in this job; nothing is forwarded in that case.
    pub fn handle(&mut self, event: RunnerEvent) -> Result<()> {
        trace!(job_id = %self.job_id, kind = %event.kind(), "relaying worker event");

        let (event, context) = self.resolve(event)?;
        let relayed = RelayedEvent {
            job_id: self.job_id,
            file: self.file.clone(),
            event,
            context,
        };
        self.observers.dispatch(&relayed);
        Ok(())
    }

    /// Update the suite map for `event` and compute its context.
    pub fn resolve(&mut self, event: RunnerEvent) -> Result<(RunnerEvent, Option<EventContext>)> {
        match event {
            RunnerEvent::BuildFailed(payload) => {
                self.build_error = Some(payload.error.clone());
                Ok((RunnerEvent::BuildFailed(payload), None))
            }
            RunnerEvent::BuildCompleted(payload) => {
                let payload = BuildCompletedPayload {
                    test_file_path: relative_path(&self.target_dir, &payload.test_file_path),
                    duration: payload.duration,
                };
                Ok((RunnerEvent::BuildCompleted(payload), None))
            }
            RunnerEvent::SuiteStart(payload) => {
                let suite = &payload.suite;
                let context = EventContext {
                    suite_title: suite.title.clone(),
                    test_count: suite.tests.len(),
                    test_title: None,
                };
                if self
                    .suites
                    .insert(suite.id.clone(), suite.clone())
                    .is_some()
                {
                    debug!(job_id = %self.job_id, suite = %suite.id, "suite restarted; replacing stored suite");
                }
                Ok((RunnerEvent::SuiteStart(payload), Some(context)))
            }
            RunnerEvent::SuiteCompleted(payload) => {
                let suite = self.suite_mut(EventKind::SuiteCompleted, &payload.suite)?;
                suite.errors = payload.suite.errors;
                let context = EventContext {
                    suite_title: suite.title.clone(),
                    test_count: suite.tests.len(),
                    test_title: None,
                };
                Ok((RunnerEvent::SuiteCompleted(payload), Some(context)))
            }
            RunnerEvent::TestError(payload) => {
                let context = self.resolve_test(EventKind::TestError, &payload.suite, &payload.test)?;
                // SUITE_COMPLETED later overwrites this with the worker's count.
                if let Some(suite) = self.suites.get_mut(&payload.suite.id) {
                    suite.errors += 1;
                }
                Ok((RunnerEvent::TestError(payload), Some(context)))
            }
            RunnerEvent::TestSuccess(payload) => {
                let context =
                    self.resolve_test(EventKind::TestSuccess, &payload.suite, &payload.test)?;
                Ok((RunnerEvent::TestSuccess(payload), Some(context)))
            }
        }
    }

    fn suite_mut(&mut self, kind: EventKind, suite: &SuiteRef) -> Result<&mut SuiteInfo> {
        let job_id = self.job_id.0;
        self.suites.get_mut(&suite.id).ok_or_else(|| {
            RunnerError::protocol(
                job_id,
                format!("{kind} references suite '{}' before SUITE_START", suite.id),
            )
        })
    }

    fn resolve_test(
        &mut self,
        kind: EventKind,
        suite_ref: &SuiteRef,
        test_ref: &TestRef,
    ) -> Result<EventContext> {
        let job_id = self.job_id.0;
        let suite = self.suite_mut(kind, suite_ref)?;

        let known = suite.find_test(&test_ref.id).map(|t| t.title.clone());
        let test_title = match known {
            Some(title) => title,
            None => {
                // Tests not enumerated up front must introduce themselves.
                let title = test_ref.title.clone().ok_or_else(|| {
                    RunnerError::protocol(
                        job_id,
                        format!(
                            "{kind} references unknown test '{}' in suite '{}'",
                            test_ref.id, suite_ref.id
                        ),
                    )
                })?;
                suite.tests.push(TestInfo {
                    id: test_ref.id.clone(),
                    title: title.clone(),
                });
                title
            }
        };

        Ok(EventContext {
            suite_title: suite.title.clone(),
            test_count: suite.tests.len(),
            test_title: Some(test_title),
        })
    }
}
