// src/event/mod.rs

//! Worker lifecycle events and their fan-out.
//!
//! Workers report progress as a closed set of [`RunnerEvent`]s. After the
//! first mention of a suite (`SUITE_START`), events only carry ids; the
//! per-job [`relay::EventRelay`] resolves those ids back to titles before
//! handing the enriched [`relay::RelayedEvent`] to every registered observer.
//!
//! - [`relay`] owns the per-job suite map and identity resolution.
//! - [`observers`] is the append-only observer registry.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{ErrorInfo, RunResult, SuiteInfo};

pub mod observers;
pub mod relay;

pub use observers::{EventHandler, ObserverRegistry};
pub use relay::{EventContext, EventRelay, RelayedEvent};

/// Reference to a suite that was announced earlier by `SUITE_START`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteRef {
    pub id: String,
    /// Failed test count; only meaningful on `SUITE_COMPLETED`.
    #[serde(default)]
    pub errors: u32,
}

impl SuiteRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            errors: 0,
        }
    }
}

/// Reference to a test inside a suite.
///
/// `title` is optional: tests enumerated by `SUITE_START` are referenced by
/// id alone, tests discovered later must carry their title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl TestRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFailedPayload {
    pub error: ErrorInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildCompletedPayload {
    pub test_file_path: PathBuf,
    /// Milliseconds.
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteStartPayload {
    pub suite: SuiteInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteCompletedPayload {
    pub suite: SuiteRef,
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestErrorPayload {
    pub suite: SuiteRef,
    pub test: TestRef,
    pub error: ErrorInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub duration: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuccessPayload {
    pub suite: SuiteRef,
    pub test: TestRef,
    pub duration: u64,
}

/// One lifecycle event emitted by a worker.
///
/// On the wire: `{"type": "SUITE_START", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunnerEvent {
    BuildFailed(BuildFailedPayload),
    BuildCompleted(BuildCompletedPayload),
    SuiteStart(SuiteStartPayload),
    SuiteCompleted(SuiteCompletedPayload),
    TestError(TestErrorPayload),
    TestSuccess(TestSuccessPayload),
}

/// Payload-free discriminant of [`RunnerEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BuildFailed,
    BuildCompleted,
    SuiteStart,
    SuiteCompleted,
    TestError,
    TestSuccess,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::BuildFailed => "BUILD_FAILED",
            EventKind::BuildCompleted => "BUILD_COMPLETED",
            EventKind::SuiteStart => "SUITE_START",
            EventKind::SuiteCompleted => "SUITE_COMPLETED",
            EventKind::TestError => "TEST_ERROR",
            EventKind::TestSuccess => "TEST_SUCCESS",
        };
        f.write_str(s)
    }
}

impl RunnerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RunnerEvent::BuildFailed(_) => EventKind::BuildFailed,
            RunnerEvent::BuildCompleted(_) => EventKind::BuildCompleted,
            RunnerEvent::SuiteStart(_) => EventKind::SuiteStart,
            RunnerEvent::SuiteCompleted(_) => EventKind::SuiteCompleted,
            RunnerEvent::TestError(_) => EventKind::TestError,
            RunnerEvent::TestSuccess(_) => EventKind::TestSuccess,
        }
    }

    /// Suite id this event refers to, if any.
    pub fn suite_id(&self) -> Option<&str> {
        match self {
            RunnerEvent::BuildFailed(_) | RunnerEvent::BuildCompleted(_) => None,
            RunnerEvent::SuiteStart(p) => Some(&p.suite.id),
            RunnerEvent::SuiteCompleted(p) => Some(&p.suite.id),
            RunnerEvent::TestError(p) => Some(&p.suite.id),
            RunnerEvent::TestSuccess(p) => Some(&p.suite.id),
        }
    }
}

/// One line of worker stdout.
///
/// `{"kind": "event", "data": {...}}` or `{"kind": "result", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum WorkerMessage {
    Event(RunnerEvent),
    Result(RunResult),
}

impl WorkerMessage {
    /// Parse one line of worker stdout.
    ///
    /// `Ok(None)` for plain output: not JSON, or JSON without a `kind`.
    /// A line that has a `kind` but does not match the protocol is an error.
    pub fn parse_line(line: &str) -> Result<Option<Self>, serde_json::Error> {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
            return Ok(None);
        };
        if value.get("kind").is_none() {
            return Ok(None);
        }
        serde_json::from_value(value).map(Some)
    }
}
