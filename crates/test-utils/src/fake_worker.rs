use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::Notify;

use testpool::errors::RunnerError;
use testpool::event::RunnerEvent;
use testpool::pool::{JobFuture, WorkerBackend, WorkerEvents};
use testpool::types::{RunResult, SuiteInfo, TestFileJob};

/// How a scripted job ends after replaying its events.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Result built from the replayed `SUITE_START` / `SUITE_COMPLETED`.
    Complete,
    /// This exact result.
    Result(RunResult),
    BuildFailure(String),
    Panic(String),
    /// Never finishes.
    Hang,
    /// Worker went away without a result.
    NoCompletion,
}

/// Events and outcome for one test file.
#[derive(Debug, Clone)]
pub struct Script {
    events: Vec<RunnerEvent>,
    outcome: Outcome,
    delay: Option<Duration>,
    gate: Option<Arc<Notify>>,
}

impl Script {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            outcome: Outcome::Complete,
            delay: None,
            gate: None,
        }
    }

    pub fn event(mut self, event: RunnerEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn events(mut self, events: impl IntoIterator<Item = RunnerEvent>) -> Self {
        self.events.extend(events);
        self
    }

    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Sleep before emitting anything.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Wait for `gate` to be notified before emitting anything.
    pub fn gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::new()
    }
}

/// A fake worker backend that:
/// - replays a per-file script of events
/// - records which files were started, in order
/// - tracks how many jobs run at the same time
///
/// Scripts are keyed by the file name of the job's entry.
#[derive(Debug, Clone, Default)]
pub struct ScriptedWorker {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    started: Arc<Mutex<Vec<String>>>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

impl ScriptedWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(self, file_name: &str, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(file_name.to_string(), script);
        self
    }

    /// File names in the order their jobs started.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of jobs that were running at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Jobs that are no longer running (completed, failed or aborted).
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

/// Marks a job as no longer running when its future is dropped.
struct ActiveGuard {
    active: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

impl WorkerBackend for ScriptedWorker {
    fn run_job(&self, job: TestFileJob, events: WorkerEvents) -> JobFuture {
        let name = job
            .entry
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let script = self.scripts.lock().unwrap().get(&name).cloned();
        self.started.lock().unwrap().push(name.clone());

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let guard = ActiveGuard {
            active: Arc::clone(&self.active),
            finished: Arc::clone(&self.finished),
        };

        Box::pin(async move {
            let _guard = guard;
            let script = script
                .ok_or_else(|| RunnerError::Other(anyhow!("no script for {name}")))?;

            if let Some(gate) = &script.gate {
                gate.notified().await;
            }
            if let Some(delay) = script.delay {
                tokio::time::sleep(delay).await;
            }

            for event in script.events.iter().cloned() {
                let _ = events.send(event);
                tokio::task::yield_now().await;
            }

            match script.outcome {
                Outcome::Complete => Ok(result_from_events(&script.events, &job)),
                Outcome::Result(result) => Ok(result),
                Outcome::BuildFailure(message) => Err(RunnerError::BuildFailed {
                    path: job.entry,
                    message,
                }),
                Outcome::Panic(message) => panic!("{message}"),
                Outcome::Hang => std::future::pending().await,
                Outcome::NoCompletion => Err(RunnerError::MissingCompletion {
                    path: job.entry,
                    exit_code: Some(1),
                }),
            }
        })
    }
}

/// Suites as a real worker would report them: absolute file path, final
/// error counts. Stats are left empty.
fn result_from_events(events: &[RunnerEvent], job: &TestFileJob) -> RunResult {
    let mut suites: Vec<SuiteInfo> = Vec::new();
    for event in events {
        match event {
            RunnerEvent::SuiteStart(p) => {
                let mut suite = p.suite.clone();
                suite.file_path = job.entry.clone();
                suites.push(suite);
            }
            RunnerEvent::SuiteCompleted(p) => {
                if let Some(suite) = suites.iter_mut().find(|s| s.id == p.suite.id) {
                    suite.errors = p.suite.errors;
                }
            }
            _ => {}
        }
    }

    RunResult {
        suites,
        ..RunResult::default()
    }
}
