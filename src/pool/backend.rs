// src/pool/backend.rs

//! Pluggable worker backend abstraction.
//!
//! The pool talks to a `WorkerBackend` instead of spawning processes itself.
//! This makes it easy to swap in a scripted worker in tests while keeping the
//! production implementation in [`super::process`].
//!
//! A backend receives one job at a time per call, emits lifecycle events
//! through the provided sender (in order), and resolves to the file's
//! [`RunResult`] or an error.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::errors::Result;
use crate::event::RunnerEvent;
use crate::types::{RunResult, TestFileJob};

/// Per-job event sink handed to a backend.
pub type WorkerEvents = mpsc::UnboundedSender<RunnerEvent>;

/// Future returned by [`WorkerBackend::run_job`].
pub type JobFuture = Pin<Box<dyn Future<Output = Result<RunResult>> + Send + 'static>>;

/// Trait abstracting how a single test file is compiled and executed.
///
/// Production code uses [`super::ProcessWorker`]; tests provide their own
/// implementation that replays scripted events.
pub trait WorkerBackend: Send + Sync {
    /// Compile and run `job`, reporting events through `events`.
    ///
    /// The returned future is spawned on its own Tokio task, so a panic in
    /// it only fails this job.
    fn run_job(&self, job: TestFileJob, events: WorkerEvents) -> JobFuture;
}
