// src/pool/mod.rs

//! Worker pool.
//!
//! The pool accepts one job per test file and runs at most `max_workers` of
//! them at the same time. Jobs beyond the ceiling wait for a free slot in
//! FIFO order (Tokio's semaphore is fair).
//!
//! - [`backend`] provides the `WorkerBackend` trait the pool delegates to.
//! - [`process`] is the production backend: one OS process per job.
//!
//! Every job's backend future runs on its own Tokio task. A panic, a crash
//! of the worker process, or a hang (with `job_timeout`) fails that job
//! only; the worker is aborted/killed when its job is dropped.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::errors::{Result, RunnerError};
use crate::event::RunnerEvent;
use crate::types::{RunResult, TestFileJob};

pub mod backend;
pub mod process;

pub use backend::{JobFuture, WorkerBackend, WorkerEvents};
pub use process::ProcessWorker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Concurrency ceiling (number of workers).
    pub max_workers: usize,
    /// Kill a job that runs longer than this.
    pub job_timeout: Option<Duration>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            job_timeout: None,
        }
    }
}

/// Number of workers used when nothing is configured.
pub fn default_max_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Aborts the wrapped task when dropped.
struct AbortOnDrop(JoinHandle<Result<RunResult>>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct WorkerPool {
    backend: Arc<dyn WorkerBackend>,
    admission: Arc<Semaphore>,
    options: PoolOptions,
    terminated: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("options", &self.options)
            .field("terminated", &self.is_terminated())
            .finish_non_exhaustive()
    }
}

impl WorkerPool {
    pub fn new(backend: Arc<dyn WorkerBackend>, options: PoolOptions) -> Self {
        let options = PoolOptions {
            max_workers: options.max_workers.max(1),
            ..options
        };
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            backend,
            admission: Arc::new(Semaphore::new(options.max_workers)),
            options,
            terminated: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    pub fn options(&self) -> PoolOptions {
        self.options
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Number of jobs currently holding a worker slot.
    pub fn active_jobs(&self) -> usize {
        if self.is_terminated() {
            return 0;
        }
        self.options
            .max_workers
            .saturating_sub(self.admission.available_permits())
    }

    /// Run `job` on the next free worker.
    ///
    /// `on_event` is called for every event the worker emits, in emission
    /// order, before this future resolves. If it returns an error the job is
    /// aborted and that error is returned.
    pub async fn submit<F>(&self, job: TestFileJob, mut on_event: F) -> Result<RunResult>
    where
        F: FnMut(RunnerEvent) -> Result<()> + Send,
    {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if self.is_terminated() {
            return Err(RunnerError::PoolTerminated);
        }

        let _permit = self
            .admission
            .acquire()
            .await
            .map_err(|_| RunnerError::PoolTerminated)?;
        // Jobs queued before `terminate` must not start afterwards.
        if self.is_terminated() {
            return Err(RunnerError::PoolTerminated);
        }

        let entry = job.entry.clone();
        debug!(entry = ?entry, active = self.active_jobs(), "job admitted to worker pool");

        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<RunnerEvent>();
        let mut worker = AbortOnDrop(tokio::spawn(self.backend.run_job(job, event_tx)));

        let job_timeout = self.options.job_timeout;
        let timeout = async move {
            match job_timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(timeout);

        let joined = loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    info!(entry = ?entry, "pool terminating; abandoning in-flight job");
                    return Err(RunnerError::PoolTerminated);
                }
                Some(event) = event_rx.recv() => {
                    on_event(event)?;
                }
                joined = &mut worker.0 => break joined,
                _ = &mut timeout => {
                    let timeout_ms = job_timeout.unwrap_or_default().as_millis() as u64;
                    warn!(entry = ?entry, timeout_ms, "job timed out; killing worker");
                    return Err(RunnerError::JobTimedOut {
                        path: entry,
                        timeout_ms,
                    });
                }
            }
        };

        // Events sent right before the worker finished are still queued.
        while let Ok(event) = event_rx.try_recv() {
            on_event(event)?;
        }

        match joined {
            Ok(result) => result,
            Err(err) => Err(RunnerError::WorkerCrashed {
                path: entry,
                message: join_error_message(err),
            }),
        }
    }

    /// Stop accepting jobs, abandon in-flight ones and wait until every
    /// worker slot is released. Calling it again is a no-op.
    pub async fn terminate(&self) {
        if self.terminated.swap(true, Ordering::SeqCst) {
            debug!("worker pool already terminated");
            return;
        }

        info!(max_workers = self.options.max_workers, "terminating worker pool");
        self.shutdown_tx.send_replace(true);

        // Each abandoned job drops its worker and returns its permit.
        match self
            .admission
            .acquire_many(self.options.max_workers as u32)
            .await
        {
            Ok(permits) => permits.forget(),
            Err(_) => debug!("worker pool admission already closed"),
        }
        self.admission.close();

        info!("worker pool terminated");
    }
}

fn join_error_message(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        "worker task was cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("worker panicked: {s}")
    } else {
        "worker panicked".to_string()
    }
}
