// src/engine/orchestrator.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::config::ConfigFile;
use crate::engine::summary::RunSummary;
use crate::errors::{Result, RunnerError};
use crate::event::{EventRelay, ObserverRegistry, RelayedEvent};
use crate::fs::RealFileSystem;
use crate::index::{FileIndex, FilePatterns, relative_path};
use crate::pool::{PoolOptions, ProcessWorker, WorkerBackend, WorkerPool};
use crate::types::{ErrorInfo, JobId, RunResult, RunStats, TestFileJob};

/// Top-level coordinator: owns the worker pool, the file index and the
/// observer registry.
///
/// All operations take `&self`, so several `run_file` calls may be in
/// flight at once; each gets its own [`EventRelay`].
#[derive(Debug)]
pub struct Orchestrator {
    target_dir: PathBuf,
    index: FileIndex,
    pool: WorkerPool,
    observers: ObserverRegistry,
    next_job_id: AtomicU64,
    closed: AtomicBool,
}

impl Orchestrator {
    /// Reported paths are made relative to the index root.
    pub fn new(index: FileIndex, backend: Arc<dyn WorkerBackend>, pool_options: PoolOptions) -> Self {
        let target_dir = index.root().to_path_buf();
        info!(
            target_dir = ?target_dir,
            files = index.len(),
            max_workers = pool_options.max_workers,
            "orchestrator ready"
        );

        Self {
            target_dir,
            index,
            pool: WorkerPool::new(backend, pool_options),
            observers: ObserverRegistry::new(),
            next_job_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Scan the configured target directory and wire up a [`ProcessWorker`].
    ///
    /// Starts the file watcher when `[runner].watch` is set, which requires
    /// a Tokio runtime.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let patterns = FilePatterns::from_config(cfg)?;
        let index = FileIndex::scan(&RealFileSystem, &cfg.runner.target_directory, patterns)?;
        if cfg.runner.watch {
            index.watch()?;
        }

        let backend = ProcessWorker::new(cfg.worker.command.clone(), cfg.worker.args.clone())
            .with_working_dir(index.root());
        let pool_options = PoolOptions {
            max_workers: cfg.max_workers(),
            job_timeout: cfg.job_timeout(),
        };

        Ok(Self::new(index, Arc::new(backend), pool_options))
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn index(&self) -> &FileIndex {
        &self.index
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Register an observer for every event of every job.
    ///
    /// Observers are called synchronously, in registration order.
    pub fn on_event<F>(&self, handler: F)
    where
        F: Fn(&RelayedEvent) + Send + Sync + 'static,
    {
        self.observers.register(handler);
    }

    /// Receive events asynchronously (e.g. to push them to a UI).
    pub fn subscribe(&self, capacity: usize) -> broadcast::Receiver<RelayedEvent> {
        self.observers.subscribe(capacity)
    }

    /// Run one indexed test file.
    ///
    /// Returns `Ok(None)` if `path` is not in the index. A build
    /// failure is not an error: the result has no suites and `build_error`
    /// set. Worker crashes, timeouts and protocol violations fail this file
    /// only and are returned as errors.
    pub async fn run_file(&self, path: &str) -> Result<Option<RunResult>> {
        self.ensure_open()?;

        let Some(file) = self.index.lookup(path) else {
            warn!(file = %path, "test file not found in index; skipping");
            return Ok(None);
        };

        let job_id = JobId(self.next_job_id.fetch_add(1, Ordering::SeqCst));
        let mut relay = EventRelay::new(
            job_id,
            file.relative.clone(),
            self.target_dir.clone(),
            self.observers.clone(),
        );

        debug!(%job_id, file = %file.relative, "submitting test file job");
        let outcome = self
            .pool
            .submit(TestFileJob::new(file.absolute.clone()), |event| relay.handle(event))
            .await;

        let mut result = match outcome {
            Ok(result) => result,
            Err(RunnerError::BuildFailed { message, .. }) => {
                let error = relay
                    .build_error()
                    .cloned()
                    .unwrap_or_else(|| ErrorInfo::new(message));
                warn!(%job_id, file = %file.relative, error = %error.message, "test build failed");
                RunResult::build_failed(error)
            }
            Err(RunnerError::PoolTerminated) if self.is_closed() => {
                return Err(RunnerError::Closed);
            }
            Err(err) => {
                error!(%job_id, file = %file.relative, error = %err, "test file job failed");
                return Err(err);
            }
        };

        if result.build_error.is_none() {
            result.build_error = relay.build_error().cloned();
        }
        if result.stats.is_empty() && !result.suites.is_empty() {
            result.stats = RunStats::from_suites(&result.suites);
        }
        for suite in result.suites.iter_mut() {
            suite.file_path = relative_path(&self.target_dir, &suite.file_path);
        }

        debug!(
            %job_id,
            file = %file.relative,
            suites = result.suites.len(),
            error_suites = result.stats.error_suite_count,
            "test file job finished"
        );
        Ok(Some(result))
    }

    /// Run every indexed file and aggregate the results.
    ///
    /// Files run concurrently up to the pool's worker limit. Per-file
    /// failures are recorded in the summary, not returned.
    pub async fn run_all(&self) -> Result<RunSummary> {
        self.ensure_open()?;

        let started = Instant::now();
        let files = self.index.files();
        info!(
            files = files.len(),
            max_workers = self.pool.options().max_workers,
            "running all test files"
        );

        let runs = files.iter().map(|file| async move {
            let outcome = self.run_file(&file.relative).await;
            (file.relative.clone(), outcome)
        });
        let outcomes = join_all(runs).await;

        let mut summary = RunSummary::new();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(Some(result)) => summary.record(path, result),
                Ok(None) => summary.record_failure(path, "test file was removed during the run"),
                Err(RunnerError::Closed) => return Err(RunnerError::Closed),
                Err(err) => summary.record_failure(path, err.to_string()),
            }
        }
        summary.duration = started.elapsed();

        info!(
            files = summary.files.len(),
            suites = summary.stats.suite_count,
            error_suites = summary.stats.error_suite_count,
            failed_files = summary.failed_files().count(),
            duration_ms = summary.duration.as_millis() as u64,
            "run finished"
        );
        Ok(summary)
    }

    /// Stop watching files, terminate the pool and drop every observer.
    ///
    /// Calling it again is a no-op. Afterwards every run operation returns
    /// [`RunnerError::Closed`].
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("orchestrator already closed");
            return;
        }

        info!("closing orchestrator");
        self.index.destroy();
        self.pool.terminate().await;
        self.observers.clear();
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(RunnerError::Closed);
        }
        Ok(())
    }
}
