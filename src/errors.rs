// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The worker could not compile the test file.
    #[error("Test build failed for {path:?}: {message}")]
    BuildFailed { path: PathBuf, message: String },

    /// The worker emitted an event that breaks the event protocol, e.g. a
    /// reference to a suite that was never started.
    #[error("Protocol violation in job {job_id}: {message}")]
    ProtocolViolation { job_id: u64, message: String },

    /// A stdout line claimed to be a protocol message but did not match it.
    #[error("Worker for {path:?} sent a malformed protocol message: {message}")]
    MalformedMessage { path: PathBuf, message: String },

    /// The worker finished without reporting a result.
    #[error("Worker for {path:?} exited without a result (exit code {exit_code:?})")]
    MissingCompletion {
        path: PathBuf,
        exit_code: Option<i32>,
    },

    #[error("Worker crashed while running {path:?}: {message}")]
    WorkerCrashed { path: PathBuf, message: String },

    #[error("Worker for {path:?} timed out after {timeout_ms}ms")]
    JobTimedOut { path: PathBuf, timeout_ms: u64 },

    #[error("Worker pool terminated")]
    PoolTerminated,

    #[error("Orchestrator closed")]
    Closed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RunnerError {
    pub fn protocol(job_id: u64, message: impl Into<String>) -> Self {
        RunnerError::ProtocolViolation {
            job_id,
            message: message.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunnerError>;
