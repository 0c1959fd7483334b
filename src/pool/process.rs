// src/pool/process.rs

//! Worker backend that runs each test file in its own OS process.
//!
//! The worker command is invoked as `<command> <args...> <absolute entry>`
//! and reports back on stdout, one JSON [`WorkerMessage`] per line. Lines
//! that are not protocol messages are treated as plain worker output.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, anyhow};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{Result, RunnerError};
use crate::event::{RunnerEvent, WorkerMessage};
use crate::types::{ErrorInfo, RunResult, TestFileJob};

use super::backend::{JobFuture, WorkerBackend, WorkerEvents};

#[derive(Debug, Clone)]
pub struct ProcessWorker {
    command: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl ProcessWorker {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            working_dir: None,
        }
    }

    /// Run worker processes from `dir` instead of the current directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    async fn run(self, job: TestFileJob, events: WorkerEvents) -> Result<RunResult> {
        info!(
            entry = ?job.entry,
            cmd = %self.command,
            "starting worker process"
        );

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .arg(&job.entry)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning worker '{}' for {:?}", self.command, job.entry))?;

        // Always consume stderr so buffers don't fill; log at debug.
        if let Some(stderr) = child.stderr.take() {
            let entry = job.entry.clone();
            tokio::spawn(async move {
                let mut reader = BufReader::new(stderr);
                let mut buf = Vec::new();
                while let Ok(Some(line)) = read_lossy_line(&mut reader, &mut buf).await {
                    debug!(entry = ?entry, "worker stderr: {}", line);
                }
            });
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("worker stdout was not captured"))?;
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();

        let mut build_error: Option<ErrorInfo> = None;
        let mut result: Option<RunResult> = None;

        while let Some(line) = read_lossy_line(&mut reader, &mut buf).await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let message = WorkerMessage::parse_line(line).map_err(|e| {
                warn!(entry = ?job.entry, error = %e, "malformed worker message");
                RunnerError::MalformedMessage {
                    path: job.entry.clone(),
                    message: e.to_string(),
                }
            })?;

            match message {
                Some(WorkerMessage::Event(event)) => {
                    if let RunnerEvent::BuildFailed(payload) = &event {
                        build_error = Some(payload.error.clone());
                    }
                    // The receiver only goes away when the job was abandoned.
                    let _ = events.send(event);
                }
                Some(WorkerMessage::Result(run_result)) => {
                    result = Some(run_result);
                    break;
                }
                None => {
                    debug!(entry = ?job.entry, "worker output: {}", line);
                }
            }
        }

        // Stop reading so a chatty worker cannot block on a full pipe.
        drop(reader);

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for worker of {:?}", job.entry))?;
        let exit_code = status.code();

        match (result, build_error) {
            (Some(result), _) => {
                if !status.success() {
                    warn!(entry = ?job.entry, ?exit_code, "worker reported a result but exited unsuccessfully");
                }
                info!(
                    entry = ?job.entry,
                    ?exit_code,
                    suites = result.suites.len(),
                    "worker process finished"
                );
                Ok(result)
            }
            (None, Some(error)) => Err(RunnerError::BuildFailed {
                path: job.entry,
                message: error.message,
            }),
            (None, None) => Err(RunnerError::MissingCompletion {
                path: job.entry,
                exit_code,
            }),
        }
    }
}

impl WorkerBackend for ProcessWorker {
    fn run_job(&self, job: TestFileJob, events: WorkerEvents) -> JobFuture {
        // Clone so the future owns everything it needs.
        let worker = self.clone();
        Box::pin(async move { worker.run(job, events).await })
    }
}

/// Read one line, replacing invalid UTF-8 instead of failing.
///
/// Test code may print arbitrary bytes; only protocol lines need to be
/// valid JSON. Returns `None` at end of stream.
async fn read_lossy_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}
