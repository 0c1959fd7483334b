// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod event;
pub mod fs;
pub mod index;
pub mod logging;
pub mod pool;
pub mod report;
pub mod types;

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, RawConfigFile, default_config_path, load_from_path};
use crate::engine::{Orchestrator, RunSummary};
use crate::errors::{Result, RunnerError};
use crate::report::ConsoleReporter;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (+ CLI overrides)
/// - file discovery
/// - the orchestrator and its worker pool
/// - the console reporter
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<RunSummary> {
    let cfg = load_config(&args)?;
    let orchestrator = Orchestrator::from_config(&cfg)?;

    if args.list {
        print_file_list(&orchestrator);
        orchestrator.close().await;
        return Ok(RunSummary::new());
    }

    let reporter = ConsoleReporter::new();
    orchestrator.on_event(move |event| reporter.report(event));

    // If we cannot listen for Ctrl-C, just never fire.
    let interrupted = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    let outcome = tokio::select! {
        summary = orchestrator.run_all() => summary,
        _ = interrupted => {
            warn!("interrupted; stopping workers");
            Err(RunnerError::Closed)
        }
    };

    orchestrator.close().await;

    let summary = outcome?;
    reporter.summarize(&summary);
    Ok(summary)
}

/// Load the config file (if any) and apply CLI overrides.
///
/// Without `--config`, a missing `Testpool.toml` falls back to defaults so
/// that `testpool --worker <cmd>` works without a file.
pub fn load_config(args: &CliArgs) -> Result<ConfigFile> {
    let mut raw = match &args.config {
        Some(path) => load_from_path(path)?,
        None => {
            let path = default_config_path();
            if path.exists() {
                load_from_path(&path)?
            } else {
                debug!(?path, "no config file found; using defaults");
                RawConfigFile::default()
            }
        }
    };

    apply_cli_overrides(&mut raw, args);
    ConfigFile::try_from(raw)
}

/// Merge command-line flags over values read from the config file.
pub fn apply_cli_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if !args.match_patterns.is_empty() {
        raw.files.match_patterns = args.match_patterns.clone();
    }
    if !args.ignore_patterns.is_empty() {
        raw.files.ignore_patterns = args.ignore_patterns.clone();
    }
    if let Some(ref dir) = args.target_dir {
        raw.runner.target_directory = PathBuf::from(dir);
    }
    if let Some(workers) = args.workers {
        raw.runner.max_workers = Some(workers);
    }
    if let Some(ref worker) = args.worker {
        raw.worker.command = worker.clone();
    }
}

fn print_file_list(orchestrator: &Orchestrator) {
    let files = orchestrator.index().files();
    println!("testpool: {} test files", files.len());
    for file in files.iter() {
        println!("  - {}", file.relative);
    }
    info!(target_dir = ?orchestrator.target_dir(), "listed test files (no execution)");
}
