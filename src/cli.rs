// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `testpool`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "testpool",
    version,
    about = "Run test files in parallel workers and report their results.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// A missing file is only an error when the path was given explicitly.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Globs to match test files, e.g. `-m "**/*.spec.ts"`. Replaces `[files].match`.
    #[arg(short, long = "match", value_name = "GLOB", num_args = 1..)]
    pub match_patterns: Vec<String>,

    /// Globs to ignore when looking for test files. Replaces `[files].ignore`.
    #[arg(short, long = "ignore", value_name = "GLOB", num_args = 1..)]
    pub ignore_patterns: Vec<String>,

    /// Directory to search for test files.
    #[arg(long, value_name = "DIR")]
    pub target_dir: Option<String>,

    /// Maximum number of parallel workers.
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Program that compiles and runs a single test file.
    #[arg(long, value_name = "CMD")]
    pub worker: Option<String>,

    /// Print the discovered test files and exit without running them.
    #[arg(long)]
    pub list: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TESTPOOL_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
