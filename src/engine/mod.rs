// src/engine/mod.rs

//! Orchestration engine for testpool.
//!
//! This module ties together:
//! - the file index (which test files exist)
//! - the worker pool (where they run)
//! - per-job event relays (what observers see)
//! - run-wide aggregation (what the CLI reports)
//!
//! The pure aggregation lives in [`summary`]; the async shell that owns the
//! pool is [`orchestrator::Orchestrator`].

pub mod orchestrator;
pub mod summary;

pub use orchestrator::Orchestrator;
pub use summary::{FileReport, RunSummary};
