// src/config/mod.rs

//! Configuration loading and validation for testpool.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate worker, runner and pattern settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, FilesSection, RawConfigFile, RunnerSection, WorkerSection};
pub use validate::{parse_duration, validate_config};
