// src/config/validate.rs

use std::time::Duration;

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, RunnerError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RunnerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        let job_timeout = match raw.runner.job_timeout.as_deref() {
            Some(s) => Some(parse_duration(s).map_err(RunnerError::ConfigError)?),
            None => None,
        };
        Ok(ConfigFile::new_unchecked(raw, job_timeout))
    }
}

/// Run every semantic check on a raw config.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_worker(cfg)?;
    validate_runner(cfg)?;
    validate_patterns(cfg)?;
    Ok(())
}

fn validate_worker(cfg: &RawConfigFile) -> Result<()> {
    if cfg.worker.command.trim().is_empty() {
        return Err(RunnerError::ConfigError(
            "[worker].command must name the program that runs a test file".to_string(),
        ));
    }
    Ok(())
}

fn validate_runner(cfg: &RawConfigFile) -> Result<()> {
    if cfg.runner.max_workers == Some(0) {
        return Err(RunnerError::ConfigError(
            "[runner].max_workers must be >= 1 (got 0)".to_string(),
        ));
    }

    if let Some(ref s) = cfg.runner.job_timeout {
        parse_duration(s)
            .map_err(|e| RunnerError::ConfigError(format!("[runner].job_timeout: {e}")))?;
    }

    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    if cfg.files.match_patterns.is_empty() {
        return Err(RunnerError::ConfigError(
            "[files].match must contain at least one glob".to_string(),
        ));
    }

    let all = cfg
        .files
        .match_patterns
        .iter()
        .chain(cfg.files.ignore_patterns.iter());
    for pattern in all {
        Glob::new(pattern).map_err(|e| {
            RunnerError::ConfigError(format!("invalid glob pattern '{pattern}': {e}"))
        })?;
    }

    Ok(())
}

/// Parse a duration like `"500ms"`, `"30s"`, `"2m"` or `"1h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
