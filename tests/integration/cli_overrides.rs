// tests/integration/cli_overrides.rs

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tempfile::NamedTempFile;
use testpool::cli::CliArgs;
use testpool::config::RawConfigFile;
use testpool::errors::RunnerError;
use testpool::{apply_cli_overrides, load_config};

#[test]
fn test_flags_override_config_values() {
    let args = CliArgs::try_parse_from([
        "testpool",
        "--worker",
        "deno",
        "-m",
        "**/*.spec.ts",
        "**/*.e2e.ts",
        "--workers",
        "3",
        "--target-dir",
        "packages/app",
    ])
    .unwrap();

    let mut raw = RawConfigFile::default();
    raw.worker.command = "node".to_string();
    raw.runner.max_workers = Some(8);
    apply_cli_overrides(&mut raw, &args);

    assert_eq!(raw.worker.command, "deno");
    assert_eq!(
        raw.files.match_patterns,
        vec!["**/*.spec.ts".to_string(), "**/*.e2e.ts".to_string()]
    );
    assert_eq!(raw.runner.max_workers, Some(3));
    assert_eq!(raw.runner.target_directory, PathBuf::from("packages/app"));
    // Not given on the command line: file/default value stays.
    assert!(raw.files.ignore_patterns.contains(&"**/node_modules/**".to_string()));
}

#[test]
fn test_load_config_merges_file_and_flags() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[runner]
max_workers = 2

[worker]
command = "node"
args = ["worker.js"]
"#
    )
    .unwrap();
    let path = file.path().to_string_lossy().into_owned();

    let args =
        CliArgs::try_parse_from(["testpool", "--config", path.as_str(), "--ignore", "**/e2e/**"])
            .unwrap();
    let cfg = load_config(&args).expect("valid config");

    assert_eq!(cfg.max_workers(), 2);
    assert_eq!(cfg.worker.command, "node");
    assert_eq!(cfg.files.ignore_patterns, vec!["**/e2e/**".to_string()]);
}

#[test]
fn test_explicit_missing_config_is_an_error() {
    let args =
        CliArgs::try_parse_from(["testpool", "--config", "/definitely/not/here.toml"]).unwrap();
    assert!(matches!(load_config(&args), Err(RunnerError::IoError(_))));
}

#[test]
fn test_invalid_worker_count_flag_is_rejected() {
    let args = CliArgs::try_parse_from(["testpool", "--config", "x.toml", "--workers", "many"]);
    assert!(args.is_err());
}
