// tests/integration/error_handling.rs

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use testpool::config::load_and_validate;
use testpool::errors::RunnerError;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_full_config_is_parsed() {
    let file = config_file(
        r#"
[runner]
target_directory = "packages/app"
max_workers = 4
job_timeout = "30s"
watch = true

[files]
match = ["**/*.spec.ts"]
ignore = ["**/fixtures/**"]

[worker]
command = "node"
args = ["worker.js", "--quiet"]
"#,
    );

    let cfg = load_and_validate(file.path()).expect("valid config");
    assert_eq!(cfg.runner.target_directory.to_str(), Some("packages/app"));
    assert_eq!(cfg.max_workers(), 4);
    assert_eq!(cfg.job_timeout(), Some(Duration::from_secs(30)));
    assert!(cfg.runner.watch);
    assert_eq!(cfg.files.match_patterns, vec!["**/*.spec.ts".to_string()]);
    assert_eq!(cfg.files.ignore_patterns, vec!["**/fixtures/**".to_string()]);
    assert_eq!(cfg.worker.command, "node");
    assert_eq!(cfg.worker.args, vec!["worker.js".to_string(), "--quiet".to_string()]);
}

#[test]
fn test_defaults_apply_to_missing_sections() {
    let file = config_file(
        r#"
[worker]
command = "node"
"#,
    );

    let cfg = load_and_validate(file.path()).expect("valid config");
    assert_eq!(cfg.runner.target_directory.to_str(), Some("."));
    assert!(cfg.max_workers() >= 1);
    assert_eq!(cfg.job_timeout(), None);
    assert!(cfg.files.match_patterns.contains(&"**/*.test.*".to_string()));
    assert!(cfg.files.ignore_patterns.contains(&"**/node_modules/**".to_string()));
}

#[test]
fn test_missing_worker_command_returns_config_error() {
    let file = config_file(
        r#"
[runner]
max_workers = 2
"#,
    );

    match load_and_validate(file.path()) {
        Err(RunnerError::ConfigError(msg)) => assert!(msg.contains("[worker].command")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_zero_workers_returns_config_error() {
    let file = config_file(
        r#"
[runner]
max_workers = 0

[worker]
command = "node"
"#,
    );

    match load_and_validate(file.path()) {
        Err(RunnerError::ConfigError(msg)) => assert!(msg.contains("max_workers")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_invalid_glob_returns_config_error() {
    let file = config_file(
        r#"
[files]
match = ["src/[unclosed"]

[worker]
command = "node"
"#,
    );

    match load_and_validate(file.path()) {
        Err(RunnerError::ConfigError(msg)) => assert!(msg.contains("invalid glob pattern")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_empty_match_list_returns_config_error() {
    let file = config_file(
        r#"
[files]
match = []

[worker]
command = "node"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(RunnerError::ConfigError(_))
    ));
}

#[test]
fn test_bad_job_timeout_returns_config_error() {
    let file = config_file(
        r#"
[runner]
job_timeout = "10 fortnights"

[worker]
command = "node"
"#,
    );

    match load_and_validate(file.path()) {
        Err(RunnerError::ConfigError(msg)) => assert!(msg.contains("job_timeout")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_malformed_toml_returns_toml_error() {
    let file = config_file("[runner\nmax_workers = ");

    assert!(matches!(
        load_and_validate(file.path()),
        Err(RunnerError::TomlError(_))
    ));
}

#[test]
fn test_missing_file_returns_io_error() {
    let result = load_and_validate("/definitely/not/here/Testpool.toml");
    assert!(matches!(result, Err(RunnerError::IoError(_))));
}
