// tests/orchestrator_run.rs

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use testpool_test_utils::builders::{
    build_completed, build_failed, suite, suite_completed, suite_start, test_error,
    test_success, test_success_titled,
};
use testpool_test_utils::fake_worker::{Outcome, Script, ScriptedWorker};
use testpool_test_utils::{EventRecorder, init_tracing, with_timeout};

use testpool::engine::Orchestrator;
use testpool::errors::RunnerError;
use testpool::event::{EventKind, RunnerEvent};
use testpool::index::{FileIndex, FilePatterns};
use testpool::pool::PoolOptions;

type TestResult = Result<(), Box<dyn Error>>;

const ROOT: &str = "/work/project";

fn orchestrator(worker: &ScriptedWorker, files: &[&str], max_workers: usize) -> Orchestrator {
    let patterns = FilePatterns::new(&["**/*.test.*".to_string()], &[]).unwrap();
    let index = FileIndex::empty(ROOT, patterns);
    for file in files {
        index.insert_path(&Path::new(ROOT).join(file));
    }

    let options = PoolOptions {
        max_workers,
        job_timeout: None,
    };
    Orchestrator::new(index, Arc::new(worker.clone()), options)
}

/// `a.test.ts`: one suite, two passing tests.
fn passing_script() -> Script {
    Script::new().events([
        build_completed(Path::new(ROOT).join("a.test.ts"), 5),
        suite_start(suite("s1", "math", &[("t1", "adds"), ("t2", "subtracts")])),
        test_success("s1", "t1", 1),
        test_success("s1", "t2", 1),
        suite_completed("s1", 0, 3),
    ])
}

/// `b.test.ts`: one suite, one failing test. Reuses suite id `s1`.
fn failing_script() -> Script {
    Script::new().events([
        suite_start(suite("s1", "strings", &[("t1", "concats")])),
        test_error("s1", "t1", "expected 'ab'", 2),
        suite_completed("s1", 1, 2),
    ])
}

#[tokio::test]
async fn run_all_aggregates_passing_and_failing_files() -> TestResult {
    init_tracing();

    let worker = ScriptedWorker::new()
        .with_script("a.test.ts", passing_script())
        .with_script("b.test.ts", failing_script());
    let orch = orchestrator(&worker, &["a.test.ts", "b.test.ts"], 2);
    let recorder = EventRecorder::new();
    recorder.attach(&orch);

    let summary = with_timeout(orch.run_all()).await?;

    assert_eq!(summary.files.len(), 2);
    assert_eq!(summary.stats.suite_count, 2);
    assert_eq!(summary.stats.error_suite_count, 1);
    assert_eq!(summary.stats.test_count, 3);
    assert_eq!(summary.stats.error_test_count, 1);
    assert!(!summary.is_success());

    let errors = recorder.of_kind(EventKind::TestError);
    assert_eq!(errors.len(), 1);
    let ctx = errors[0].context.as_ref().expect("test events carry context");
    assert_eq!(errors[0].file, "b.test.ts");
    assert_eq!(ctx.suite_title, "strings");
    assert_eq!(ctx.test_title.as_deref(), Some("concats"));

    let successes = recorder.of_kind(EventKind::TestSuccess);
    assert_eq!(successes.len(), 2);
    let mut titles = Vec::new();
    for event in &successes {
        let ctx = event.context.as_ref().expect("test events carry context");
        assert_eq!(event.file, "a.test.ts");
        assert_eq!(ctx.suite_title, "math");
        titles.push(ctx.test_title.clone().unwrap_or_default());
    }
    assert_eq!(titles, vec!["adds".to_string(), "subtracts".to_string()]);

    Ok(())
}

#[tokio::test]
async fn reported_paths_are_relative_to_target_dir() -> TestResult {
    init_tracing();

    let worker = ScriptedWorker::new()
        .with_script("a.test.ts", passing_script())
        .with_script("b.test.ts", failing_script());
    let orch = orchestrator(&worker, &["a.test.ts", "nested/b.test.ts"], 2);
    let recorder = EventRecorder::new();
    recorder.attach(&orch);

    let summary = with_timeout(orch.run_all()).await?;
    assert_eq!(summary.files.len(), 2);

    for report in &summary.files {
        for suite in &report.result.suites {
            assert!(!suite.file_path.is_absolute(), "absolute path {:?}", suite.file_path);
            assert_eq!(suite.file_path, PathBuf::from(&report.path));
        }
    }

    let built = recorder.of_kind(EventKind::BuildCompleted);
    assert_eq!(built.len(), 1);
    match &built[0].event {
        RunnerEvent::BuildCompleted(p) => assert_eq!(p.test_file_path, PathBuf::from("a.test.ts")),
        other => panic!("unexpected event {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn build_failure_does_not_stop_other_files() -> TestResult {
    init_tracing();

    let broken = Script::new()
        .event(build_failed("SyntaxError: Unexpected token"))
        .outcome(Outcome::BuildFailure("SyntaxError: Unexpected token".to_string()));
    let worker = ScriptedWorker::new()
        .with_script("a.test.ts", broken)
        .with_script("b.test.ts", passing_script());
    let orch = orchestrator(&worker, &["a.test.ts", "b.test.ts"], 2);

    let summary = with_timeout(orch.run_all()).await?;

    let a = &summary.files[0];
    assert_eq!(a.path, "a.test.ts");
    assert!(a.result.suites.is_empty());
    let build_error = a.result.build_error.as_ref().expect("build error recorded");
    assert!(build_error.message.contains("SyntaxError"));

    let b = &summary.files[1];
    assert_eq!(b.path, "b.test.ts");
    assert!(b.is_success());
    assert_eq!(b.result.stats.suite_count, 1);
    assert_eq!(b.result.stats.test_count, 2);

    assert_eq!(summary.stats.error_suite_count, 0);
    assert_eq!(summary.failed_files().count(), 1);
    assert!(!summary.is_success());

    // Directly, a build failure is still a result, not an error.
    let direct = with_timeout(orch.run_file("a.test.ts")).await?;
    let direct = direct.expect("file is indexed");
    assert!(direct.build_error.is_some());

    Ok(())
}

#[tokio::test]
async fn concurrent_jobs_resolve_colliding_suite_ids_independently() -> TestResult {
    init_tracing();

    let script = |title: &str, test_title: &str| {
        Script::new().delay(Duration::from_millis(20)).events([
            suite_start(suite("shared", title, &[("t1", test_title), ("t2", test_title)])),
            test_success("shared", "t1", 1),
            test_success("shared", "t2", 1),
            suite_completed("shared", 0, 2),
        ])
    };
    let worker = ScriptedWorker::new()
        .with_script("left.test.ts", script("left suite", "left test"))
        .with_script("right.test.ts", script("right suite", "right test"));
    let orch = orchestrator(&worker, &["left.test.ts", "right.test.ts"], 2);
    let recorder = EventRecorder::new();
    recorder.attach(&orch);

    let summary = with_timeout(orch.run_all()).await?;
    assert!(summary.is_success());
    assert_eq!(worker.peak(), 2, "both jobs should have run at once");

    for (file, prefix) in [("left.test.ts", "left"), ("right.test.ts", "right")] {
        let events = recorder.for_file(file);
        assert_eq!(events.len(), 4);
        for event in events {
            let ctx = event.context.expect("suite events carry context");
            assert_eq!(ctx.suite_title, format!("{prefix} suite"));
            if let Some(test_title) = ctx.test_title {
                assert_eq!(test_title, format!("{prefix} test"));
            }
        }
    }

    Ok(())
}

#[tokio::test]
async fn events_of_one_job_arrive_in_emission_order() -> TestResult {
    init_tracing();

    let worker = ScriptedWorker::new().with_script("a.test.ts", passing_script());
    let orch = orchestrator(&worker, &["a.test.ts"], 1);
    let recorder = EventRecorder::new();
    recorder.attach(&orch);

    with_timeout(orch.run_file("a.test.ts")).await?;

    assert_eq!(
        recorder.kinds(),
        vec![
            EventKind::BuildCompleted,
            EventKind::SuiteStart,
            EventKind::TestSuccess,
            EventKind::TestSuccess,
            EventKind::SuiteCompleted,
        ]
    );
    let job_ids: Vec<_> = recorder.events().iter().map(|e| e.job_id).collect();
    assert!(job_ids.windows(2).all(|w| w[0] == w[1]));

    Ok(())
}

#[tokio::test]
async fn unknown_file_is_a_noop() -> TestResult {
    init_tracing();

    let worker = ScriptedWorker::new();
    let orch = orchestrator(&worker, &["a.test.ts"], 1);

    let result = with_timeout(orch.run_file("missing.test.ts")).await?;
    assert!(result.is_none());
    assert!(worker.started().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_event_before_suite_start_is_a_protocol_violation() -> TestResult {
    init_tracing();

    let script = Script::new().event(test_success("ghost", "t1", 1));
    let worker = ScriptedWorker::new().with_script("a.test.ts", script);
    let orch = orchestrator(&worker, &["a.test.ts"], 1);
    let recorder = EventRecorder::new();
    recorder.attach(&orch);

    let outcome = with_timeout(orch.run_file("a.test.ts")).await;
    match outcome {
        Err(RunnerError::ProtocolViolation { message, .. }) => {
            assert!(message.contains("before SUITE_START"), "message: {message}");
            assert!(message.contains("ghost"));
        }
        other => panic!("expected ProtocolViolation, got {other:?}"),
    }
    assert!(recorder.events().is_empty());

    // In a full run the violation fails that file only.
    let summary = with_timeout(orch.run_all()).await?;
    assert_eq!(summary.files.len(), 1);
    assert_eq!(summary.failed_files().count(), 1);

    Ok(())
}

#[tokio::test]
async fn tests_not_enumerated_up_front_need_a_title() -> TestResult {
    init_tracing();

    let titled = Script::new().events([
        suite_start(suite("s1", "lazy", &[])),
        test_success_titled("s1", "t1", "discovered later", 1),
        suite_completed("s1", 0, 1),
    ]);
    let untitled = Script::new().events([
        suite_start(suite("s1", "lazy", &[])),
        test_success("s1", "t1", 1),
    ]);
    let worker = ScriptedWorker::new()
        .with_script("titled.test.ts", titled)
        .with_script("untitled.test.ts", untitled);
    let orch = orchestrator(&worker, &["titled.test.ts", "untitled.test.ts"], 1);
    let recorder = EventRecorder::new();
    recorder.attach(&orch);

    with_timeout(orch.run_file("titled.test.ts")).await?;
    let success = recorder.of_kind(EventKind::TestSuccess);
    assert_eq!(success.len(), 1);
    let ctx = success[0].context.as_ref().expect("context");
    assert_eq!(ctx.test_title.as_deref(), Some("discovered later"));
    assert_eq!(ctx.test_count, 1);

    let outcome = with_timeout(orch.run_file("untitled.test.ts")).await;
    assert!(matches!(outcome, Err(RunnerError::ProtocolViolation { .. })));

    Ok(())
}

#[tokio::test]
async fn panicking_worker_fails_only_its_file() -> TestResult {
    init_tracing();

    let worker = ScriptedWorker::new()
        .with_script(
            "a.test.ts",
            Script::new().outcome(Outcome::Panic("worker blew up".to_string())),
        )
        .with_script("b.test.ts", passing_script());
    let orch = orchestrator(&worker, &["a.test.ts", "b.test.ts"], 2);

    let summary = with_timeout(orch.run_all()).await?;
    assert_eq!(summary.files.len(), 2);

    let a = &summary.files[0];
    let failure = a.failure.as_deref().expect("panic recorded as failure");
    assert!(failure.contains("worker blew up"), "failure: {failure}");
    assert!(summary.files[1].is_success());

    Ok(())
}

#[tokio::test]
async fn worker_without_result_is_recorded_as_failure() -> TestResult {
    init_tracing();

    let script = Script::new()
        .event(suite_start(suite("s1", "cut short", &[("t1", "never ends")])))
        .outcome(Outcome::NoCompletion);
    let worker = ScriptedWorker::new().with_script("a.test.ts", script);
    let orch = orchestrator(&worker, &["a.test.ts"], 1);

    let outcome = with_timeout(orch.run_file("a.test.ts")).await;
    assert!(matches!(outcome, Err(RunnerError::MissingCompletion { .. })));

    let summary = with_timeout(orch.run_all()).await?;
    assert_eq!(summary.files.len(), 1);
    assert!(!summary.is_success());

    Ok(())
}

#[tokio::test]
async fn late_observers_see_only_later_events() -> TestResult {
    init_tracing();

    let worker = ScriptedWorker::new().with_script("a.test.ts", passing_script());
    let orch = orchestrator(&worker, &["a.test.ts"], 1);

    let early = EventRecorder::new();
    early.attach(&orch);
    with_timeout(orch.run_file("a.test.ts")).await?;

    let late = EventRecorder::new();
    late.attach(&orch);
    let mut rx = orch.subscribe(64);
    with_timeout(orch.run_file("a.test.ts")).await?;

    assert_eq!(early.events().len(), 10);
    assert_eq!(late.events().len(), 5);

    let mut bridged = Vec::new();
    while let Ok(event) = rx.try_recv() {
        bridged.push(event.kind());
    }
    assert_eq!(bridged, late.kinds());

    Ok(())
}
