use proptest::prelude::*;
use testpool::engine::{FileReport, RunSummary};
use testpool::types::{RunResult, RunStats, SuiteInfo, TestInfo};

/// One file: a list of suites, each given as (test count, failed tests).
fn file_strategy() -> impl Strategy<Value = Vec<(u32, u32)>> {
    proptest::collection::vec(
        (0u32..6).prop_flat_map(|tests| (Just(tests), 0..=tests)),
        0..4,
    )
}

fn run_result(file: usize, suites: &[(u32, u32)]) -> RunResult {
    let suites: Vec<SuiteInfo> = suites
        .iter()
        .enumerate()
        .map(|(i, &(tests, errors))| SuiteInfo {
            // Suite ids collide across files on purpose.
            id: format!("suite_{i}"),
            title: format!("file {file} suite {i}"),
            file_path: format!("file_{file}.test.ts").into(),
            tests: (0..tests)
                .map(|t| TestInfo {
                    id: format!("t{t}"),
                    title: format!("test {t}"),
                })
                .collect(),
            errors,
        })
        .collect();
    let stats = RunStats::from_suites(&suites);
    RunResult {
        suites,
        stats,
        build_error: None,
    }
}

proptest! {
    #[test]
    fn test_summary_sums_per_file_stats(
        files in proptest::collection::vec(file_strategy(), 0..8)
    ) {
        let results: Vec<RunResult> = files
            .iter()
            .enumerate()
            .map(|(i, suites)| run_result(i, suites))
            .collect();

        let summary = RunSummary::from_reports(results.iter().enumerate().map(|(i, r)| FileReport {
            path: format!("file_{i}.test.ts"),
            result: r.clone(),
            failure: None,
        }));

        // K files in, K reports out.
        prop_assert_eq!(summary.files.len(), files.len());

        let error_suites: u32 = results.iter().map(|r| r.stats.error_suite_count).sum();
        let suites: u32 = results.iter().map(|r| r.stats.suite_count).sum();
        let tests: u32 = results.iter().map(|r| r.stats.test_count).sum();
        let error_tests: u32 = results.iter().map(|r| r.stats.error_test_count).sum();
        prop_assert_eq!(summary.stats.error_suite_count, error_suites);
        prop_assert_eq!(summary.stats.suite_count, suites);
        prop_assert_eq!(summary.stats.test_count, tests);
        prop_assert_eq!(summary.stats.error_test_count, error_tests);

        let any_failed_test = files.iter().flatten().any(|&(_, errors)| errors > 0);
        prop_assert_eq!(summary.stats.error_suite_count == 0, !any_failed_test);
        prop_assert_eq!(summary.is_success(), !any_failed_test);
    }

    #[test]
    fn test_failed_files_never_pass(
        failing in proptest::collection::vec(any::<bool>(), 1..8)
    ) {
        let mut summary = RunSummary::new();
        for (i, failed) in failing.iter().enumerate() {
            let path = format!("file_{i}.test.ts");
            if *failed {
                summary.record_failure(path, "worker crashed");
            } else {
                summary.record(path, run_result(i, &[(2, 0)]));
            }
        }

        prop_assert_eq!(summary.files.len(), failing.len());
        prop_assert_eq!(summary.failed_files().count(), failing.iter().filter(|f| **f).count());
        prop_assert_eq!(summary.is_success(), !failing.iter().any(|f| *f));
        prop_assert_eq!(summary.stats.error_suite_count, 0);
    }
}
