// tests/run_state.rs

use proptest::prelude::*;
use taskgate::pipeline::{PipelineFailure, PipelineResult};
use taskgate::state::RunState;
use taskgate::types::Category;

#[test]
fn fresh_state_has_no_errors() {
    let state = RunState::new();

    for category in Category::ALL {
        assert_eq!(state.error_count(category), 0);
        assert!(!state.current_verdict(category));
    }
    assert!(!state.run_failed());
    assert!(state.failed_categories().is_empty());
}

#[test]
fn failing_units_add_their_counts() {
    let mut state = RunState::new();

    state.record_unit_result(&PipelineResult::failed(Category::ServerLint, "lib/a.js", 2));
    state.record_unit_result(&PipelineResult::passed(Category::ServerLint, "lib/b.js"));
    state.record_unit_result(&PipelineResult::failed(Category::ServerLint, "lib/c.js", 2));

    assert_eq!(state.error_count(Category::ServerLint), 4);
    assert!(state.current_verdict(Category::ServerLint));
    assert_eq!(state.error_count(Category::ClientLint), 0);
    // Counting alone does not fail the run; the aggregator decides that.
    assert!(!state.run_failed());
}

#[test]
fn passing_units_never_change_counts() {
    let mut state = RunState::new();
    for file in ["a", "b", "c"] {
        state.record_unit_result(&PipelineResult::passed(Category::Style, file));
    }
    assert_eq!(state, RunState::new());
}

#[test]
fn reset_clears_everything() {
    let mut state = RunState::new();
    state.record_unit_result(&PipelineResult::failed(Category::Test, "suite", 3));
    state.mark_failed();
    state.record_pipeline_failure(PipelineFailure {
        category: Some(Category::Style),
        message: "compiler crashed".to_string(),
    });

    state.reset();

    assert_eq!(state, RunState::new());
    assert!(state.pipeline_failures().is_empty());
}

#[test]
fn pipeline_failure_fails_the_run() {
    let mut state = RunState::new();
    state.record_pipeline_failure(PipelineFailure {
        category: None,
        message: "report generator missing".to_string(),
    });

    assert!(state.run_failed());
    assert_eq!(state.total_errors(), 0);
    assert_eq!(state.pipeline_failures().len(), 1);
}

#[test]
fn merge_sums_counts_and_ors_the_flag() {
    let mut lint = RunState::new();
    lint.record_unit_result(&PipelineResult::failed(Category::ServerLint, "a", 2));
    lint.mark_failed();

    let mut style = RunState::new();
    style.record_unit_result(&PipelineResult::failed(Category::Style, "main.less", 1));

    let mut more_lint = RunState::new();
    more_lint.record_unit_result(&PipelineResult::failed(Category::ServerLint, "b", 5));

    let mut total = RunState::new();
    total.merge(&lint);
    total.merge(&style);
    total.merge(&more_lint);

    assert_eq!(total.error_count(Category::ServerLint), 7);
    assert_eq!(total.error_count(Category::Style), 1);
    assert!(total.run_failed());
    assert_eq!(
        total.failed_categories(),
        vec![(Category::Style, 1), (Category::ServerLint, 7)]
    );
}

fn category_strategy() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

fn result_strategy() -> impl Strategy<Value = PipelineResult> {
    (category_strategy(), any::<bool>(), 1u64..50).prop_map(|(category, ok, count)| {
        if ok {
            PipelineResult::passed(category, "file")
        } else {
            PipelineResult::failed(category, "file", count)
        }
    })
}

proptest! {
    /// The count of a category equals the sum of its failing units' counts.
    #[test]
    fn counts_equal_sum_of_failing_units(results in prop::collection::vec(result_strategy(), 0..64)) {
        let mut state = RunState::new();
        for result in &results {
            state.record_unit_result(result);
        }

        for category in Category::ALL {
            let expected: u64 = results
                .iter()
                .filter(|r| !r.succeeded && r.category == category)
                .map(|r| r.count)
                .sum();
            prop_assert_eq!(state.error_count(category), expected);
            prop_assert_eq!(state.current_verdict(category), expected > 0);
        }
    }

    /// Counters never decrease within a run.
    #[test]
    fn counts_are_monotone(results in prop::collection::vec(result_strategy(), 1..64)) {
        let mut state = RunState::new();
        let mut previous = 0;
        for result in &results {
            state.record_unit_result(result);
            let total = state.total_errors();
            prop_assert!(total >= previous);
            previous = total;
        }
    }
}
