// tests/aggregate.rs

use taskgate::aggregate::{aggregate, CategoryVerdict, Reporter};
use taskgate::pipeline::{Pipeline, PipelineEvent, PipelineResult};
use taskgate::state::RunState;
use taskgate::types::Category;
use taskgate_test_utils::fake_tool::{crashed, passing, units, Script};
use taskgate_test_utils::{init_tracing, with_timeout};

/// Feed `script` through a real channel and aggregate it.
async fn run_script(category: Option<Category>, script: Script, state: &mut RunState) -> CategoryVerdict {
    let (sink, mut pipeline) = Pipeline::channel(category);
    tokio::spawn(async move {
        for event in script {
            match event {
                PipelineEvent::Unit(r) => {
                    sink.unit(r).await;
                }
                PipelineEvent::End => return sink.end().await,
                PipelineEvent::Failed(f) => return sink.fail(f.message).await,
            }
        }
    });
    with_timeout(aggregate("lint", &mut pipeline, state, &Reporter::quiet())).await
}

#[tokio::test]
async fn three_files_four_violations_fail_the_category() {
    init_tracing();
    let mut state = RunState::new();

    let script = units(
        Category::ServerLint,
        &[("lib/a.js", 0), ("lib/b.js", 2), ("lib/c.js", 2)],
    );
    let verdict = run_script(Some(Category::ServerLint), script, &mut state).await;

    assert_eq!(verdict, CategoryVerdict::Failed { errors: 4 });
    assert_eq!(state.error_count(Category::ServerLint), 4);
    assert!(state.run_failed());
}

#[tokio::test]
async fn clean_files_pass() {
    init_tracing();
    let mut state = RunState::new();

    let script = passing(Category::ClientLint, &["public/js/app.js", "public/js/ui.js"]);
    let verdict = run_script(Some(Category::ClientLint), script, &mut state).await;

    assert_eq!(verdict, CategoryVerdict::Passed);
    assert!(!state.run_failed());
}

#[tokio::test]
async fn pipeline_failure_aborts_and_keeps_counts() {
    init_tracing();
    let mut state = RunState::new();

    let before = vec![PipelineEvent::Unit(PipelineResult::failed(
        Category::Style,
        "less/main.less",
        1,
    ))];
    let script = crashed(Some(Category::Style), before, "syntax error in less/vars.less");
    let verdict = run_script(Some(Category::Style), script, &mut state).await;

    assert_eq!(
        verdict,
        CategoryVerdict::Aborted {
            message: "syntax error in less/vars.less".to_string()
        }
    );
    assert!(state.run_failed());
    assert_eq!(state.error_count(Category::Style), 1);
    assert_eq!(state.pipeline_failures().len(), 1);
    assert_eq!(state.pipeline_failures()[0].message, "syntax error in less/vars.less");
}

#[tokio::test]
async fn category_less_pipeline_passes_on_end() {
    init_tracing();
    let mut state = RunState::new();

    let verdict = run_script(None, vec![PipelineEvent::End], &mut state).await;

    assert_eq!(verdict, CategoryVerdict::Passed);
    assert_eq!(state, RunState::new());
}

#[tokio::test]
async fn missing_end_signal_aborts() {
    init_tracing();
    let mut state = RunState::new();

    let script = vec![PipelineEvent::Unit(PipelineResult::passed(Category::Test, "suite"))];
    let verdict = run_script(Some(Category::Test), script, &mut state).await;

    assert!(matches!(verdict, CategoryVerdict::Aborted { .. }));
    assert!(state.run_failed());
}

#[tokio::test]
async fn counts_only_the_pipelines_own_category() {
    init_tracing();
    let mut state = RunState::new();
    state.record_unit_result(&PipelineResult::failed(Category::ServerLint, "lib/x.js", 9));

    let verdict = run_script(
        Some(Category::ClientLint),
        passing(Category::ClientLint, &["public/js/app.js"]),
        &mut state,
    )
    .await;

    assert_eq!(verdict, CategoryVerdict::Passed);
}
