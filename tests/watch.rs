// tests/watch.rs

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use taskgate::aggregate::CategoryVerdict;
use taskgate::config::ConfigFile;
use taskgate::types::{Category, RunMode, ToolMode};
use taskgate::watch::{PatternSet, WatchTrigger};
use taskgate_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use taskgate_test_utils::fake_tool::{passing, units, FakeToolBackend, ManualChangeSource};
use taskgate_test_utils::{init_tracing, mock_project, test_orchestrator, with_timeout, PROJECT_ROOT};
use tokio::sync::{mpsc, watch};

fn watch_config() -> ConfigFile {
    ConfigFileBuilder::new()
        .without_bell()
        .with_task(
            "lessTest",
            TaskConfigBuilder::pipeline(Category::Style, ToolMode::PerFile, "lessc {file}")
                .files(&["less/**/*.less"])
                .build(),
        )
        .with_task(
            "lint",
            TaskConfigBuilder::pipeline(Category::ServerLint, ToolMode::PerFile, "eslint {file}")
                .files(&["lib/**/*.js"])
                .build(),
        )
        .with_task(
            "ci-watch",
            TaskConfigBuilder::combo(&["lessTest", "lint"]).hidden().build(),
        )
        .with_task(
            "watch",
            TaskConfigBuilder::watch(&["lib/**/*.js", "less/**/*.less"], "ci-watch").build(),
        )
        .build()
}

fn changed(rel: &str) -> PathBuf {
    Path::new(PROJECT_ROOT).join(rel)
}

#[tokio::test]
async fn every_change_reruns_the_target_with_a_fresh_state() {
    init_tracing();
    let fs = mock_project(&[("lib/a.js", "a"), ("less/main.less", "body {}")]);
    let backend = Arc::new(FakeToolBackend::new());
    // Run 1: lint fails. Run 2: everything passes. Run 3: style fails.
    backend.push_script("lint", units(Category::ServerLint, &[("lib/a.js", 2)]));
    backend.push_script("lint", passing(Category::ServerLint, &["lib/a.js"]));
    backend.push_script("lessTest", passing(Category::Style, &["less/main.less"]));
    backend.push_script("lessTest", passing(Category::Style, &["less/main.less"]));
    backend.push_script("lessTest", units(Category::Style, &[("less/main.less", 1)]));

    let (source, changes) = ManualChangeSource::new();
    let (outcome_tx, mut outcomes) = mpsc::unbounded_channel();
    let orchestrator = test_orchestrator(&watch_config(), Arc::clone(&backend), fs)
        .change_source(Arc::new(source))
        .watch_outcomes(outcome_tx)
        .build();

    let watcher = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.invoke("watch", RunMode::Normal).await })
    };

    changes.send(changed("lib/a.js")).unwrap();
    let first = with_timeout(outcomes.recv()).await.unwrap();
    assert_eq!(first.mode, RunMode::Watch);
    assert!(first.failed());
    assert_eq!(first.state.error_count(Category::ServerLint), 2);

    changes.send(changed("lib/a.js")).unwrap();
    let second = with_timeout(outcomes.recv()).await.unwrap();
    assert!(!second.failed());
    assert_eq!(second.state.total_errors(), 0);

    changes.send(changed("less/main.less")).unwrap();
    let third = with_timeout(outcomes.recv()).await.unwrap();
    assert!(third.failed());
    assert_eq!(third.state.error_count(Category::Style), 1);
    assert_eq!(third.state.error_count(Category::ServerLint), 0);
    assert_eq!(third.verdict("lint"), Some(&CategoryVerdict::Passed));

    // Closing the change stream ends the watch task; the watcher itself
    // never fails the process.
    drop(changes);
    let outcome = with_timeout(watcher).await.unwrap().unwrap();
    assert!(!outcome.failed());
}

#[tokio::test]
async fn shutdown_stops_the_watch_task() {
    init_tracing();
    let fs = mock_project(&[("lib/a.js", "a")]);
    let backend = Arc::new(FakeToolBackend::new());
    let (source, _changes) = ManualChangeSource::new();
    let orchestrator = test_orchestrator(&watch_config(), backend, fs)
        .change_source(Arc::new(source))
        .build();

    let watcher = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.invoke("watch", RunMode::Normal).await })
    };
    tokio::task::yield_now().await;
    orchestrator.shutdown();

    let outcome = with_timeout(watcher).await.unwrap().unwrap();
    assert!(!outcome.failed());
}

fn trigger(patterns: &[&str], use_hash: bool, fs: Arc<taskgate::fs::mock::MockFileSystem>) -> WatchTrigger {
    let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
    WatchTrigger::new(
        "watch",
        "ci-watch",
        PROJECT_ROOT,
        PatternSet::new(&patterns).unwrap(),
        fs,
        use_hash,
    )
}

#[tokio::test]
async fn unrelated_changes_do_not_trigger() {
    init_tracing();
    let fs = mock_project(&[("lib/a.js", "a")]);
    let mut trigger = trigger(&["lib/**/*.js", "!lib/vendor/**"], false, fs);

    assert!(trigger.accepts(&changed("lib/a.js")));
    assert!(!trigger.accepts(&changed("README.md")));
    assert!(!trigger.accepts(&changed("lib/vendor/x.js")));
    assert!(!trigger.accepts(Path::new("/elsewhere/lib/a.js")));
}

#[tokio::test]
async fn identical_content_does_not_retrigger_with_use_hash() {
    init_tracing();
    let fs = mock_project(&[("lib/a.js", "a")]);
    let mut trigger = trigger(&["lib/**/*.js"], true, Arc::clone(&fs));

    assert!(trigger.accepts(&changed("lib/a.js")));
    assert!(!trigger.accepts(&changed("lib/a.js")));

    fs.add_file(changed("lib/a.js"), "a2");
    assert!(trigger.accepts(&changed("lib/a.js")));
}

#[tokio::test]
async fn changes_during_a_run_coalesce_into_one_rerun() {
    init_tracing();
    let fs = mock_project(&[("lib/a.js", "a"), ("lib/b.js", "b")]);
    let trigger = trigger(&["lib/**/*.js"], false, fs);

    let (tx, rx) = mpsc::unbounded_channel();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let runs = Arc::new(AtomicUsize::new(0));

    // Three changes are waiting before the loop starts: the first triggers a
    // run, the other two queue up behind it and collapse into one rerun.
    for rel in ["lib/a.js", "lib/b.js", "lib/a.js"] {
        tx.send(changed(rel)).unwrap();
    }
    drop(tx);

    let counter = Arc::clone(&runs);
    let total = with_timeout(trigger.run(rx, shutdown_rx, move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }))
    .await;

    assert_eq!(total, 2);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn trigger_stops_when_shutdown_is_signalled() {
    init_tracing();
    let fs = mock_project(&[("lib/a.js", "a")]);
    let trigger = trigger(&["lib/**/*.js"], false, fs);

    let (_tx, rx) = mpsc::unbounded_channel::<PathBuf>();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(trigger.run(rx, shutdown_rx, || async {}));
    shutdown_tx.send(true).unwrap();

    assert_eq!(with_timeout(handle).await.unwrap(), 0);
}

#[tokio::test]
async fn deletions_trigger_under_a_non_canonical_root() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("lib")).unwrap();
    let file = dir.path().join("lib/a.js");
    std::fs::write(&file, "a").unwrap();

    // The watcher reports canonical paths; the configured root is not.
    let root = dir.path().join("lib").join("..");
    let reported = dir.path().canonicalize().unwrap().join("lib/a.js");
    let mut trigger = WatchTrigger::new(
        "watch",
        "ci-watch",
        root,
        PatternSet::new(&["lib/**/*.js".to_string()]).unwrap(),
        Arc::new(taskgate::fs::RealFileSystem),
        false,
    );

    assert!(trigger.accepts(&reported));
    std::fs::remove_file(&file).unwrap();
    assert!(trigger.accepts(&reported));
    assert!(!trigger.accepts(&dir.path().canonicalize().unwrap().join("README.md")));
}
