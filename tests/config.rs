// tests/config.rs

use std::io::Write;

use tempfile::NamedTempFile;
use taskgate::config::merge::merge_tables;
use taskgate::config::{load_and_validate, load_defaults, load_from_str, ConfigFile, TaskKind};
use taskgate::errors::TaskgateError;
use taskgate::types::{Category, ToolMode};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn expect_config_error(contents: &str) -> String {
    let file = write_config(contents);
    match load_and_validate(file.path()) {
        Err(TaskgateError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn defaults_are_valid() {
    let cfg = load_defaults().unwrap();

    assert!(cfg.settings().bell);
    assert_eq!(cfg.coverage().thresholds.branches, 70.0);
    assert_eq!(cfg.coverage().thresholds.statements, 80.0);

    let lint = &cfg.tasks()["lint"];
    assert_eq!(lint.kind(), TaskKind::Pipeline);
    assert_eq!(lint.category, Some(Category::ServerLint));
    assert_eq!(lint.mode, ToolMode::PerFile);

    assert_eq!(cfg.tasks()["ci"].kind(), TaskKind::Combo);
    assert_eq!(cfg.tasks()["watch"].kind(), TaskKind::Watch);
    assert_eq!(cfg.tasks()["plato"].mode, ToolMode::Report);
}

#[test]
fn user_file_overrides_fields_and_replaces_arrays() {
    let file = write_config(
        r#"
[config]
bell = false

[coverage.thresholds]
branches = 50

[task.lint]
files = ["src/**/*.js"]
"#,
    );
    let cfg = load_and_validate(file.path()).unwrap();

    assert!(!cfg.settings().bell);
    assert_eq!(cfg.coverage().thresholds.branches, 50.0);
    // Siblings of an overridden key survive.
    assert_eq!(cfg.coverage().thresholds.lines, 80.0);

    let lint = &cfg.tasks()["lint"];
    assert_eq!(lint.files, vec!["src/**/*.js"]);
    assert_eq!(lint.category, Some(Category::ServerLint));
    assert_eq!(lint.mode, ToolMode::PerFile);
}

#[test]
fn user_file_can_add_tasks() {
    let raw = load_from_str(
        r#"
[task.typecheck]
category = "test"
cmd = "tsc --noEmit"

[task.ci]
after = ["lessTest", "lint", "felint", "test-cover", "typecheck"]
"#,
    )
    .unwrap();
    let cfg = ConfigFile::try_from(raw).unwrap();

    assert_eq!(cfg.tasks()["typecheck"].mode, ToolMode::Batch);
    assert_eq!(cfg.tasks()["ci"].after.len(), 5);
}

#[test]
fn merge_recurses_into_tables_only() {
    let mut base: toml::Table = toml::from_str(
        r#"
list = [1, 2]
[nested]
a = 1
b = [1]
"#,
    )
    .unwrap();
    let overlay: toml::Table = toml::from_str(
        r#"
list = [3]
[nested]
b = [2, 3]
c = true
"#,
    )
    .unwrap();

    merge_tables(&mut base, overlay);

    let expected: toml::Table = toml::from_str(
        r#"
list = [3]
[nested]
a = 1
b = [2, 3]
c = true
"#,
    )
    .unwrap();
    assert_eq!(base, expected);
}

#[test]
fn unknown_dependency_is_rejected() {
    let msg = expect_config_error(
        r#"
[task.ci]
after = ["lint", "typo"]
"#,
    );
    assert!(msg.contains("unknown dependency"));
    assert!(msg.contains("typo"));
}

#[test]
fn self_dependency_is_rejected() {
    let msg = expect_config_error(
        r#"
[task.loop]
after = ["loop"]
"#,
    );
    assert!(msg.contains("itself"));
}

#[test]
fn cycles_are_rejected() {
    let file = write_config(
        r#"
[task.a]
after = ["b"]

[task.b]
after = ["a"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(TaskgateError::CyclicDependency(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("'a'") || msg.contains("'b'"));
        }
        Err(e) => panic!("Expected CyclicDependency, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn watch_task_needs_a_known_target() {
    let msg = expect_config_error(
        r#"
[task.w]
watch = ["lib/**"]
target = "nowhere"
"#,
    );
    assert!(msg.contains("unknown `target`"));

    let msg = expect_config_error(
        r#"
[task.w]
watch = ["lib/**"]
target = "watch"
"#,
    );
    assert!(msg.contains("cannot target another watch task"));
}

#[test]
fn per_file_task_needs_a_category() {
    let msg = expect_config_error(
        r#"
[task.fmt]
mode = "per-file"
cmd = "prettier --check {file}"
"#,
    );
    assert!(msg.contains("fmt"));
    assert!(msg.contains("category"));
}

#[test]
fn count_pattern_needs_a_group() {
    let msg = expect_config_error(
        r#"
[task.lint]
count_pattern = 'problems'
"#,
    );
    assert!(msg.contains("count_pattern"));
}

#[test]
fn unit_pattern_needs_a_file_group() {
    let msg = expect_config_error(
        r#"
[task.test]
unit_pattern = '^(\S+): error'
"#,
    );
    assert!(msg.contains("`file`"));
}

#[test]
fn thresholds_must_be_percentages() {
    let msg = expect_config_error(
        r#"
[coverage.thresholds]
lines = 120
"#,
    );
    assert!(msg.contains("lines"));
}

#[test]
fn unknown_fields_are_rejected() {
    let file = write_config(
        r#"
[task.lint]
comand = "eslint"
"#,
    );
    assert!(matches!(
        load_and_validate(file.path()),
        Err(TaskgateError::TomlError(_))
    ));
}

#[test]
fn unknown_category_is_rejected() {
    let file = write_config(
        r#"
[task.lint]
category = "security"
"#,
    );
    assert!(matches!(
        load_and_validate(file.path()),
        Err(TaskgateError::TomlError(_))
    ));
}
