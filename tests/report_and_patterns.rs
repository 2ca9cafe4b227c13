// tests/report_and_patterns.rs

use std::path::{Path, PathBuf};

use taskgate::pipeline::command::{expand, shell_quote, Placeholders};
use taskgate::pipeline::report::strip_comments;
use taskgate::watch::{collect_matching_files, PatternSet};
use taskgate_test_utils::{mock_project, PROJECT_ROOT};

#[test]
fn strip_comments_removes_line_and_block_comments() {
    let input = r#"{
  // enforce strict mode
  "strict": true, /* inline */ "undef": true,
  /* multi
     line */
  "url": "http://example.com/*not a comment*/"
}"#;

    let stripped = strip_comments(input);
    let value: serde_json::Value = serde_json::from_str(&stripped).unwrap();

    assert_eq!(value["strict"], true);
    assert_eq!(value["undef"], true);
    assert_eq!(value["url"], "http://example.com/*not a comment*/");
    // Line structure is preserved.
    assert_eq!(stripped.lines().count(), input.lines().count());
}

#[test]
fn strip_comments_keeps_escaped_quotes() {
    let input = r#"{ "msg": "say \"hi\" // not a comment" } // trailing"#;
    let stripped = strip_comments(input);
    let value: serde_json::Value = serde_json::from_str(&stripped).unwrap();
    assert_eq!(value["msg"], "say \"hi\" // not a comment");
}

#[test]
fn patterns_support_exclusions() {
    let set = PatternSet::new(&[
        "public/js/**/*.js".to_string(),
        "!public/js/vendor/**".to_string(),
    ])
    .unwrap();

    assert!(set.matches("public/js/app.js"));
    assert!(set.matches("public/js/ui/menu.js"));
    assert!(!set.matches("public/js/vendor/jquery.js"));
    assert!(!set.matches("lib/a.js"));
}

#[test]
fn single_star_does_not_cross_directories() {
    let set = PatternSet::new(&["*.js".to_string()]).unwrap();
    assert!(set.matches("app.js"));
    assert!(!set.matches("lib/a.js"));
}

#[test]
fn invalid_glob_is_an_error() {
    assert!(PatternSet::new(&["lib/[".to_string()]).is_err());
}

#[test]
fn collecting_files_skips_ignored_dirs_and_sorts() {
    let fs = mock_project(&[
        ("lib/b.js", ""),
        ("lib/a.js", ""),
        ("lib/sub/c.js", ""),
        ("lib/readme.md", ""),
        ("node_modules/dep/index.js", ""),
        ("lib/node_modules/x.js", ""),
    ]);
    let set = PatternSet::new(&["**/*.js".to_string()]).unwrap();

    let files = collect_matching_files(
        fs.as_ref(),
        Path::new(PROJECT_ROOT),
        &set,
        &["node_modules".to_string()],
    )
    .unwrap();

    let expected: Vec<PathBuf> = ["lib/a.js", "lib/b.js", "lib/sub/c.js"]
        .iter()
        .map(|rel| Path::new(PROJECT_ROOT).join(rel))
        .collect();
    assert_eq!(files, expected);
}

#[test]
fn placeholders_are_quoted() {
    let files = vec![PathBuf::from("lib/a.js"), PathBuf::from("lib/my file.js")];
    let line = expand(
        "eslint -c {config} {files}",
        &Placeholders {
            file: None,
            files: &files,
            config: Some(Path::new(".eslintrc.json")),
            report_dir: None,
        },
    );

    assert_eq!(line, format!("eslint -c .eslintrc.json lib/a.js {}", shell_quote("lib/my file.js")));
    assert_eq!(expand("plato -d {report_dir}", &Placeholders::default()), "plato -d ");
}

#[test]
fn substituted_values_are_not_expanded_again() {
    let files = vec![PathBuf::from("lib/{config}.js")];
    let line = expand(
        "jshint -c {config} {files}",
        &Placeholders {
            file: None,
            files: &files,
            config: Some(Path::new(".jshintrc")),
            report_dir: None,
        },
    );

    assert_eq!(line, format!("jshint -c .jshintrc {}", shell_quote("lib/{config}.js")));
}
