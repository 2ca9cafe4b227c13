// src/config/defaults.rs

//! Built-in task catalogue.
//!
//! A user `Taskgate.toml` is merged over this document (see
//! [`crate::config::merge`]), so a project only has to spell out what it
//! changes: e.g. `[task.lint] files = ["src/**/*.js"]` replaces the lint
//! pattern set and keeps every other field of the task.

/// Default configuration, in the same TOML schema as `Taskgate.toml`.
pub const DEFAULT_CONFIG: &str = r#"
[config]
bell = true
report_stream_size = false
ignore_dirs = [".git", "node_modules", "coverage", "plato"]

[coverage]
report_dir = "coverage"
summary_file = "coverage/coverage-summary.json"

[coverage.thresholds]
statements = 80
branches = 70
lines = 80
functions = 80

[task.lessTest]
description = "Check that the LESS stylesheets compile"
category = "style"
mode = "per-file"
fail_fast = true
cmd = "lessc --lint {file}"
files = ["less/**/*.less", "!less/**/_*.less"]

[task.lint]
description = "Lint the server-side JavaScript"
category = "server-lint"
mode = "per-file"
cmd = "eslint --no-eslintrc -c {config} {file}"
config_file = ".eslintrc-server.json"
count_pattern = '(\d+) problems?'
files = ["*.js", "lib/**/*.js", "routes/**/*.js"]

[task.lint-watch]
description = "Lint the server-side JavaScript on every change"
watch = ["*.js", "lib/**/*.js", "routes/**/*.js"]
target = "lint"

[task.felint]
description = "Lint the client-side JavaScript"
category = "client-lint"
mode = "per-file"
cmd = "eslint --no-eslintrc -c {config} {file}"
config_file = ".eslintrc-client.json"
count_pattern = '(\d+) problems?'
files = ["public/js/**/*.js", "!public/js/vendor/**"]

[task.felint-watch]
description = "Lint the client-side JavaScript on every change"
watch = ["public/js/**/*.js", "!public/js/vendor/**"]
target = "felint"

[task.test]
description = "Run the unit tests"
category = "test"
cmd = "mocha --reporter spec {files}"
files = ["test/**/*.js"]

[task.test-watch]
description = "Run the unit tests on every change"
watch = ["lib/**/*.js", "routes/**/*.js", "test/**/*.js"]
target = "test"

[task.test-cover]
description = "Run the unit tests under coverage and enforce the thresholds"
category = "coverage"
mode = "coverage"
cmd = "nyc --reporter=json-summary --reporter=html --report-dir {report_dir} mocha --reporter dot {files}"
files = ["test/**/*.js"]

[task.test-cover-watch]
description = "Run the coverage check on every change"
watch = ["lib/**/*.js", "routes/**/*.js", "test/**/*.js"]
target = "test-cover"

[task.plato]
description = "Generate the complexity report and open it"
mode = "report"
cmd = "plato -r -d {report_dir} -l {config} {files}"
config_file = ".jshintrc"
report_dir = "plato"
open_report = true
files = ["*.js", "lib/**/*.js", "routes/**/*.js"]

[task.ci]
description = "Style check, server lint, client lint and coverage; fails the build on any error"
after = ["lessTest", "lint", "felint", "test-cover"]

[task.ci-watch]
description = "Watch-safe variant of ci"
hidden = true
after = ["lessTest", "lint", "felint", "test-cover"]

[task.watch-all]
description = "Run the lint and test watchers together"
after = ["lint-watch", "felint-watch", "test-watch"]

[task.watch]
description = "Run the full ci check on every change"
watch = [
    "*.js",
    "lib/**/*.js",
    "routes/**/*.js",
    "public/js/**/*.js",
    "!public/js/vendor/**",
    "less/**/*.less",
    "test/**/*.js",
]
target = "ci-watch"
"#;
