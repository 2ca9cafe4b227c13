// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{Category, ToolMode};

/// Configuration as deserialized from the merged TOML (built-in catalogue
/// plus user overrides), before semantic validation.
///
/// ```toml
/// [config]
/// bell = true
///
/// [coverage.thresholds]
/// branches = 70
///
/// [task.lint]
/// category = "server-lint"
/// mode = "per-file"
/// cmd = "eslint -c {config} {file}"
/// files = ["lib/**/*.js"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Coverage report location and thresholds from `[coverage]`.
    #[serde(default)]
    pub coverage: CoverageSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// A validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holding one means
/// task references resolve and the task graph is acyclic.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    coverage: CoverageSection,
    task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        coverage: CoverageSection,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self {
            config,
            coverage,
            task,
        }
    }

    pub fn settings(&self) -> &ConfigSection {
        &self.config
    }

    pub fn coverage(&self) -> &CoverageSection {
        &self.coverage
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Ring the terminal bell on every failing verdict.
    #[serde(default = "default_bell")]
    pub bell: bool,

    /// Print the number of files and bytes each pipeline processed.
    #[serde(default)]
    pub report_stream_size: bool,

    /// Directory names never descended into when resolving file patterns.
    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,
}

fn default_bell() -> bool {
    true
}

fn default_ignore_dirs() -> Vec<String> {
    vec![".git".to_string(), "node_modules".to_string()]
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            bell: default_bell(),
            report_stream_size: false,
            ignore_dirs: default_ignore_dirs(),
        }
    }
}

/// `[coverage]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoverageSection {
    /// Directory the instrumenter writes its reports to (`{report_dir}`).
    #[serde(default = "default_coverage_report_dir")]
    pub report_dir: String,

    /// JSON summary read back for threshold enforcement.
    #[serde(default = "default_summary_file")]
    pub summary_file: String,

    #[serde(default)]
    pub thresholds: CoverageThresholds,
}

fn default_coverage_report_dir() -> String {
    "coverage".to_string()
}

fn default_summary_file() -> String {
    "coverage/coverage-summary.json".to_string()
}

impl Default for CoverageSection {
    fn default() -> Self {
        Self {
            report_dir: default_coverage_report_dir(),
            summary_file: default_summary_file(),
            thresholds: CoverageThresholds::default(),
        }
    }
}

/// Minimum coverage percentages; `0` disables a metric.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct CoverageThresholds {
    #[serde(default)]
    pub statements: f64,
    #[serde(default)]
    pub branches: f64,
    #[serde(default)]
    pub lines: f64,
    #[serde(default)]
    pub functions: f64,
}

/// What a task does when invoked, derived from which fields are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Runs an external tool (`cmd`).
    Pipeline,
    /// Only waits for its `after` dependencies.
    Combo,
    /// Re-invokes `target` on every matching file change.
    Watch,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// One-line description shown by `--list`.
    #[serde(default)]
    pub description: String,

    /// Hidden tasks only exist to be dependencies of other tasks.
    #[serde(default)]
    pub hidden: bool,

    /// Dependency list: this task completes only after all of these did.
    #[serde(default)]
    pub after: Vec<String>,

    /// Failure domain the tool reports into. Report tasks have none.
    #[serde(default)]
    pub category: Option<Category>,

    /// Command template. Placeholders: `{file}`, `{files}`, `{config}`,
    /// `{report_dir}`.
    #[serde(default)]
    pub cmd: Option<String>,

    #[serde(default)]
    pub mode: ToolMode,

    /// File pattern set, relative to the project root. A leading `!`
    /// excludes.
    #[serde(default)]
    pub files: Vec<String>,

    /// Rule-configuration file handed to the tool as `{config}`.
    #[serde(default)]
    pub config_file: Option<String>,

    /// Regex whose first capture group is the number of violations a failing
    /// file contributed (`per-file` mode). Defaults to 1 per failing file.
    #[serde(default)]
    pub count_pattern: Option<String>,

    /// Regex matched against each output line in `batch` mode. The named
    /// group `file` attributes the line to a file; an optional `count` group
    /// gives the number of violations on that line.
    #[serde(default)]
    pub unit_pattern: Option<String>,

    /// In `per-file` mode, abort the pipeline on the first failing file.
    #[serde(default)]
    pub fail_fast: bool,

    /// Output directory of a report task (`{report_dir}`).
    #[serde(default)]
    pub report_dir: Option<String>,

    /// Open `<report_dir>/index.html` once the report is written.
    #[serde(default)]
    pub open_report: bool,

    /// Watch patterns; setting them makes this a watch task.
    #[serde(default)]
    pub watch: Option<Vec<String>>,

    /// Task re-invoked by a watch task on every change.
    #[serde(default)]
    pub target: Option<String>,

    /// Skip triggers for changes that leave the file content unchanged.
    #[serde(default)]
    pub use_hash: bool,
}

impl TaskConfig {
    pub fn kind(&self) -> TaskKind {
        if self.watch.is_some() || self.target.is_some() {
            TaskKind::Watch
        } else if self.cmd.is_some() {
            TaskKind::Pipeline
        } else {
            TaskKind::Combo
        }
    }
}
