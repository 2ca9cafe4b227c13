// src/pipeline/tool.rs

//! Compiled per-task tool settings and the request handed to a backend.

use std::path::PathBuf;

use regex::Regex;

use crate::config::model::{CoverageSection, TaskConfig};
use crate::errors::{Result, TaskgateError};
use crate::types::{Category, TaskName, ToolMode};

/// How to drive one external tool.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub cmd: String,
    pub mode: ToolMode,
    pub config_file: Option<String>,
    pub count_pattern: Option<Regex>,
    pub unit_pattern: Option<Regex>,
    pub fail_fast: bool,
    pub report_dir: Option<String>,
    pub open_report: bool,
    /// Present for `coverage` mode only.
    pub coverage: Option<CoverageSection>,
}

impl ToolSpec {
    /// A batch tool with no extra settings.
    pub fn batch(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            mode: ToolMode::Batch,
            config_file: None,
            count_pattern: None,
            unit_pattern: None,
            fail_fast: false,
            report_dir: None,
            open_report: false,
            coverage: None,
        }
    }

    pub fn from_config(name: &str, task: &TaskConfig, coverage: &CoverageSection) -> Result<Self> {
        let cmd = task.cmd.clone().ok_or_else(|| {
            TaskgateError::ConfigError(format!("task '{name}' has no `cmd`"))
        })?;

        Ok(Self {
            cmd,
            mode: task.mode,
            config_file: task.config_file.clone(),
            count_pattern: compile(name, task.count_pattern.as_deref())?,
            unit_pattern: compile(name, task.unit_pattern.as_deref())?,
            fail_fast: task.fail_fast,
            report_dir: task.report_dir.clone(),
            open_report: task.open_report,
            coverage: (task.mode == ToolMode::Coverage).then(|| coverage.clone()),
        })
    }

    /// Directory substituted for `{report_dir}`.
    pub fn effective_report_dir(&self) -> Option<&str> {
        match (&self.coverage, &self.report_dir) {
            (_, Some(dir)) => Some(dir.as_str()),
            (Some(cov), None) => Some(cov.report_dir.as_str()),
            (None, None) => None,
        }
    }
}

fn compile(name: &str, pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|p| {
            Regex::new(p).map_err(|e| {
                TaskgateError::ConfigError(format!("task '{name}': invalid pattern {p:?}: {e}"))
            })
        })
        .transpose()
}

/// Everything a backend needs to run one pipeline.
#[derive(Debug, Clone)]
pub struct ToolRequest {
    pub task: TaskName,
    pub category: Option<Category>,
    pub tool: ToolSpec,
    /// Absolute paths of the matched files, sorted.
    pub files: Vec<PathBuf>,
    pub root: PathBuf,
}
