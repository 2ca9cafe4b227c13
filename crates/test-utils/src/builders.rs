#![allow(dead_code)]

use taskgate::config::{ConfigFile, CoverageThresholds, RawConfigFile, TaskConfig};
use taskgate::errors::Result;
use taskgate::types::{Category, ToolMode};

/// Builder for `ConfigFile` that starts from an empty catalogue.
///
/// Unlike the loader, nothing is merged in from the built-in tasks.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_thresholds(mut self, thresholds: CoverageThresholds) -> Self {
        self.config.coverage.thresholds = thresholds;
        self
    }

    pub fn without_bell(mut self) -> Self {
        self.config.config.bell = false;
        self
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    /// A tool-running task.
    pub fn pipeline(category: Category, mode: ToolMode, cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                category: Some(category),
                mode,
                cmd: Some(cmd.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    /// A report task: no category.
    pub fn report(cmd: &str, report_dir: &str) -> Self {
        Self {
            task: TaskConfig {
                mode: ToolMode::Report,
                cmd: Some(cmd.to_string()),
                report_dir: Some(report_dir.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    /// A task that only depends on others.
    pub fn combo(deps: &[&str]) -> Self {
        Self {
            task: TaskConfig {
                after: deps.iter().map(|d| d.to_string()).collect(),
                ..TaskConfig::default()
            },
        }
    }

    pub fn watch(patterns: &[&str], target: &str) -> Self {
        Self {
            task: TaskConfig {
                watch: Some(patterns.iter().map(|p| p.to_string()).collect()),
                target: Some(target.to_string()),
                ..TaskConfig::default()
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn files(mut self, patterns: &[&str]) -> Self {
        self.task.files = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.task.description = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.task.hidden = true;
        self
    }

    pub fn count_pattern(mut self, pattern: &str) -> Self {
        self.task.count_pattern = Some(pattern.to_string());
        self
    }

    pub fn unit_pattern(mut self, pattern: &str) -> Self {
        self.task.unit_pattern = Some(pattern.to_string());
        self
    }

    pub fn fail_fast(mut self) -> Self {
        self.task.fail_fast = true;
        self
    }

    pub fn use_hash(mut self) -> Self {
        self.task.use_hash = true;
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
