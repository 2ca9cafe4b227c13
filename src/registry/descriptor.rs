// src/registry/descriptor.rs

use crate::config::model::{CoverageSection, TaskConfig, TaskKind};
use crate::errors::Result;
use crate::pipeline::ToolSpec;
use crate::types::{Category, TaskName};

/// A named unit of work and the tasks it runs after.
#[derive(Debug, Clone)]
pub struct TaskDescriptor {
    pub name: TaskName,
    pub description: String,
    /// Hidden tasks are left out of listings but are otherwise ordinary.
    pub hidden: bool,
    pub dependencies: Vec<TaskName>,
    pub action: TaskAction,
}

#[derive(Debug, Clone)]
pub enum TaskAction {
    /// Run an external tool and aggregate its pipeline.
    Pipeline(PipelineTask),
    /// Nothing beyond the dependencies.
    Combo,
    /// Re-invoke a target task on file changes.
    Watch(WatchTask),
}

#[derive(Debug, Clone)]
pub struct PipelineTask {
    /// `None` for report tasks, which feed no category counter.
    pub category: Option<Category>,
    pub tool: ToolSpec,
    /// Input file patterns relative to the project root.
    pub files: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct WatchTask {
    pub patterns: Vec<String>,
    pub target: TaskName,
    pub use_hash: bool,
}

impl TaskDescriptor {
    pub fn pipeline(
        name: impl Into<TaskName>,
        category: Option<Category>,
        tool: ToolSpec,
        files: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            hidden: false,
            dependencies: Vec::new(),
            action: TaskAction::Pipeline(PipelineTask {
                category,
                tool,
                files,
            }),
        }
    }

    pub fn combo<I, S>(name: impl Into<TaskName>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        Self {
            name: name.into(),
            description: String::new(),
            hidden: false,
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            action: TaskAction::Combo,
        }
    }

    pub fn watch(
        name: impl Into<TaskName>,
        patterns: Vec<String>,
        target: impl Into<TaskName>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            hidden: false,
            dependencies: Vec::new(),
            action: TaskAction::Watch(WatchTask {
                patterns,
                target: target.into(),
                use_hash: false,
            }),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Build a descriptor from a validated `[task.<name>]` section.
    pub fn from_config(name: &str, task: &TaskConfig, coverage: &CoverageSection) -> Result<Self> {
        let action = match task.kind() {
            TaskKind::Pipeline => TaskAction::Pipeline(PipelineTask {
                category: task.category,
                tool: ToolSpec::from_config(name, task, coverage)?,
                files: task.files.clone(),
            }),
            TaskKind::Combo => TaskAction::Combo,
            TaskKind::Watch => TaskAction::Watch(WatchTask {
                patterns: task.watch.clone().unwrap_or_default(),
                target: task.target.clone().unwrap_or_default(),
                use_hash: task.use_hash,
            }),
        };

        Ok(Self {
            name: name.to_string(),
            description: task.description.clone(),
            hidden: task.hidden,
            dependencies: task.after.clone(),
            action,
        })
    }

    /// Every task this one can cause to run: its dependencies plus, for a
    /// watch task, the target.
    pub fn edges(&self) -> impl Iterator<Item = &str> {
        let target = match &self.action {
            TaskAction::Watch(w) => Some(w.target.as_str()),
            _ => None,
        };
        self.dependencies.iter().map(String::as_str).chain(target)
    }

    pub fn category(&self) -> Option<Category> {
        match &self.action {
            TaskAction::Pipeline(p) => p.category,
            _ => None,
        }
    }
}
