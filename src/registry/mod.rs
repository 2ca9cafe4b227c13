// src/registry/mod.rs

//! Named tasks and their invocation.
//!
//! - [`descriptor`] describes what a task is.
//! - [`TaskRegistry`] maps names to descriptors and keeps the task graph
//!   acyclic.
//! - [`orchestrator`] invokes tasks: dependencies first, then the task's own
//!   action, each invocation with a fresh run state.

pub mod descriptor;
pub mod orchestrator;

pub use descriptor::{PipelineTask, TaskAction, TaskDescriptor, WatchTask};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, OrchestratorSettings, Outcome};

use std::collections::BTreeMap;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::config::model::ConfigFile;
use crate::errors::{Result, TaskgateError};
use crate::types::TaskName;

/// Name to descriptor map. Dependencies may name tasks registered later;
/// they are resolved on invocation.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, Arc<TaskDescriptor>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every task of a validated configuration.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut registry = Self::new();
        for (name, task) in cfg.tasks() {
            registry.register(TaskDescriptor::from_config(name, task, cfg.coverage())?)?;
        }
        Ok(registry)
    }

    /// Add a task.
    ///
    /// Fails with `DuplicateTask` if the name is taken and with
    /// `CyclicDependency` if the new edges close a cycle; the registry is
    /// unchanged on failure.
    pub fn register(&mut self, descriptor: TaskDescriptor) -> Result<()> {
        if self.tasks.contains_key(&descriptor.name) {
            return Err(TaskgateError::DuplicateTask(descriptor.name));
        }

        let name = descriptor.name.clone();
        self.tasks.insert(name.clone(), Arc::new(descriptor));

        if let Err(cycle_at) = self.check_acyclic() {
            self.tasks.remove(&name);
            return Err(TaskgateError::CyclicDependency(format!(
                "registering '{name}' would create a cycle through '{cycle_at}'"
            )));
        }

        debug!(task = %name, "registered task");
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<TaskDescriptor>> {
        self.tasks
            .get(name)
            .cloned()
            .ok_or_else(|| TaskgateError::UnknownTask(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Visible tasks sorted by name.
    pub fn listing(&self) -> Vec<Arc<TaskDescriptor>> {
        self.tasks
            .values()
            .filter(|d| !d.hidden)
            .cloned()
            .collect()
    }

    /// All tasks, hidden ones included, sorted by name.
    pub fn all(&self) -> impl Iterator<Item = &Arc<TaskDescriptor>> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Edge `a -> b` means invoking `a` runs `b`.
    fn check_acyclic(&self) -> std::result::Result<(), String> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for descriptor in self.tasks.values() {
            graph.add_node(descriptor.name.as_str());
            for to in descriptor.edges() {
                graph.add_edge(descriptor.name.as_str(), to, ());
            }
        }
        toposort(&graph, None)
            .map(|_| ())
            .map_err(|cycle| cycle.node_id().to_string())
    }
}
