// src/dag/scheduler.rs

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::dag::graph::DagGraph;
use crate::errors::Result;
use crate::registry::TaskRegistry;
use crate::types::TaskName;

/// Per-invocation state of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
}

impl NodeState {
    pub fn is_done(self) -> bool {
        matches!(self, NodeState::DoneSuccess | NodeState::DoneFailed)
    }
}

/// State machine deciding which tasks of one invocation may start.
///
/// A task becomes ready once all of its dependencies are done, whether they
/// passed or failed: every category has to report its count before the
/// invocation concludes.
#[derive(Debug)]
pub struct Scheduler {
    root: TaskName,
    graph: DagGraph,
    states: BTreeMap<TaskName, NodeState>,
}

impl Scheduler {
    /// Schedule `root` and its transitive dependencies.
    pub fn for_task(registry: &TaskRegistry, root: &str) -> Result<Self> {
        let graph = DagGraph::closure(registry, root)?;
        let states = graph
            .tasks()
            .map(|t| (t.to_string(), NodeState::Pending))
            .collect();
        Ok(Self {
            root: root.to_string(),
            graph,
            states,
        })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    /// Pending tasks whose dependencies are all done, now marked running.
    pub fn ready(&mut self) -> Vec<TaskName> {
        let ready: Vec<TaskName> = self
            .states
            .iter()
            .filter(|(_, state)| **state == NodeState::Pending)
            .filter(|(name, _)| {
                self.graph
                    .dependencies_of(name)
                    .iter()
                    .all(|dep| self.state_of(dep).is_some_and(NodeState::is_done))
            })
            .map(|(name, _)| name.clone())
            .collect();

        for name in &ready {
            self.states.insert(name.clone(), NodeState::Running);
            debug!(task = %name, "task ready");
        }
        ready
    }

    /// Record that a running task finished.
    pub fn complete(&mut self, task: &str, success: bool) {
        match self.states.get_mut(task) {
            Some(state @ NodeState::Running) => {
                *state = if success {
                    NodeState::DoneSuccess
                } else {
                    NodeState::DoneFailed
                };
                debug!(task, success, "task completed");
            }
            Some(state) => warn!(task, ?state, "completion for a task that is not running; ignoring"),
            None => warn!(task, "completion for unknown task; ignoring"),
        }
    }

    pub fn state_of(&self, task: &str) -> Option<NodeState> {
        self.states.get(task).copied()
    }

    /// Whether every task of the invocation is done.
    pub fn is_finished(&self) -> bool {
        self.states.values().all(|s| s.is_done())
    }

    pub fn failed_tasks(&self) -> Vec<TaskName> {
        self.states
            .iter()
            .filter(|(_, s)| **s == NodeState::DoneFailed)
            .map(|(n, _)| n.clone())
            .collect()
    }
}
