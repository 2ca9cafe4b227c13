// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{Result, TaskgateError};
use crate::registry::TaskRegistry;
use crate::types::TaskName;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct dependencies: tasks that must complete before this one runs.
    deps: Vec<TaskName>,
    /// Direct dependents: tasks that list this one as a dependency.
    dependents: Vec<TaskName>,
}

/// Dependency adjacency of the tasks one invocation touches.
///
/// Acyclicity is already guaranteed by the registry, so this only keeps
/// adjacency information for scheduling and `--dry-run` output.
#[derive(Debug, Clone)]
pub struct DagGraph {
    nodes: BTreeMap<TaskName, DagNode>,
}

impl DagGraph {
    /// Build the graph of `root` and everything it transitively depends on.
    ///
    /// Fails with `UnknownTask` if `root` or any dependency is not
    /// registered.
    pub fn closure(registry: &TaskRegistry, root: &str) -> Result<Self> {
        let mut nodes: BTreeMap<TaskName, DagNode> = BTreeMap::new();
        let mut seen: BTreeSet<TaskName> = BTreeSet::new();
        let mut stack = vec![root.to_string()];

        while let Some(name) = stack.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let descriptor = registry.lookup(&name)?;
            for dep in &descriptor.dependencies {
                if !registry.contains(dep) {
                    return Err(TaskgateError::UnknownTask(format!(
                        "{dep} (dependency of '{name}')"
                    )));
                }
                stack.push(dep.clone());
            }
            nodes.entry(name).or_default().deps = descriptor.dependencies.clone();
        }

        let edges: Vec<(TaskName, TaskName)> = nodes
            .iter()
            .flat_map(|(name, node)| node.deps.iter().map(move |dep| (dep.clone(), name.clone())))
            .collect();
        for (dep, dependent) in edges {
            if let Some(node) = nodes.get_mut(&dep) {
                if !node.dependents.contains(&dependent) {
                    node.dependents.push(dependent);
                }
            }
        }

        Ok(Self { nodes })
    }

    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}
