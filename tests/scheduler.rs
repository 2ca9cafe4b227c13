// tests/scheduler.rs

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;
use taskgate::dag::{NodeState, Scheduler};
use taskgate::errors::TaskgateError;
use taskgate::registry::{TaskDescriptor, TaskRegistry};

fn registry(tasks: &[(&str, &[&str])]) -> TaskRegistry {
    let mut registry = TaskRegistry::new();
    for (name, deps) in tasks {
        registry
            .register(TaskDescriptor::combo(*name, deps.iter().copied()))
            .unwrap();
    }
    registry
}

#[test]
fn closure_contains_only_reachable_tasks() {
    let registry = registry(&[
        ("lint", &[]),
        ("felint", &[]),
        ("plato", &[]),
        ("ci", &["lint", "felint"]),
    ]);

    let scheduler = Scheduler::for_task(&registry, "ci").unwrap();
    let tasks: Vec<&str> = scheduler.graph().tasks().collect();

    assert_eq!(tasks, vec!["ci", "felint", "lint"]);
    assert_eq!(scheduler.graph().dependents_of("lint"), ["ci".to_string()]);
}

#[test]
fn dependencies_become_ready_together() {
    let registry = registry(&[("lint", &[]), ("felint", &[]), ("ci", &["lint", "felint"])]);
    let mut scheduler = Scheduler::for_task(&registry, "ci").unwrap();

    assert_eq!(scheduler.ready(), vec!["felint", "lint"]);
    assert!(scheduler.ready().is_empty());
    assert_eq!(scheduler.state_of("lint"), Some(NodeState::Running));

    scheduler.complete("lint", false);
    assert!(scheduler.ready().is_empty());

    scheduler.complete("felint", true);
    // A failed dependency still lets the dependent run.
    assert_eq!(scheduler.ready(), vec!["ci"]);
    scheduler.complete("ci", true);

    assert!(scheduler.is_finished());
    assert_eq!(scheduler.failed_tasks(), vec!["lint"]);
}

#[test]
fn unknown_dependency_is_reported_on_invocation() {
    let registry = registry(&[("ci", &["lint", "missing"]), ("lint", &[])]);

    match Scheduler::for_task(&registry, "ci") {
        Err(TaskgateError::UnknownTask(msg)) => assert!(msg.contains("missing")),
        other => panic!("expected UnknownTask, got {other:?}"),
    }
}

#[test]
fn completing_a_task_that_is_not_running_is_ignored() {
    let registry = registry(&[("lint", &[]), ("ci", &["lint"])]);
    let mut scheduler = Scheduler::for_task(&registry, "ci").unwrap();

    scheduler.complete("ci", true);
    assert_eq!(scheduler.state_of("ci"), Some(NodeState::Pending));
    scheduler.complete("nope", true);
    assert!(!scheduler.is_finished());
}

// Acyclic by construction: task N only depends on tasks 0..N-1.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, deps)| {
                    if i == 0 {
                        return Vec::new();
                    }
                    let unique: BTreeSet<usize> = deps.into_iter().map(|d| d % i).collect();
                    unique.into_iter().collect()
                })
                .collect()
        })
    })
}

proptest! {
    #[test]
    fn every_task_runs_once_after_its_dependencies(
        deps in dag_strategy(12),
        failures in proptest::collection::vec(any::<bool>(), 12),
    ) {
        let names: Vec<String> = (0..deps.len()).map(|i| format!("task_{i}")).collect();
        let mut registry = TaskRegistry::new();
        for (i, task_deps) in deps.iter().enumerate() {
            let dep_names: Vec<String> = task_deps.iter().map(|d| names[*d].clone()).collect();
            registry.register(TaskDescriptor::combo(names[i].clone(), dep_names)).unwrap();
        }
        registry
            .register(TaskDescriptor::combo("root", names.clone()))
            .unwrap();

        let mut scheduler = Scheduler::for_task(&registry, "root").unwrap();
        let mut done: HashSet<String> = HashSet::new();
        let mut order = Vec::new();

        loop {
            let ready = scheduler.ready();
            if ready.is_empty() {
                break;
            }
            for task in ready {
                for dep in scheduler.graph().dependencies_of(&task) {
                    prop_assert!(done.contains(dep), "{} ran before {}", task, dep);
                }
                let index = names.iter().position(|n| *n == task);
                let success = index.map(|i| !failures[i]).unwrap_or(true);
                scheduler.complete(&task, success);
                done.insert(task.clone());
                order.push(task);
            }
        }

        prop_assert!(scheduler.is_finished());
        prop_assert_eq!(order.len(), names.len() + 1);
        prop_assert_eq!(order.last().map(String::as_str), Some("root"));
    }
}
