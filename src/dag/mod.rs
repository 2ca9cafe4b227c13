// src/dag/mod.rs

//! Dependency graph and scheduling of one invocation.
//!
//! - [`graph`] holds the dependency closure of the invoked task.
//! - [`scheduler`] decides which tasks are ready to run and tracks their
//!   per-invocation state.

pub mod graph;
pub mod scheduler;

pub use graph::DagGraph;
pub use scheduler::{NodeState, Scheduler};
