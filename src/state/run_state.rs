// src/state/run_state.rs

use std::collections::HashMap;

use tracing::debug;

use crate::pipeline::{PipelineFailure, PipelineResult};
use crate::types::Category;

/// Error counters and the pass/fail flag of one run.
///
/// Counters only ever grow between two resets. `run_failed` is true iff some
/// category ended with a non-zero count or a pipeline failed outright.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunState {
    error_counts: HashMap<Category, u64>,
    run_failed: bool,
    pipeline_failures: Vec<PipelineFailure>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every counter and clear the failure flag.
    pub fn reset(&mut self) {
        self.error_counts.clear();
        self.run_failed = false;
        self.pipeline_failures.clear();
    }

    /// Count the sub-errors of a failed unit; successful units are ignored.
    pub fn record_unit_result(&mut self, result: &PipelineResult) {
        if result.succeeded {
            return;
        }
        let count = self.error_counts.entry(result.category).or_insert(0);
        *count += result.count;
        debug!(
            category = %result.category,
            added = result.count,
            total = *count,
            "recorded failing unit"
        );
    }

    /// Whether `category` has accumulated any error in this run.
    pub fn current_verdict(&self, category: Category) -> bool {
        self.error_count(category) > 0
    }

    pub fn error_count(&self, category: Category) -> u64 {
        self.error_counts.get(&category).copied().unwrap_or(0)
    }

    /// Categories with a non-zero count, in declaration order.
    pub fn failed_categories(&self) -> Vec<(Category, u64)> {
        Category::ALL
            .into_iter()
            .map(|c| (c, self.error_count(c)))
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    pub fn total_errors(&self) -> u64 {
        self.error_counts.values().sum()
    }

    pub fn mark_failed(&mut self) {
        self.run_failed = true;
    }

    /// Record a tool-level failure; always fails the run.
    pub fn record_pipeline_failure(&mut self, failure: PipelineFailure) {
        self.run_failed = true;
        self.pipeline_failures.push(failure);
    }

    pub fn pipeline_failures(&self) -> &[PipelineFailure] {
        &self.pipeline_failures
    }

    pub fn run_failed(&self) -> bool {
        self.run_failed
    }

    /// Fold the state of an independently executed dependency into this one.
    pub fn merge(&mut self, other: &RunState) {
        for (category, count) in &other.error_counts {
            *self.error_counts.entry(*category).or_insert(0) += count;
        }
        self.run_failed |= other.run_failed;
        self.pipeline_failures
            .extend(other.pipeline_failures.iter().cloned());
    }
}
