// src/termination.rs

//! Turns the outcome of an invocation into a process-level decision.
//!
//! The controller only decides; `main` performs the exit after flushing
//! stdout and stderr, so no verdict line is lost.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::aggregate::Reporter;
use crate::registry::Outcome;
use crate::types::RunMode;

/// What the process should do after an invocation concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Exit with this status code.
    Exit(i32),
    /// Keep running (watch mode, or the exit was already decided).
    Continue,
}

#[derive(Debug)]
pub struct TerminationController {
    mode: RunMode,
    fired: AtomicBool,
    reporter: Reporter,
}

impl TerminationController {
    pub fn new(mode: RunMode, reporter: Reporter) -> Self {
        Self {
            mode,
            fired: AtomicBool::new(false),
            reporter,
        }
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Print the summary of `outcome` and decide how to proceed.
    ///
    /// In normal mode the first call returns `Exit(1)` for a failed run and
    /// `Exit(0)` for a passing one; every later call returns `Continue`
    /// until [`rearm`](Self::rearm). Watch mode always continues.
    pub fn conclude(&self, outcome: &Outcome) -> Termination {
        let failed = outcome.failed();

        if self.mode == RunMode::Watch {
            if failed {
                warn!(
                    task = %outcome.task,
                    errors = outcome.state.total_errors(),
                    "run failed; waiting for the next change"
                );
                self.reporter.summary_fail(&outcome.task, &outcome.state);
            } else {
                info!(task = %outcome.task, "run passed; waiting for the next change");
                self.reporter.summary_pass(&outcome.task);
            }
            return Termination::Continue;
        }

        if self.fired.swap(true, Ordering::SeqCst) {
            debug!(task = %outcome.task, "termination already decided; ignoring");
            return Termination::Continue;
        }

        if failed {
            warn!(
                task = %outcome.task,
                errors = outcome.state.total_errors(),
                pipeline_failures = outcome.state.pipeline_failures().len(),
                "run failed"
            );
            self.reporter.summary_fail(&outcome.task, &outcome.state);
            Termination::Exit(1)
        } else {
            info!(task = %outcome.task, "run passed");
            self.reporter.summary_pass(&outcome.task);
            Termination::Exit(0)
        }
    }

    /// Allow the next run to decide termination again.
    pub fn rearm(&self) {
        self.fired.store(false, Ordering::SeqCst);
    }
}
