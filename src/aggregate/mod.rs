// src/aggregate/mod.rs

//! Consumes a pipeline into the run state and turns its terminal event into
//! a category verdict.

pub mod reporter;

pub use reporter::Reporter;

use tracing::{debug, info, warn};

use crate::pipeline::{Pipeline, PipelineEvent};
use crate::state::RunState;

/// Verdict of one pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryVerdict {
    Passed,
    /// The category accumulated `errors` sub-errors.
    Failed { errors: u64 },
    /// The tool could not proceed.
    Aborted { message: String },
}

impl CategoryVerdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, CategoryVerdict::Passed)
    }
}

/// Drain `pipeline` into `state`.
///
/// Every unit result is recorded. On `End` the verdict is read from the
/// pipeline's category counter (category-less pipelines pass); a failing
/// verdict marks the run failed. On `Failed` the failure is reported right
/// away, the run is marked failed and nothing more is consumed.
pub async fn aggregate(
    task: &str,
    pipeline: &mut Pipeline,
    state: &mut RunState,
    reporter: &Reporter,
) -> CategoryVerdict {
    let mut units = 0usize;

    while let Some(event) = pipeline.next().await {
        match event {
            PipelineEvent::Unit(result) => {
                units += 1;
                if !result.succeeded {
                    debug!(
                        task,
                        category = %result.category,
                        count = result.count,
                        detail = %result.detail,
                        "unit failed"
                    );
                }
                state.record_unit_result(&result);
            }
            PipelineEvent::End => {
                let Some(category) = pipeline.category() else {
                    info!(task, units, "pipeline finished");
                    reporter.pass(task, None);
                    return CategoryVerdict::Passed;
                };

                if state.current_verdict(category) {
                    let errors = state.error_count(category);
                    info!(task, category = %category, errors, units, "category failed");
                    state.mark_failed();
                    reporter.fail(task, category, errors);
                    return CategoryVerdict::Failed { errors };
                }

                info!(task, category = %category, units, "category passed");
                reporter.pass(task, Some(category));
                return CategoryVerdict::Passed;
            }
            PipelineEvent::Failed(failure) => {
                warn!(task, error = %failure, "pipeline failed");
                reporter.abort(task, &failure.message);
                let message = failure.message.clone();
                state.record_pipeline_failure(failure);
                return CategoryVerdict::Aborted { message };
            }
        }
    }

    // `next` always yields a terminal event before `None`, so this only
    // happens for a pipeline that was already drained.
    let message = "pipeline already consumed".to_string();
    warn!(task, "{message}");
    CategoryVerdict::Aborted { message }
}
