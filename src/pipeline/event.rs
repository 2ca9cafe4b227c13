// src/pipeline/event.rs

//! The uniform result contract every external tool is adapted to.

use std::fmt;

use tokio::sync::mpsc;
use tracing::debug;

use crate::types::Category;

/// Outcome of one processed unit (a linted file, a coverage metric, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub succeeded: bool,
    pub category: Category,
    /// Diagnostic payload: file path, message, location.
    pub detail: String,
    /// Number of sub-errors this unit contributed (0 when it succeeded).
    pub count: u64,
}

impl PipelineResult {
    pub fn passed(category: Category, detail: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            category,
            detail: detail.into(),
            count: 0,
        }
    }

    pub fn failed(category: Category, detail: impl Into<String>, count: u64) -> Self {
        Self {
            succeeded: false,
            category,
            detail: detail.into(),
            count,
        }
    }
}

/// The tool itself could not proceed (crash, malformed input, bad config).
///
/// Unlike a failed [`PipelineResult`], this ends the pipeline at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineFailure {
    pub category: Option<Category>,
    pub message: String,
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category {
            Some(c) => write!(f, "[{c}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    Unit(PipelineResult),
    End,
    Failed(PipelineFailure),
}

const CLOSED_WITHOUT_END: &str = "pipeline closed without an end signal";

/// Producer half, owned by whatever drives the external tool.
///
/// `end` and `fail` consume the sink, so nothing can follow a terminal
/// event.
#[derive(Debug)]
pub struct PipelineSink {
    category: Option<Category>,
    tx: mpsc::Sender<PipelineEvent>,
}

impl PipelineSink {
    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Emit one unit result. Returns `false` once the consumer is gone.
    pub async fn unit(&self, result: PipelineResult) -> bool {
        self.tx.send(PipelineEvent::Unit(result)).await.is_ok()
    }

    pub async fn end(self) {
        if self.tx.send(PipelineEvent::End).await.is_err() {
            debug!("pipeline consumer gone before end signal");
        }
    }

    pub async fn fail(self, message: impl Into<String>) {
        let failure = PipelineFailure {
            category: self.category,
            message: message.into(),
        };
        if self.tx.send(PipelineEvent::Failed(failure)).await.is_err() {
            debug!("pipeline consumer gone before failure signal");
        }
    }
}

/// Consumer half: a lazy sequence of unit results terminated by exactly one
/// `End` or `Failed`.
#[derive(Debug)]
pub struct Pipeline {
    category: Option<Category>,
    rx: mpsc::Receiver<PipelineEvent>,
    finished: bool,
}

impl Pipeline {
    pub fn channel(category: Option<Category>) -> (PipelineSink, Pipeline) {
        let (tx, rx) = mpsc::channel(64);
        (
            PipelineSink { category, tx },
            Pipeline {
                category,
                rx,
                finished: false,
            },
        )
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Next event, or `None` once a terminal event has been yielded.
    ///
    /// A producer that disappears without a terminal event is reported as a
    /// pipeline failure.
    pub async fn next(&mut self) -> Option<PipelineEvent> {
        if self.finished {
            return None;
        }

        match self.rx.recv().await {
            Some(PipelineEvent::Unit(result)) => Some(PipelineEvent::Unit(result)),
            Some(terminal) => {
                self.finish();
                Some(terminal)
            }
            None => {
                self.finish();
                Some(PipelineEvent::Failed(PipelineFailure {
                    category: self.category,
                    message: CLOSED_WITHOUT_END.to_string(),
                }))
            }
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.rx.close();
    }
}
