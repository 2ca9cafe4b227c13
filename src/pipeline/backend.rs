// src/pipeline/backend.rs

//! Pluggable tool backend abstraction.
//!
//! The orchestrator talks to a `ToolBackend` instead of spawning processes
//! itself. This makes it easy to swap in a scripted backend in tests while
//! keeping the production process runner in [`super::runner`].

use std::sync::Arc;

use crate::fs::{FileSystem, RealFileSystem};
use crate::pipeline::runner::run_tool;
use crate::pipeline::{Pipeline, ToolRequest};

/// Trait abstracting how a tool pipeline is started.
///
/// Implementations return immediately; the pipeline is consumed
/// asynchronously by the caller.
pub trait ToolBackend: Send + Sync {
    fn start(&self, request: ToolRequest) -> Pipeline;
}

/// Production backend: each pipeline is a Tokio task running the tool's
/// processes.
#[derive(Debug, Clone)]
pub struct RealToolBackend {
    fs: Arc<dyn FileSystem>,
}

impl RealToolBackend {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl Default for RealToolBackend {
    fn default() -> Self {
        Self::new(Arc::new(RealFileSystem))
    }
}

impl ToolBackend for RealToolBackend {
    fn start(&self, request: ToolRequest) -> Pipeline {
        let (sink, pipeline) = Pipeline::channel(request.category);
        let fs = Arc::clone(&self.fs);
        tokio::spawn(run_tool(fs, request, sink));
        pipeline
    }
}
