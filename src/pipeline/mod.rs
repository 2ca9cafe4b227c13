// src/pipeline/mod.rs

//! Pipeline adapter layer.
//!
//! Every external tool (lint engine, style compiler, test runner, coverage
//! instrumenter, report generator) is adapted to the same contract: a lazy
//! sequence of [`PipelineResult`]s ending in exactly one `End` or `Failed`.
//!
//! - [`event`] defines the contract and its channel halves.
//! - [`tool`] holds the compiled per-task tool settings.
//! - [`backend`] provides the `ToolBackend` trait and the production
//!   `RealToolBackend`.
//! - [`runner`] drives a tool process in one of the [`ToolMode`]s.
//! - [`command`] builds and runs shell commands.
//! - [`coverage`] enforces coverage thresholds on the written summary.
//! - [`report`] strips rule-file comments and opens generated reports.
//!
//! [`ToolMode`]: crate::types::ToolMode

pub mod backend;
pub mod command;
pub mod coverage;
pub mod event;
pub mod report;
pub mod runner;
pub mod tool;

pub use backend::{RealToolBackend, ToolBackend};
pub use event::{Pipeline, PipelineEvent, PipelineFailure, PipelineResult, PipelineSink};
pub use tool::{ToolRequest, ToolSpec};
