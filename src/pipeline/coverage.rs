// src/pipeline/coverage.rs

//! Coverage threshold enforcement.
//!
//! The instrumenter writes an istanbul-style `json-summary`:
//!
//! ```json
//! { "total": { "lines": { "total": 10, "covered": 8, "pct": 80 }, ... } }
//! ```
//!
//! Each configured metric becomes one unit result: passed when the measured
//! percentage meets the threshold, failed (count 1) otherwise.

use serde::Deserialize;

use crate::config::model::CoverageThresholds;
use crate::errors::Result;
use crate::pipeline::PipelineResult;
use crate::types::Category;

#[derive(Debug, Clone, Deserialize)]
pub struct CoverageSummary {
    pub total: CoverageTotals,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverageTotals {
    pub statements: CoverageMetric,
    pub branches: CoverageMetric,
    pub lines: CoverageMetric,
    pub functions: CoverageMetric,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoverageMetric {
    pub pct: Percentage,
}

/// istanbul reports `"Unknown"` when a metric has nothing to cover.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Percentage {
    Value(f64),
    Unknown(String),
}

impl Percentage {
    /// Nothing to cover counts as fully covered.
    pub fn value(&self) -> f64 {
        match self {
            Percentage::Value(v) => *v,
            Percentage::Unknown(_) => 100.0,
        }
    }
}

pub fn parse_summary(json: &str) -> Result<CoverageSummary> {
    Ok(serde_json::from_str(json)?)
}

/// Compare measured totals with the thresholds. Metrics with a zero
/// threshold are not reported.
pub fn evaluate(summary: &CoverageSummary, thresholds: &CoverageThresholds) -> Vec<PipelineResult> {
    let t = &summary.total;
    let metrics = [
        ("statements", t.statements.pct.value(), thresholds.statements),
        ("branches", t.branches.pct.value(), thresholds.branches),
        ("lines", t.lines.pct.value(), thresholds.lines),
        ("functions", t.functions.pct.value(), thresholds.functions),
    ];

    metrics
        .into_iter()
        .filter(|(_, _, required)| *required > 0.0)
        .map(|(metric, actual, required)| {
            if actual >= required {
                PipelineResult::passed(
                    Category::Coverage,
                    format!("{metric}: {actual}% (threshold {required}%)"),
                )
            } else {
                PipelineResult::failed(
                    Category::Coverage,
                    format!("{metric} coverage {actual}% is below the {required}% threshold"),
                    1,
                )
            }
        })
        .collect()
}
