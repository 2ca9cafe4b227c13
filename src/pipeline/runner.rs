// src/pipeline/runner.rs

//! Drives one external tool and adapts its output to pipeline events.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use tracing::{debug, error, warn};

use crate::fs::FileSystem;
use crate::pipeline::command::{expand, run_captured, Placeholders, ToolOutput};
use crate::pipeline::{coverage, report, PipelineResult, PipelineSink, ToolRequest};
use crate::types::{Category, ToolMode};

const TAIL_LINES: usize = 20;

/// Run the tool described by `request`, streaming results into `sink`.
///
/// Any error escaping a mode handler is a pipeline-level failure; per-unit
/// failures were already emitted as unit results.
pub async fn run_tool(fs: Arc<dyn FileSystem>, request: ToolRequest, sink: PipelineSink) {
    let task = request.task.clone();

    let result = match request.tool.mode {
        ToolMode::PerFile => run_per_file(&request, &sink).await,
        ToolMode::Batch => run_batch(&request, &sink).await,
        ToolMode::Coverage => run_coverage(fs.as_ref(), &request, &sink).await,
        ToolMode::Report => run_report(fs.as_ref(), &request).await,
    };

    match result {
        Ok(()) => sink.end().await,
        Err(err) => {
            error!(task = %task, error = %err, "tool failed");
            sink.fail(format!("{err:#}")).await;
        }
    }
}

fn required_category(request: &ToolRequest) -> Result<Category> {
    request
        .category
        .ok_or_else(|| anyhow!("task '{}' reports unit results but has no category", request.task))
}

fn config_path(request: &ToolRequest) -> Option<PathBuf> {
    request.tool.config_file.as_ref().map(|c| request.root.join(c))
}

fn report_dir(request: &ToolRequest) -> Option<PathBuf> {
    request
        .tool
        .effective_report_dir()
        .map(|d| request.root.join(d))
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// First integer captured by `pattern` anywhere in the output.
fn count_from_output(pattern: Option<&Regex>, output: &ToolOutput) -> Option<u64> {
    let combined = output.combined();
    pattern?
        .captures(&combined)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

async fn run_per_file(request: &ToolRequest, sink: &PipelineSink) -> Result<()> {
    let category = required_category(request)?;
    let config = config_path(request);
    let report_dir = report_dir(request);

    for file in &request.files {
        let line = expand(
            &request.tool.cmd,
            &Placeholders {
                file: Some(file),
                files: std::slice::from_ref(file),
                config: config.as_deref(),
                report_dir: report_dir.as_deref(),
            },
        );
        let output = run_captured(&request.task, &line, &request.root).await?;
        let rel = relative(&request.root, file);

        let result = if output.success {
            PipelineResult::passed(category, rel)
        } else {
            let detail = format!("{rel}\n{}", output.tail(TAIL_LINES));
            if request.tool.fail_fast {
                bail!("{detail}");
            }
            let count = count_from_output(request.tool.count_pattern.as_ref(), &output)
                .filter(|n| *n > 0)
                .unwrap_or(1);
            PipelineResult::failed(category, detail, count)
        };

        if !sink.unit(result).await {
            debug!(task = %request.task, "pipeline consumer gone; stopping");
            break;
        }
    }
    Ok(())
}

async fn run_batch(request: &ToolRequest, sink: &PipelineSink) -> Result<()> {
    let config = config_path(request);
    let report_dir = report_dir(request);
    let line = expand(
        &request.tool.cmd,
        &Placeholders {
            file: request.files.first().map(PathBuf::as_path),
            files: &request.files,
            config: config.as_deref(),
            report_dir: report_dir.as_deref(),
        },
    );
    let output = run_captured(&request.task, &line, &request.root).await?;

    let Some(pattern) = &request.tool.unit_pattern else {
        if !output.success {
            bail!(
                "'{}' exited with code {}\n{}",
                request.task,
                output.code,
                output.tail(TAIL_LINES)
            );
        }
        return Ok(());
    };

    let category = required_category(request)?;
    let mut violations = collect_violations(pattern, &output, &request.root);

    if !output.success && violations.is_empty() {
        // Non-zero exit without a single attributable violation: the tool
        // itself broke.
        bail!(
            "'{}' exited with code {} without reporting violations\n{}",
            request.task,
            output.code,
            output.tail(TAIL_LINES)
        );
    }

    let mut results = Vec::with_capacity(request.files.len());
    for file in &request.files {
        let rel = relative(&request.root, file);
        results.push(match violations.remove(&rel) {
            Some(count) => PipelineResult::failed(category, rel, count),
            None => PipelineResult::passed(category, rel),
        });
    }
    for (rel, count) in violations {
        warn!(task = %request.task, file = %rel, "violations reported for a file outside the pattern set");
        results.push(PipelineResult::failed(category, rel, count));
    }

    for result in results {
        if !sink.unit(result).await {
            break;
        }
    }
    Ok(())
}

/// Violation counts per root-relative file, from lines matching `pattern`.
fn collect_violations(pattern: &Regex, output: &ToolOutput, root: &Path) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for line in output.combined().lines() {
        let Some(caps) = pattern.captures(line) else {
            continue;
        };
        let Some(file) = caps.name("file") else {
            continue;
        };
        let count = caps
            .name("count")
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(1);
        let rel = relative(root, Path::new(file.as_str().trim()));
        *counts.entry(rel).or_insert(0) += count;
    }
    counts
}

async fn run_coverage(fs: &dyn FileSystem, request: &ToolRequest, sink: &PipelineSink) -> Result<()> {
    let coverage = request
        .tool
        .coverage
        .as_ref()
        .ok_or_else(|| anyhow!("task '{}' has no coverage settings", request.task))?;
    let report_dir = request.root.join(&coverage.report_dir);
    let line = expand(
        &request.tool.cmd,
        &Placeholders {
            file: None,
            files: &request.files,
            config: config_path(request).as_deref(),
            report_dir: Some(&report_dir),
        },
    );
    // A summary left over from an earlier run must not be graded again.
    let summary_path = request.root.join(&coverage.summary_file);
    fs.remove(&summary_path)?;

    let output = run_captured(&request.task, &line, &request.root).await?;
    if !output.success {
        bail!(
            "tests failed under coverage (exit code {})\n{}",
            output.code,
            output.tail(TAIL_LINES)
        );
    }

    let json = fs
        .read_to_string(&summary_path)
        .context("reading coverage summary")?;
    let summary = coverage::parse_summary(&json)
        .with_context(|| format!("parsing coverage summary {:?}", summary_path))?;

    for result in coverage::evaluate(&summary, &coverage.thresholds) {
        if !sink.unit(result).await {
            break;
        }
    }
    Ok(())
}

async fn run_report(fs: &dyn FileSystem, request: &ToolRequest) -> Result<()> {
    let report_dir = report_dir(request)
        .ok_or_else(|| anyhow!("report task '{}' has no report_dir", request.task))?;

    // Rule files may carry comments the reporter cannot parse.
    let config = match config_path(request) {
        Some(path) if fs.exists(&path) => {
            let raw = fs.read_to_string(&path)?;
            let stripped_path = report_dir.join(".rules.json");
            fs.write(&stripped_path, report::strip_comments(&raw).as_bytes())?;
            Some(stripped_path)
        }
        Some(path) => {
            warn!(task = %request.task, config = ?path, "rule file not found; running without it");
            None
        }
        None => None,
    };

    let line = expand(
        &request.tool.cmd,
        &Placeholders {
            file: None,
            files: &request.files,
            config: config.as_deref(),
            report_dir: Some(&report_dir),
        },
    );
    let output = run_captured(&request.task, &line, &request.root).await?;
    if !output.success {
        bail!(
            "report generation failed (exit code {})\n{}",
            output.code,
            output.tail(TAIL_LINES)
        );
    }

    if request.tool.open_report {
        let index = report_dir.join("index.html");
        if let Err(err) = report::open_report(&index) {
            warn!(task = %request.task, error = %err, "could not open report");
        }
    }
    Ok(())
}
