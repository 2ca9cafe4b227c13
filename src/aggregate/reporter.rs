// src/aggregate/reporter.rs

use std::io::Write;

use console::{style, Emoji, Term};
use tracing::debug;

use crate::state::RunState;
use crate::types::Category;

static PASS: Emoji<'_, '_> = Emoji("✔ ", "OK ");
static FAIL: Emoji<'_, '_> = Emoji("✖ ", "X ");

/// User-facing verdict lines on stdout.
///
/// Diagnostics go through `tracing` (stderr); this is only what a developer
/// reads at a glance.
#[derive(Debug, Clone)]
pub struct Reporter {
    term: Term,
    bell: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Reporter {
    pub fn new(bell: bool) -> Self {
        Self {
            term: Term::stdout(),
            bell,
        }
    }

    /// Reporter that never rings, for tests and `--dry-run`.
    pub fn quiet() -> Self {
        Self::new(false)
    }

    pub fn pass(&self, task: &str, category: Option<Category>) {
        let line = match category {
            Some(c) => format!("{PASS}{task}: {c} passed"),
            None => format!("{PASS}{task}: done"),
        };
        self.line(style(line).green().to_string());
    }

    pub fn fail(&self, task: &str, category: Category, errors: u64) {
        let noun = if errors == 1 { "error" } else { "errors" };
        let line = format!("{FAIL}{task}: {category} failed with {errors} {noun}");
        self.line(style(line).red().bold().to_string());
        self.ring();
    }

    /// The tool itself broke down.
    pub fn abort(&self, task: &str, message: &str) {
        let line = format!("{FAIL}{task}: {message}");
        self.line(style(line).red().bold().to_string());
        self.ring();
    }

    pub fn summary_pass(&self, task: &str) {
        let line = format!("{PASS}{task} passed");
        self.line(style(line).green().bold().to_string());
    }

    pub fn summary_fail(&self, task: &str, state: &RunState) {
        self.line(style(format!("{FAIL}{task} failed")).red().bold().to_string());
        for (category, errors) in state.failed_categories() {
            self.line(style(format!("    {category}: {errors}")).red().to_string());
        }
        for failure in state.pipeline_failures() {
            self.line(style(format!("    {failure}")).red().to_string());
        }
        self.ring();
    }

    pub fn stream_size(&self, task: &str, files: usize, bytes: u64) {
        let line = format!("  {task}: {files} files, {bytes} bytes streamed");
        self.line(style(line).dim().to_string());
    }

    fn line(&self, text: String) {
        if let Err(err) = self.term.write_line(&text) {
            debug!(error = %err, "could not write to stdout");
        }
    }

    fn ring(&self) {
        if !self.bell {
            return;
        }
        let mut err = Term::stderr();
        if !err.is_term() {
            return;
        }
        if let Err(e) = err.write_all(b"\x07").and_then(|_| err.flush()) {
            debug!(error = %e, "could not ring the bell");
        }
    }
}
