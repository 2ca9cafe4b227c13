// src/pipeline/command.rs

//! Shell command construction and captured execution of external tools.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tokio::process::Command;
use tracing::{debug, info};

/// Values substituted into a command template.
#[derive(Debug, Default, Clone)]
pub struct Placeholders<'a> {
    pub file: Option<&'a Path>,
    pub files: &'a [PathBuf],
    pub config: Option<&'a Path>,
    pub report_dir: Option<&'a Path>,
}

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(files|file|config|report_dir)\}").expect("placeholder regex is valid")
});

/// Expand `{file}`, `{files}`, `{config}` and `{report_dir}` in `template`.
///
/// Every substituted path is shell-quoted; unset placeholders expand to the
/// empty string. Substituted values are never expanded again.
pub fn expand(template: &str, values: &Placeholders<'_>) -> String {
    let files = values
        .files
        .iter()
        .map(|p| shell_quote(&p.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ");
    let quoted = |p: Option<&Path>| {
        p.map(|p| shell_quote(&p.to_string_lossy()))
            .unwrap_or_default()
    };

    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
            "files" => files.clone(),
            "file" => quoted(values.file),
            "config" => quoted(values.config),
            _ => quoted(values.report_dir),
        })
        .into_owned()
}

/// Quote a single argument for the platform shell.
pub fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@+,".contains(c));
    if plain {
        return arg.to_string();
    }

    if cfg!(windows) {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

/// Build a shell command appropriate for the platform.
pub fn shell_command(line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(line);
        c
    }
}

/// Captured result of one tool process.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub success: bool,
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Both streams, stdout first.
    pub fn combined(&self) -> String {
        let mut s = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !s.is_empty() && !s.ends_with('\n') {
                s.push('\n');
            }
            s.push_str(&self.stderr);
        }
        s
    }

    /// The last few non-empty output lines, for failure messages.
    pub fn tail(&self, max_lines: usize) -> String {
        let combined = self.combined();
        let lines: Vec<&str> = combined
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .collect();
        let start = lines.len().saturating_sub(max_lines);
        lines[start..].join("\n")
    }
}

/// Run `line` through the shell in `cwd` and wait for it, capturing output.
pub async fn run_captured(task: &str, line: &str, cwd: &Path) -> Result<ToolOutput> {
    info!(task = %task, cmd = %line, "starting tool process");

    let output = shell_command(line)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("spawning tool process for task '{task}'"))?;

    let code = output.status.code().unwrap_or(-1);
    debug!(
        task = %task,
        exit_code = code,
        success = output.status.success(),
        "tool process exited"
    );

    Ok(ToolOutput {
        success: output.status.success(),
        code,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
