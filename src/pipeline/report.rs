// src/pipeline/report.rs

//! Helpers for report-generating tools (complexity report).

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::pipeline::command::{shell_command, shell_quote};

/// Remove `//` line comments and `/* */` block comments from a JSON-like
/// rule file. String literals are left untouched, so `"http://x"` survives.
pub fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                // Keep the newline so line numbers in parser errors still match.
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Open a generated report with the platform's default handler.
///
/// Does not wait for the viewer to exit.
pub fn open_report(path: &Path) -> Result<()> {
    let target = shell_quote(&path.to_string_lossy());
    let line = if cfg!(target_os = "macos") {
        format!("open {target}")
    } else if cfg!(windows) {
        format!("start \"\" {target}")
    } else {
        format!("xdg-open {target}")
    };

    info!(report = ?path, "opening report");
    shell_command(&line)
        .spawn()
        .with_context(|| format!("opening report {:?}", path))?;
    Ok(())
}
