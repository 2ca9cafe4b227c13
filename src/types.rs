// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// Failure domain a pipeline reports into.
///
/// Each category owns one error counter in the run state; the category
/// verdict is derived from that counter when the pipeline ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Style,
    ServerLint,
    ClientLint,
    Test,
    Coverage,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Style,
        Category::ServerLint,
        Category::ClientLint,
        Category::Test,
        Category::Coverage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Style => "style",
            Category::ServerLint => "server-lint",
            Category::ClientLint => "client-lint",
            Category::Test => "test",
            Category::Coverage => "coverage",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "invalid category: {wanted} (expected one of style, server-lint, client-lint, test, coverage)"
                )
            })
    }
}

/// How a task invocation treats a failing run.
///
/// - `Normal`: a failed run ends the process with a non-zero exit status.
/// - `Watch`: a failed run is only reported; the process keeps waiting for
///   the next file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Normal,
    Watch,
}

/// How an external tool is driven over its matched files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ToolMode {
    /// One process per matched file; each file is one unit result.
    PerFile,
    /// One process over all matched files.
    #[default]
    Batch,
    /// One process under coverage instrumentation, followed by threshold
    /// enforcement on the written summary.
    Coverage,
    /// Report generation (complexity report); no category counters.
    Report,
}
