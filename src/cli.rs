// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `taskgate`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskgate",
    version,
    about = "Run lint, style, test and coverage tasks and gate the exit code on their outcome.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to invoke (e.g. `ci`, `lint`, `watch`).
    #[arg(value_name = "TASK", default_value = "ci")]
    pub task: String,

    /// Path to the config file (TOML).
    ///
    /// If omitted, `Taskgate.toml` in the project root is used when present,
    /// otherwise the built-in task catalogue runs unchanged.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Project root that file patterns are resolved against.
    ///
    /// Default: the directory containing the config file, or `.`.
    #[arg(long, value_name = "DIR")]
    pub root: Option<String>,

    /// List the visible tasks and exit.
    #[arg(long)]
    pub list: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKGATE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the task plan, but don't run any tool.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
