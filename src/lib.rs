// src/lib.rs

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod registry;
pub mod state;
pub mod termination;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use crate::aggregate::Reporter;
use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_and_validate, load_defaults};
use crate::config::model::ConfigFile;
use crate::dag::Scheduler;
use crate::registry::{Orchestrator, OrchestratorSettings, TaskAction, TaskRegistry};
use crate::termination::{Termination, TerminationController};
use crate::types::RunMode;

/// High-level entry point used by `main.rs`; returns the process exit code.
///
/// This wires together:
/// - config loading (built-in catalogue plus `Taskgate.toml`)
/// - the task registry and orchestrator
/// - Ctrl-C handling
/// - the termination decision for the invoked task
pub async fn run(args: CliArgs) -> Result<i32> {
    let (cfg, config_path) = load_config(&args)?;
    let root = project_root(&args, config_path.as_deref());
    let registry = TaskRegistry::from_config(&cfg)?;
    info!(tasks = registry.len(), root = ?root, config = ?config_path, "configuration loaded");

    if args.list {
        print_listing(&registry);
        return Ok(0);
    }

    if args.dry_run {
        print_dry_run(&registry, &args.task, &root)?;
        return Ok(0);
    }

    let reporter = Reporter::new(cfg.settings().bell);
    let orchestrator = Orchestrator::builder(registry)
        .reporter(reporter.clone())
        .settings(OrchestratorSettings::from_config(root, cfg.settings()))
        .build();

    let invocation = orchestrator.invoke(&args.task, RunMode::Normal);
    tokio::pin!(invocation);

    let outcome = tokio::select! {
        outcome = &mut invocation => outcome?,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                bail!("failed to listen for Ctrl+C: {e}");
            }
            info!("Ctrl-C received; finishing the current run");
            orchestrator.shutdown();
            tokio::select! {
                outcome = &mut invocation => outcome?,
                _ = tokio::signal::ctrl_c() => {
                    warn!("second Ctrl-C; aborting");
                    return Ok(130);
                }
            }
        }
    };

    let controller = TerminationController::new(RunMode::Normal, reporter);
    match controller.conclude(&outcome) {
        Termination::Exit(code) => Ok(code),
        Termination::Continue => Ok(0),
    }
}

/// Resolve the configuration.
///
/// An explicit `--config` must exist. Otherwise `Taskgate.toml` in the
/// project root is used when present, and the built-in catalogue when not.
fn load_config(args: &CliArgs) -> Result<(ConfigFile, Option<PathBuf>)> {
    if let Some(path) = &args.config {
        let path = PathBuf::from(path);
        if !path.is_file() {
            bail!("config file {path:?} does not exist");
        }
        return Ok((load_and_validate(&path)?, Some(path)));
    }

    let candidate = match &args.root {
        Some(root) => Path::new(root).join(default_config_path()),
        None => default_config_path(),
    };
    if candidate.is_file() {
        return Ok((load_and_validate(&candidate)?, Some(candidate)));
    }

    debug!(?candidate, "no config file; using the built-in task catalogue");
    Ok((load_defaults()?, None))
}

/// Figure out the project root.
///
/// - `--root` wins.
/// - Otherwise the directory of the config file, if it has a non-empty
///   parent (e.g. "configs/Taskgate.toml").
/// - Otherwise the current working directory.
fn project_root(args: &CliArgs, config_path: Option<&Path>) -> PathBuf {
    if let Some(root) = &args.root {
        return PathBuf::from(root);
    }
    match config_path.and_then(Path::parent) {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn print_listing(registry: &TaskRegistry) {
    let tasks = registry.listing();
    let width = tasks.iter().map(|t| t.name.len()).max().unwrap_or(0);
    for task in tasks {
        println!("  {:<width$}  {}", task.name, task.description);
    }
}

/// Print the tasks `task` would run, in a valid execution order.
fn print_dry_run(registry: &TaskRegistry, task: &str, root: &Path) -> Result<()> {
    let mut scheduler = Scheduler::for_task(registry, task)?;

    println!("taskgate dry-run");
    println!("  root = {}", root.display());
    println!("  task = {task}");
    println!();

    let mut wave = 1;
    loop {
        let ready = scheduler.ready();
        if ready.is_empty() {
            break;
        }
        println!("wave {wave}:");
        for name in &ready {
            let descriptor = registry.lookup(name)?;
            println!("  - {name}");
            if !descriptor.dependencies.is_empty() {
                println!("      after: {:?}", descriptor.dependencies);
            }
            match &descriptor.action {
                TaskAction::Pipeline(p) => {
                    if let Some(category) = p.category {
                        println!("      category: {category}");
                    }
                    println!("      mode: {:?}", p.tool.mode);
                    println!("      cmd: {}", p.tool.cmd);
                    if !p.files.is_empty() {
                        println!("      files: {:?}", p.files);
                    }
                }
                TaskAction::Combo => println!("      combo"),
                TaskAction::Watch(w) => {
                    println!("      watch: {:?}", w.patterns);
                    println!("      target: {}", w.target);
                    if w.use_hash {
                        println!("      use_hash: true");
                    }
                }
            }
        }
        for name in ready {
            scheduler.complete(&name, true);
        }
        wave += 1;
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
