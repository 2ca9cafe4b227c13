// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use regex::Regex;

use crate::config::model::{ConfigFile, CoverageThresholds, RawConfigFile, TaskConfig, TaskKind};
use crate::errors::{Result, TaskgateError};
use crate::types::ToolMode;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TaskgateError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.coverage, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_thresholds(&cfg.coverage.thresholds)?;
    for (name, task) in cfg.task.iter() {
        validate_task_shape(name, task)?;
    }
    validate_task_references(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn config_error(msg: String) -> TaskgateError {
    TaskgateError::ConfigError(msg)
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(config_error(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_thresholds(t: &CoverageThresholds) -> Result<()> {
    let metrics = [
        ("statements", t.statements),
        ("branches", t.branches),
        ("lines", t.lines),
        ("functions", t.functions),
    ];
    for (metric, value) in metrics {
        if !(0.0..=100.0).contains(&value) {
            return Err(config_error(format!(
                "[coverage.thresholds].{metric} must be between 0 and 100 (got {value})"
            )));
        }
    }
    Ok(())
}

fn validate_task_shape(name: &str, task: &TaskConfig) -> Result<()> {
    match task.kind() {
        TaskKind::Watch => {
            if task.target.is_none() {
                return Err(config_error(format!(
                    "watch task '{name}' needs a `target` task to invoke"
                )));
            }
            if task.watch.as_ref().is_none_or(|w| w.is_empty()) {
                return Err(config_error(format!(
                    "watch task '{name}' needs at least one `watch` pattern"
                )));
            }
            if task.cmd.is_some() {
                return Err(config_error(format!(
                    "watch task '{name}' cannot also define `cmd`"
                )));
            }
        }
        TaskKind::Pipeline => validate_pipeline_task(name, task)?,
        TaskKind::Combo => {
            if task.after.is_empty() {
                return Err(config_error(format!(
                    "task '{name}' defines neither `cmd`, `watch` nor `after`"
                )));
            }
        }
    }
    Ok(())
}

fn validate_pipeline_task(name: &str, task: &TaskConfig) -> Result<()> {
    let needs_category = match task.mode {
        ToolMode::PerFile | ToolMode::Coverage => true,
        ToolMode::Batch => task.unit_pattern.is_some(),
        ToolMode::Report => false,
    };
    if needs_category && task.category.is_none() {
        return Err(config_error(format!(
            "task '{name}' reports unit results and needs a `category`"
        )));
    }
    if task.mode == ToolMode::Report && task.report_dir.is_none() {
        return Err(config_error(format!(
            "report task '{name}' needs a `report_dir`"
        )));
    }

    if let Some(pattern) = &task.count_pattern {
        let re = compile_pattern(name, "count_pattern", pattern)?;
        if re.captures_len() < 2 {
            return Err(config_error(format!(
                "task '{name}': `count_pattern` needs a capture group for the count"
            )));
        }
    }
    if let Some(pattern) = &task.unit_pattern {
        let re = compile_pattern(name, "unit_pattern", pattern)?;
        if !re.capture_names().flatten().any(|n| n == "file") {
            return Err(config_error(format!(
                "task '{name}': `unit_pattern` needs a named group `file`"
            )));
        }
    }
    Ok(())
}

fn compile_pattern(name: &str, field: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| config_error(format!("task '{name}': invalid `{field}`: {e}")))
}

fn validate_task_references(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(config_error(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(config_error(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }

        if let Some(target) = &task.target {
            let Some(target_cfg) = cfg.task.get(target) else {
                return Err(config_error(format!(
                    "watch task '{}' has unknown `target` '{}'",
                    name, target
                )));
            };
            if target_cfg.kind() == TaskKind::Watch {
                return Err(config_error(format!(
                    "watch task '{}' cannot target another watch task ('{}')",
                    name, target
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> task. A watch target counts as a dependency of
    // the watch task so a watcher can never end up re-invoking itself.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter().chain(task.target.iter()) {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(TaskgateError::CyclicDependency(format!(
                "cycle detected in task graph involving task '{}'",
                node
            )))
        }
    }
}
