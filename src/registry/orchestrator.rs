// src/registry/orchestrator.rs

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::aggregate::{aggregate, CategoryVerdict, Reporter};
use crate::config::model::ConfigSection;
use crate::dag::Scheduler;
use crate::errors::{Result, TaskgateError};
use crate::fs::{total_size, FileSystem, RealFileSystem};
use crate::pipeline::{RealToolBackend, ToolBackend, ToolRequest};
use crate::registry::descriptor::{PipelineTask, TaskAction, WatchTask};
use crate::registry::TaskRegistry;
use crate::state::RunState;
use crate::termination::TerminationController;
use crate::types::{RunMode, TaskName};
use crate::watch::{collect_matching_files, ChangeSource, NotifyChangeSource, PatternSet, WatchTrigger};

/// Project-level settings the orchestrator needs at run time.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Project root; file patterns and commands are relative to it.
    pub root: PathBuf,
    pub ignore_dirs: Vec<String>,
    pub report_stream_size: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(PathBuf::from("."), &ConfigSection::default())
    }
}

impl OrchestratorSettings {
    pub fn from_config(root: PathBuf, cfg: &ConfigSection) -> Self {
        Self {
            root,
            ignore_dirs: cfg.ignore_dirs.clone(),
            report_stream_size: cfg.report_stream_size,
        }
    }
}

/// Result of one invocation: the merged state of the task and everything it
/// ran, plus the verdict of every pipeline.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub task: TaskName,
    pub mode: RunMode,
    pub state: RunState,
    pub verdicts: BTreeMap<TaskName, CategoryVerdict>,
}

impl Outcome {
    pub fn failed(&self) -> bool {
        self.state.run_failed()
    }

    pub fn verdict(&self, task: &str) -> Option<&CategoryVerdict> {
        self.verdicts.get(task)
    }
}

/// What executing a single task (not its dependencies) produced.
#[derive(Debug, Default)]
struct TaskReport {
    state: RunState,
    verdict: Option<CategoryVerdict>,
}

struct Inner {
    registry: TaskRegistry,
    backend: Arc<dyn ToolBackend>,
    fs: Arc<dyn FileSystem>,
    change_source: Arc<dyn ChangeSource>,
    reporter: Reporter,
    settings: OrchestratorSettings,
    shutdown: watch::Sender<bool>,
    watch_outcomes: Option<mpsc::UnboundedSender<Outcome>>,
}

/// Invokes registered tasks.
///
/// Cheap to clone; clones share the registry, backends and the shutdown
/// signal.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("tasks", &self.inner.registry.len())
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Orchestrator`]; every seam defaults to its production
/// implementation.
pub struct OrchestratorBuilder {
    registry: TaskRegistry,
    backend: Option<Arc<dyn ToolBackend>>,
    fs: Option<Arc<dyn FileSystem>>,
    change_source: Option<Arc<dyn ChangeSource>>,
    reporter: Reporter,
    settings: OrchestratorSettings,
    watch_outcomes: Option<mpsc::UnboundedSender<Outcome>>,
}

impl OrchestratorBuilder {
    pub fn backend(mut self, backend: Arc<dyn ToolBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    pub fn change_source(mut self, source: Arc<dyn ChangeSource>) -> Self {
        self.change_source = Some(source);
        self
    }

    pub fn reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Receive the outcome of every run a watch task triggers.
    pub fn watch_outcomes(mut self, tx: mpsc::UnboundedSender<Outcome>) -> Self {
        self.watch_outcomes = Some(tx);
        self
    }

    pub fn build(self) -> Orchestrator {
        let fs: Arc<dyn FileSystem> = self.fs.unwrap_or_else(|| Arc::new(RealFileSystem));
        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(RealToolBackend::new(Arc::clone(&fs))));
        let change_source = self
            .change_source
            .unwrap_or_else(|| Arc::new(NotifyChangeSource));
        let (shutdown, _) = watch::channel(false);

        Orchestrator {
            inner: Arc::new(Inner {
                registry: self.registry,
                backend,
                fs,
                change_source,
                reporter: self.reporter,
                settings: self.settings,
                shutdown,
                watch_outcomes: self.watch_outcomes,
            }),
        }
    }
}

type BoxedInvocation = Pin<Box<dyn Future<Output = Result<Outcome>> + Send + 'static>>;

impl Orchestrator {
    pub fn builder(registry: TaskRegistry) -> OrchestratorBuilder {
        OrchestratorBuilder {
            registry,
            backend: None,
            fs: None,
            change_source: None,
            reporter: Reporter::default(),
            settings: OrchestratorSettings::default(),
            watch_outcomes: None,
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.inner.registry
    }

    pub fn reporter(&self) -> &Reporter {
        &self.inner.reporter
    }

    /// Ask running watch tasks to stop once their current run is done.
    pub fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
    }

    /// Run `name` after all of its dependencies.
    ///
    /// Dependencies that become ready together run concurrently, each with
    /// its own run state merged into the returned outcome. A dependent runs
    /// even when one of its dependencies failed.
    pub async fn invoke(&self, name: &str, mode: RunMode) -> Result<Outcome> {
        let mut scheduler = Scheduler::for_task(&self.inner.registry, name)?;
        info!(task = name, ?mode, tasks = scheduler.graph().len(), "invoking task");

        let mut state = RunState::new();
        let mut verdicts = BTreeMap::new();
        let mut running: JoinSet<(TaskName, Result<TaskReport>)> = JoinSet::new();

        loop {
            for task in scheduler.ready() {
                let this = self.clone();
                running.spawn(async move {
                    let report = this.execute(&task, mode).await;
                    (task, report)
                });
            }

            if scheduler.is_finished() {
                break;
            }

            let Some(joined) = running.join_next().await else {
                // Nothing running but not finished: the graph cannot make
                // progress. Acyclic registries never get here.
                return Err(TaskgateError::Pipeline(format!(
                    "invocation of '{name}' stalled"
                )));
            };
            let (task, report) = joined
                .map_err(|e| TaskgateError::Pipeline(format!("task panicked: {e}")))?;
            let report = report?;

            let success = !report.state.run_failed();
            state.merge(&report.state);
            if let Some(verdict) = report.verdict {
                verdicts.insert(task.clone(), verdict);
            }
            scheduler.complete(&task, success);
        }

        let failed_tasks = scheduler.failed_tasks();
        if failed_tasks.is_empty() {
            debug!(task = name, "invocation finished");
        } else {
            debug!(task = name, failed = ?failed_tasks, "invocation finished with failures");
        }

        Ok(Outcome {
            task: name.to_string(),
            mode,
            state,
            verdicts,
        })
    }

    /// `invoke` behind a named future type, for re-entrant invocation from a
    /// watch task.
    fn invoke_boxed(&self, name: TaskName, mode: RunMode) -> BoxedInvocation {
        let this = self.clone();
        Box::pin(async move { this.invoke(&name, mode).await })
    }

    async fn execute(&self, name: &str, mode: RunMode) -> Result<TaskReport> {
        let descriptor = self.inner.registry.lookup(name)?;
        match &descriptor.action {
            TaskAction::Pipeline(pipeline) => self.run_pipeline(name, pipeline).await,
            TaskAction::Combo => {
                debug!(task = name, "combo task complete");
                Ok(TaskReport::default())
            }
            TaskAction::Watch(watch) => {
                if mode == RunMode::Watch {
                    warn!(task = name, "watch task invoked from a watch run; skipping");
                    return Ok(TaskReport::default());
                }
                self.run_watch(name, watch).await
            }
        }
    }

    async fn run_pipeline(&self, name: &str, task: &PipelineTask) -> Result<TaskReport> {
        let settings = &self.inner.settings;
        let reporter = &self.inner.reporter;

        let files = self.resolve_files(&task.files).await?;
        if !task.files.is_empty() && files.is_empty() {
            warn!(task = name, patterns = ?task.files, "no files matched; nothing to check");
            reporter.pass(name, task.category);
            return Ok(TaskReport {
                state: RunState::new(),
                verdict: Some(CategoryVerdict::Passed),
            });
        }

        debug!(task = name, files = files.len(), "starting pipeline");
        let mut pipeline = self.inner.backend.start(ToolRequest {
            task: name.to_string(),
            category: task.category,
            tool: task.tool.clone(),
            files: files.clone(),
            root: settings.root.clone(),
        });

        let mut state = RunState::new();
        let verdict = aggregate(name, &mut pipeline, &mut state, reporter).await;

        if settings.report_stream_size {
            let bytes = total_size(self.inner.fs.as_ref(), &files);
            reporter.stream_size(name, files.len(), bytes);
        }

        Ok(TaskReport {
            state,
            verdict: Some(verdict),
        })
    }

    async fn resolve_files(&self, patterns: &[String]) -> Result<Vec<PathBuf>> {
        if patterns.is_empty() {
            return Ok(Vec::new());
        }
        let set = PatternSet::new(patterns)?;
        let fs = Arc::clone(&self.inner.fs);
        let root = self.inner.settings.root.clone();
        let ignore_dirs = self.inner.settings.ignore_dirs.clone();

        let files = tokio::task::spawn_blocking(move || {
            collect_matching_files(fs.as_ref(), &root, &set, &ignore_dirs)
        })
        .await
        .map_err(|e| TaskgateError::Pipeline(format!("file resolution panicked: {e}")))??;
        Ok(files)
    }

    async fn run_watch(&self, name: &str, task: &WatchTask) -> Result<TaskReport> {
        let root: &Path = &self.inner.settings.root;
        let patterns = PatternSet::new(&task.patterns)?;
        let subscription = self.inner.change_source.subscribe(root)?;
        let shutdown = self.inner.shutdown.subscribe();
        let controller = TerminationController::new(RunMode::Watch, self.inner.reporter.clone());

        let trigger = WatchTrigger::new(
            name,
            task.target.clone(),
            root,
            patterns,
            Arc::clone(&self.inner.fs),
            task.use_hash,
        );

        let target = task.target.clone();
        let observer = self.inner.watch_outcomes.clone();
        let controller = &controller;
        let runs = trigger
            .run(subscription.changes, shutdown, move || {
                let invocation = self.invoke_boxed(target.clone(), RunMode::Watch);
                let observer = observer.clone();
                let target = target.clone();
                async move {
                    match invocation.await {
                        Ok(outcome) => {
                            controller.conclude(&outcome);
                            controller.rearm();
                            if let Some(tx) = observer {
                                let _ = tx.send(outcome);
                            }
                        }
                        Err(err) => error!(task = %target, error = %err, "watch run could not start"),
                    }
                }
            })
            .await;

        info!(task = name, runs, "watch task stopped");
        Ok(TaskReport::default())
    }
}
