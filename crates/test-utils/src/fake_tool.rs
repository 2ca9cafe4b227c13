use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use taskgate::pipeline::{
    Pipeline, PipelineEvent, PipelineFailure, PipelineResult, ToolBackend, ToolRequest,
};
use taskgate::types::{Category, TaskName};
use taskgate::watch::{ChangeSource, ChangeSubscription};

/// Events one pipeline run emits, in order.
pub type Script = Vec<PipelineEvent>;

/// Every file passes.
pub fn passing(category: Category, files: &[&str]) -> Script {
    files
        .iter()
        .map(|f| PipelineEvent::Unit(PipelineResult::passed(category, *f)))
        .chain(std::iter::once(PipelineEvent::End))
        .collect()
}

/// One unit per `(file, violations)`; zero violations means the file passed.
pub fn units(category: Category, files: &[(&str, u64)]) -> Script {
    files
        .iter()
        .map(|(f, n)| {
            let result = if *n == 0 {
                PipelineResult::passed(category, *f)
            } else {
                PipelineResult::failed(category, *f, *n)
            };
            PipelineEvent::Unit(result)
        })
        .chain(std::iter::once(PipelineEvent::End))
        .collect()
}

/// The tool breaks down after emitting `before`.
pub fn crashed(category: Option<Category>, before: Script, message: &str) -> Script {
    before
        .into_iter()
        .chain(std::iter::once(PipelineEvent::Failed(PipelineFailure {
            category,
            message: message.to_string(),
        })))
        .collect()
}

/// A tool backend that replays scripted pipelines instead of running tools.
///
/// - Scripts are queued per task; each start consumes the next one and the
///   last script repeats once the queue is down to one.
/// - A task without any script ends immediately with no units.
/// - Every request is recorded.
pub struct FakeToolBackend {
    scripts: Mutex<HashMap<TaskName, VecDeque<Script>>>,
    requests: Arc<Mutex<Vec<ToolRequest>>>,
    started: watch::Sender<usize>,
}

impl FakeToolBackend {
    pub fn new() -> Self {
        let (started, _) = watch::channel(0);
        Self {
            scripts: Mutex::new(HashMap::new()),
            requests: Arc::new(Mutex::new(Vec::new())),
            started,
        }
    }

    pub fn script(self, task: &str, script: Script) -> Self {
        self.push_script(task, script);
        self
    }

    pub fn push_script(&self, task: &str, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .entry(task.to_string())
            .or_default()
            .push_back(script);
    }

    /// Names of started tasks, in start order.
    pub fn started_tasks(&self) -> Vec<TaskName> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.task.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<ToolRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Wait until at least `n` pipelines have been started.
    pub async fn wait_for_starts(&self, n: usize) {
        let mut rx = self.started.subscribe();
        rx.wait_for(|count| *count >= n)
            .await
            .expect("fake backend dropped");
    }

    fn next_script(&self, task: &str) -> Script {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(task) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_default(),
            Some(queue) => queue.front().cloned().unwrap_or_default(),
            None => vec![PipelineEvent::End],
        }
    }
}

impl Default for FakeToolBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolBackend for FakeToolBackend {
    fn start(&self, request: ToolRequest) -> Pipeline {
        let script = self.next_script(&request.task);
        let (sink, pipeline) = Pipeline::channel(request.category);
        self.requests.lock().unwrap().push(request);
        self.started.send_modify(|count| *count += 1);

        tokio::spawn(async move {
            for event in script {
                match event {
                    PipelineEvent::Unit(result) => {
                        if !sink.unit(result).await {
                            return;
                        }
                    }
                    PipelineEvent::End => {
                        sink.end().await;
                        return;
                    }
                    PipelineEvent::Failed(failure) => {
                        sink.fail(failure.message).await;
                        return;
                    }
                }
            }
            // A script without a terminal event drops the sink.
        });

        pipeline
    }
}

/// Change source driven by the test through a plain channel.
///
/// Only the first subscription receives the changes; dropping the sender
/// ends the watch loop.
pub struct ManualChangeSource {
    rx: Mutex<Option<mpsc::UnboundedReceiver<PathBuf>>>,
}

impl ManualChangeSource {
    pub fn new() -> (Self, mpsc::UnboundedSender<PathBuf>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                rx: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

impl ChangeSource for ManualChangeSource {
    fn subscribe(&self, _root: &Path) -> anyhow::Result<ChangeSubscription> {
        let rx = self
            .rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| anyhow::anyhow!("manual change source already subscribed"))?;
        Ok(ChangeSubscription::from_receiver(rx))
    }
}
