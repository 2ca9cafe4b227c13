//! Shared helpers for the taskgate integration tests.

pub mod builders;
pub mod fake_tool;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use std::time::Duration;

use taskgate::aggregate::Reporter;
use taskgate::config::ConfigFile;
use taskgate::fs::mock::MockFileSystem;
use taskgate::registry::{Orchestrator, OrchestratorBuilder, OrchestratorSettings, TaskRegistry};
use tracing_subscriber::{fmt, EnvFilter};

use crate::fake_tool::FakeToolBackend;

/// Root of the in-memory projects the tests build.
pub const PROJECT_ROOT: &str = "/project";

static INIT: Once = Once::new();

/// Initialise tracing once per test binary.
///
/// Output goes through the test writer, so it only shows for failing tests
/// (or with `-- --nocapture`). Levels come from `RUST_LOG`, e.g.
/// `RUST_LOG=taskgate=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// An in-memory project with the given files (relative to [`PROJECT_ROOT`]).
pub fn mock_project(files: &[(&str, &str)]) -> Arc<MockFileSystem> {
    let fs = MockFileSystem::new();
    for (rel, content) in files {
        fs.add_file(Path::new(PROJECT_ROOT).join(rel), content.as_bytes());
    }
    Arc::new(fs)
}

/// An orchestrator over `config` that runs scripted pipelines against an
/// in-memory project and never rings the bell.
pub fn test_orchestrator(
    config: &ConfigFile,
    backend: Arc<FakeToolBackend>,
    fs: Arc<MockFileSystem>,
) -> OrchestratorBuilder {
    let registry = TaskRegistry::from_config(config).expect("config should register cleanly");
    let settings = OrchestratorSettings::from_config(PathBuf::from(PROJECT_ROOT), config.settings());

    Orchestrator::builder(registry)
        .backend(backend)
        .filesystem(fs)
        .reporter(Reporter::quiet())
        .settings(settings)
}
