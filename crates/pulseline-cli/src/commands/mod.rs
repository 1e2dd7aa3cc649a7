pub mod check;
pub mod plugins;
pub mod run;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use pulseline_engine::config::types::{PipelineConfig, StateBackendKind};
use pulseline_engine::lifecycle::ProgressSink;
use pulseline_plugins::index::LogIndexService;
use pulseline_plugins::repository::{InMemoryMessageRepository, InMemoryProfileRepository};
use pulseline_plugins::PluginDeps;
use pulseline_state::{RunStore, SqliteRunStore};

/// Open the run store configured in the pipeline file.
pub(crate) fn open_run_store(config: &PipelineConfig) -> Result<Arc<dyn RunStore>> {
    match config.state.backend {
        StateBackendKind::Sqlite => {
            let path = if let Some(connection) = &config.state.connection {
                PathBuf::from(connection)
            } else {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".pulseline").join("state.db")
            };
            let store =
                SqliteRunStore::open(&path).context("Failed to open run state DB")?;
            let store: Arc<dyn RunStore> = Arc::new(store);
            Ok(store)
        }
    }
}

/// Collaborators for standalone CLI runs: in-memory repositories and a
/// logging index service. Deployments wire real backends here.
pub(crate) fn standalone_deps(progress: Option<Arc<dyn ProgressSink>>) -> PluginDeps {
    PluginDeps {
        messages: Arc::new(InMemoryMessageRepository::new()),
        profiles: Arc::new(InMemoryProfileRepository::new()),
        index: Arc::new(LogIndexService),
        progress,
    }
}
