//! Pipeline YAML configuration model.

use chrono::{DateTime, Utc};
use pulseline_types::config::StageConfig;
use serde::{Deserialize, Serialize};

/// Top-level pipeline definition, deserialized from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub version: String,
    /// Project the run belongs to.
    pub project: String,
    pub source: SourceSection,
    /// Enrichment stages, applied in order. May be empty.
    #[serde(default)]
    pub stages: Vec<StageSection>,
    pub sink: SinkSection,
    #[serde(default)]
    pub state: StateSection,
    #[serde(default)]
    pub run: RunSection,
    #[serde(default)]
    pub resources: ResourceSection,
}

/// Source selection: which collaborator produces the entity stream,
/// and the selection window it should cover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Source kind (e.g. `"jsonl"`).
    #[serde(rename = "use")]
    pub use_ref: String,
    #[serde(default)]
    pub config: StageConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
}

/// One enrichment stage: a `family/name` plugin ref plus its options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSection {
    #[serde(rename = "use")]
    pub use_ref: String,
    #[serde(default)]
    pub config: StageConfig,
}

/// Sink selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkSection {
    /// Sink kind (e.g. `"jsonl"`).
    #[serde(rename = "use")]
    pub use_ref: String,
    #[serde(default)]
    pub config: StageConfig,
}

/// Run store selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSection {
    #[serde(default)]
    pub backend: StateBackendKind,
    /// Database path; a default under the home directory when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            backend: StateBackendKind::Sqlite,
            connection: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateBackendKind {
    #[default]
    Sqlite,
}

/// Run identity: external scheduler id and log location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSection {
    /// Externally assigned run id; generated when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<String>,
}

/// Tunables for buffering and sink batching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSection {
    /// Backpressure buffer bound (items in flight).
    pub buffer_capacity: usize,
    /// Sink flush threshold (items per batch).
    pub sink_batch_size: usize,
    /// Sink flush interval for partial batches, in milliseconds.
    pub sink_flush_ms: u64,
}

impl Default for ResourceSection {
    fn default() -> Self {
        Self {
            buffer_capacity: 256,
            sink_batch_size: 100,
            sink_flush_ms: 500,
        }
    }
}

/// Split a `family/name` stage ref into its parts.
///
/// # Errors
///
/// Returns an error when the ref is not exactly two non-empty
/// `/`-separated segments.
pub fn parse_stage_ref(use_ref: &str) -> anyhow::Result<(String, String)> {
    match use_ref.split_once('/') {
        Some((family, name)) if !family.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((family.to_string(), name.to_string()))
        }
        _ => anyhow::bail!("invalid stage ref '{use_ref}', expected 'family/name'"),
    }
}
