//! Grouped batch indexing keyed by language.

use std::sync::Arc;

use pulseline_engine::group::{group_by_key, BatchOperator};
use pulseline_engine::lifecycle::ProgressSink;
use pulseline_engine::plugin::Stage;
use pulseline_engine::stream::EntityStream;
use pulseline_types::config::StageConfig;
use pulseline_types::entity::Message;
use pulseline_types::error::{ConfigError, StageError};
use serde::Deserialize;

/// Default batch size when the option is omitted or zero.
const DEFAULT_BATCH_SIZE: usize = 20;

/// External indexing platform boundary. Owns its own wire format,
/// timeouts, and retry policy.
pub trait IndexService: Send + Sync {
    /// Index one batch of messages sharing a language.
    ///
    /// # Errors
    ///
    /// Returns an error when the batch could not be indexed; the
    /// grouped stage logs it and lets the messages flow on.
    fn index_batch(&self, language: &str, batch: &[Message]) -> anyhow::Result<()>;
}

/// [`IndexService`] that only logs, for standalone runs and tests.
pub struct LogIndexService;

impl IndexService for LogIndexService {
    fn index_batch(&self, language: &str, batch: &[Message]) -> anyhow::Result<()> {
        tracing::info!(language, batch = batch.len(), "indexing batch");
        Ok(())
    }
}

/// Options for `index/grouped`.
///
/// Unknown options are rejected. `batch_size: 0` substitutes the
/// documented default of 20 with a warning.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct IndexOptions {
    batch_size: usize,
    /// Languages the indexing platform supports; batches of any other
    /// language pass through unindexed.
    languages: Vec<String>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            languages: vec!["it".into(), "en".into()],
        }
    }
}

/// Fans the stream out by language, indexes supported languages in
/// batches, and merges everything back. Unsupported languages flow
/// through unchanged; per-element progress is published around each
/// batch call.
pub struct GroupedIndexer {
    service: Arc<dyn IndexService>,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl GroupedIndexer {
    #[must_use]
    pub fn new(service: Arc<dyn IndexService>, progress: Option<Arc<dyn ProgressSink>>) -> Self {
        Self { service, progress }
    }
}

struct IndexBatchOperator {
    service: Arc<dyn IndexService>,
    languages: Vec<String>,
}

impl BatchOperator<Message> for IndexBatchOperator {
    fn process(&self, key: &str, batch: Vec<Message>) -> Result<Vec<Message>, StageError> {
        if !self.languages.iter().any(|l| l == key) {
            return Ok(batch);
        }
        self.service
            .index_batch(key, &batch)
            .map_err(|err| StageError::new("index-grouped", err.to_string()))?;
        Ok(batch)
    }
}

impl Stage<Message> for GroupedIndexer {
    fn name(&self) -> &str {
        "grouped"
    }

    fn apply(
        &self,
        config: &StageConfig,
        input: EntityStream<Message>,
    ) -> Result<EntityStream<Message>, ConfigError> {
        let mut options: IndexOptions = config.parse()?;
        if options.batch_size == 0 {
            tracing::warn!(
                default = DEFAULT_BATCH_SIZE,
                "batch_size 0 is not usable, substituting default"
            );
            options.batch_size = DEFAULT_BATCH_SIZE;
        }

        let operator = Arc::new(IndexBatchOperator {
            service: self.service.clone(),
            languages: options.languages,
        });
        Ok(group_by_key(
            input,
            |m: &Message| m.language.clone().unwrap_or_else(|| "und".into()),
            options.batch_size,
            operator,
            self.progress.clone(),
        ))
    }
}
