//! Pipeline assembly and execution.
//!
//! Resolves every stage up front, composes the stream, interposes the
//! backpressure buffer and the lifecycle wrapper, drives a raw counting
//! branch and a sink branch off one connectable source, and blocks on
//! the completion latch until both report terminal events.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pulseline_types::config::StageConfig;
use pulseline_types::entity::Entity;
use pulseline_types::error::StageError;

use crate::buffer::spawn_buffered;
use crate::errors::PipelineError;
use crate::latch::CompletionLatch;
use crate::lifecycle::RunLifecycle;
use crate::registry::PluginRegistry;
use crate::sink::Sink;
use crate::stream::{ConnectableStream, EntityStream};
use crate::subscriber::{drive, drive_sink};

/// One resolved-by-name stage of a pipeline.
#[derive(Debug, Clone)]
pub struct StagePlan {
    pub family: String,
    pub name: String,
    pub config: StageConfig,
}

impl StagePlan {
    #[must_use]
    pub fn new(family: impl Into<String>, name: impl Into<String>, config: StageConfig) -> Self {
        Self {
            family: family.into(),
            name: name.into(),
            config,
        }
    }
}

/// Execution tunables, from the pipeline config's `resources` section.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub buffer_capacity: usize,
    pub sink_batch_size: usize,
    pub sink_flush_interval: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: crate::buffer::DEFAULT_CAPACITY,
            sink_batch_size: 100,
            sink_flush_interval: Duration::from_millis(500),
        }
    }
}

/// What one pipeline execution observed.
#[derive(Debug)]
pub struct RunSummary {
    /// Items the source emitted (raw branch count).
    pub items_in: u64,
    /// Items durably handed to the sink.
    pub items_persisted: u64,
    /// Sink batches that failed and were skipped (best-effort policy).
    pub batches_failed: u64,
    pub duration_secs: f64,
    /// The stage error that terminated the enrichment branch, if any.
    pub stage_error: Option<StageError>,
}

impl RunSummary {
    /// `true` when the enrichment branch ran to completion.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.stage_error.is_none()
    }
}

/// Assemble and execute a pipeline, returning once every branch has
/// reported its terminal event.
///
/// Stage resolution and configuration failures surface here before any
/// item flows. A stage error during execution does not fail the call:
/// it is captured in the summary (and in the run record, when a
/// lifecycle is attached), because sibling branches still complete and
/// their progress is real.
///
/// # Errors
///
/// Returns [`PipelineError::PluginNotFound`] or
/// [`PipelineError::Config`] on assembly failure, and
/// [`PipelineError::Infrastructure`] when a branch task dies.
pub async fn run_pipeline<E: Entity>(
    registry: &PluginRegistry<E>,
    stages: &[StagePlan],
    source: EntityStream<E>,
    sink: Arc<dyn Sink<E>>,
    lifecycle: Option<Arc<RunLifecycle>>,
    options: &PipelineOptions,
) -> Result<RunSummary, PipelineError> {
    let start = Instant::now();

    // Resolve everything before a single item flows.
    let mut resolved = Vec::with_capacity(stages.len());
    for plan in stages {
        let plugin = registry.resolve(&plan.family, &plan.name)?;
        resolved.push((plugin, plan.config.clone()));
    }
    // One connectable source, two branches: raw count + enrichment.
    let mut connectable = ConnectableStream::new(source);
    let raw = connectable.subscribe(options.buffer_capacity);
    let mut enriched = connectable.subscribe(options.buffer_capacity);

    for (plugin, config) in &resolved {
        enriched = plugin.apply(config, enriched)?;
    }
    tracing::info!(stages = resolved.len(), "pipeline assembled");

    if let Some(lc) = &lifecycle {
        lc.record_started();
    }
    enriched = spawn_buffered(enriched, options.buffer_capacity);
    if let Some(lc) = &lifecycle {
        enriched = lc.wrap(enriched);
    }

    let latch = Arc::new(CompletionLatch::new(2));
    let raw_branch = drive("raw", raw, latch.clone());
    let sink_branch = drive_sink(
        "sink",
        enriched,
        sink,
        options.sink_batch_size,
        options.sink_flush_interval,
        latch.clone(),
    );
    drop(connectable.connect());

    latch.wait().await;

    let raw_outcome = raw_branch
        .await
        .map_err(|e| PipelineError::Infrastructure(anyhow::anyhow!("raw branch panicked: {e}")))?;
    let sink_outcome = sink_branch
        .await
        .map_err(|e| PipelineError::Infrastructure(anyhow::anyhow!("sink branch panicked: {e}")))?;

    let summary = RunSummary {
        items_in: raw_outcome.items,
        items_persisted: sink_outcome.items_persisted,
        batches_failed: sink_outcome.batches_failed,
        duration_secs: start.elapsed().as_secs_f64(),
        stage_error: sink_outcome.error,
    };
    tracing::info!(
        items_in = summary.items_in,
        items_persisted = summary.items_persisted,
        batches_failed = summary.batches_failed,
        succeeded = summary.succeeded(),
        "pipeline run complete"
    );
    Ok(summary)
}
