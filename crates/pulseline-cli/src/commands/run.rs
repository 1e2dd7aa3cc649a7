use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use pulseline_engine::config::types::{parse_stage_ref, PipelineConfig};
use pulseline_engine::config::{parser, validator};
use pulseline_engine::lifecycle::{ProgressSink, RunLifecycle};
use pulseline_engine::source::{SelectionRange, Source};
use pulseline_engine::{run_pipeline, PipelineOptions, StagePlan};
use pulseline_plugins::builtin_registry;
use pulseline_plugins::jsonl::{JsonlSink, JsonlSource};
use pulseline_types::record::{ProjectId, RunId, RunRecord};

/// Options of the `jsonl` source/sink kinds.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonlConfig {
    path: String,
}

/// Execute the `run` command: parse, validate, and run a pipeline.
pub async fn execute(pipeline_path: &Path, run_id_override: Option<&str>) -> Result<()> {
    // 1. Parse pipeline YAML
    let config = parser::parse_pipeline(pipeline_path)
        .with_context(|| format!("Failed to parse pipeline: {}", pipeline_path.display()))?;

    // 2. Validate
    validator::validate_pipeline(&config)?;

    tracing::info!(
        project = config.project,
        source = config.source.use_ref,
        sink = config.sink.use_ref,
        stages = config.stages.len(),
        "Pipeline validated"
    );

    // 3. Run record: adopt the scheduler's id or create our own.
    let store = super::open_run_store(&config)?;
    let run_id = RunId::new(
        run_id_override
            .map(String::from)
            .or_else(|| config.run.id.clone())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
    );
    if store.get_run(&run_id)?.is_none() {
        let mut record = RunRecord::pending(run_id.clone(), ProjectId::new(config.project.clone()));
        record.log_path = config.run.log_path.clone();
        store.create_run(&record)?;
        tracing::info!(run = %run_id, "created run record");
    }
    let lifecycle = Arc::new(RunLifecycle::new(store, run_id.clone()));

    // 4. Collaborators and plugin registry
    let progress: Arc<dyn ProgressSink> = lifecycle.clone();
    let deps = super::standalone_deps(Some(progress));
    let registry = builtin_registry(&deps);

    // 5. Source, sink, stage plans
    let source = build_source(&config)?;
    let sink = build_sink(&config)?;
    let mut stages = Vec::with_capacity(config.stages.len());
    for section in &config.stages {
        let (family, name) = parse_stage_ref(&section.use_ref)?;
        stages.push(StagePlan::new(family, name, section.config.clone()));
    }

    let options = PipelineOptions {
        buffer_capacity: config.resources.buffer_capacity,
        sink_batch_size: config.resources.sink_batch_size,
        sink_flush_interval: Duration::from_millis(config.resources.sink_flush_ms),
    };

    // 6. Run
    let summary = run_pipeline(&registry, &stages, source, sink, Some(lifecycle), &options)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    println!("Run '{}' of project '{}' finished.", run_id, config.project);
    println!("  Items in:        {}", summary.items_in);
    println!("  Items persisted: {}", summary.items_persisted);
    if summary.batches_failed > 0 {
        println!("  Failed batches:  {}", summary.batches_failed);
    }
    println!("  Duration:        {:.2}s", summary.duration_secs);
    if summary.duration_secs > 0.0 {
        #[allow(clippy::cast_precision_loss)]
        let throughput = summary.items_in as f64 / summary.duration_secs;
        println!("  Throughput:      {throughput:.0} items/sec");
    }

    match &summary.stage_error {
        None => Ok(()),
        Some(err) => anyhow::bail!("Pipeline failed: {err}"),
    }
}

fn build_source(config: &PipelineConfig) -> Result<pulseline_engine::EntityStream<pulseline_types::entity::Message>> {
    let range = SelectionRange {
        since: config.source.since,
        until: config.source.until,
    };
    match config.source.use_ref.as_str() {
        "jsonl" => {
            let options: JsonlConfig =
                serde_json::from_value(config.source.config.as_value().clone())
                    .context("Invalid source config for 'jsonl'")?;
            JsonlSource::new(options.path).open(&range)
        }
        other => anyhow::bail!("Unknown source kind '{other}'"),
    }
}

fn build_sink(
    config: &PipelineConfig,
) -> Result<Arc<dyn pulseline_engine::sink::Sink<pulseline_types::entity::Message>>> {
    match config.sink.use_ref.as_str() {
        "jsonl" => {
            let options: JsonlConfig =
                serde_json::from_value(config.sink.config.as_value().clone())
                    .context("Invalid sink config for 'jsonl'")?;
            Ok(Arc::new(JsonlSink::open(options.path)?))
        }
        other => anyhow::bail!("Unknown sink kind '{other}'"),
    }
}
