//! Structural validation of a parsed pipeline configuration.
//!
//! Catches what the YAML schema alone cannot: unsupported versions,
//! unparseable stage refs, zero-valued resources. Plugin-level option
//! validation happens later, at stage application.

use anyhow::Result;

use crate::config::types::{parse_stage_ref, PipelineConfig};

const SUPPORTED_VERSION: &str = "1.0";

/// Validate a pipeline configuration before assembly.
///
/// # Errors
///
/// Returns the first structural problem found.
pub fn validate_pipeline(config: &PipelineConfig) -> Result<()> {
    if config.version != SUPPORTED_VERSION {
        anyhow::bail!(
            "Unsupported pipeline version '{}' (supported: {SUPPORTED_VERSION})",
            config.version
        );
    }
    if config.project.trim().is_empty() {
        anyhow::bail!("Pipeline 'project' must not be empty");
    }
    if config.source.use_ref.trim().is_empty() {
        anyhow::bail!("Source 'use' must not be empty");
    }
    if config.sink.use_ref.trim().is_empty() {
        anyhow::bail!("Sink 'use' must not be empty");
    }
    if let (Some(since), Some(until)) = (config.source.since, config.source.until) {
        if since >= until {
            anyhow::bail!("Source selection window is empty: since >= until");
        }
    }

    let mut seen = std::collections::HashSet::new();
    for stage in &config.stages {
        parse_stage_ref(&stage.use_ref)?;
        if !seen.insert(stage.use_ref.as_str()) {
            tracing::warn!(stage = stage.use_ref, "stage listed more than once");
        }
    }

    if config.resources.buffer_capacity == 0 {
        anyhow::bail!("resources.buffer_capacity must be positive");
    }
    if config.resources.sink_batch_size == 0 {
        anyhow::bail!("resources.sink_batch_size must be positive");
    }

    Ok(())
}
