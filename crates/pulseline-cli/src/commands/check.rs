use std::path::Path;

use anyhow::{Context, Result};

use pulseline_engine::config::types::parse_stage_ref;
use pulseline_engine::config::{parser, validator};
use pulseline_plugins::builtin_registry;

/// Execute the `check` command: parse, validate, and verify that every
/// referenced plugin resolves — all without flowing a single item.
pub fn execute(pipeline_path: &Path) -> Result<()> {
    let config = parser::parse_pipeline(pipeline_path)
        .with_context(|| format!("Failed to parse pipeline: {}", pipeline_path.display()))?;
    validator::validate_pipeline(&config)?;
    println!("Configuration: OK");

    let deps = super::standalone_deps(None);
    let registry = builtin_registry(&deps);
    let mut failures = 0usize;
    for section in &config.stages {
        let (family, name) = parse_stage_ref(&section.use_ref)?;
        match registry.resolve(&family, &name) {
            Ok(_) => println!("Stage {family}/{name}: OK"),
            Err(err) => {
                failures += 1;
                println!("Stage {family}/{name}: FAILED — {err}");
            }
        }
    }

    match super::open_run_store(&config) {
        Ok(_) => println!("Run store: OK"),
        Err(err) => {
            failures += 1;
            println!("Run store: FAILED — {err}");
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} check(s) failed");
    }
    println!("Pipeline '{}' is ready to run.", config.project);
    Ok(())
}
