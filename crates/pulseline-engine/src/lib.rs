//! Pipeline execution core for the Pulseline enrichment engine.
//!
//! Composes dynamically-resolved enrichment stages into one
//! asynchronous, backpressure-safe entity stream: plugin registry,
//! stage composition protocol, bounded buffering, group-by-key
//! fan-out/fan-in, completion coordination, and run lifecycle
//! reporting.

#![warn(clippy::pedantic)]

pub mod buffer;
pub mod config;
pub mod errors;
pub mod group;
pub mod latch;
pub mod lifecycle;
pub mod pipeline;
pub mod plugin;
pub mod registry;
pub mod sink;
pub mod source;
pub mod stream;
pub mod subscriber;

// Re-export public API for convenience
pub use errors::PipelineError;
pub use pipeline::{run_pipeline, PipelineOptions, RunSummary, StagePlan};
pub use plugin::{item_operator, Stage};
pub use registry::PluginRegistry;
pub use stream::{ConnectableStream, EntityStream};
