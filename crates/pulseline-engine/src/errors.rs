//! Pipeline error model.

use pulseline_types::error::{ConfigError, PluginNotFoundError, StageError};

// ---------------------------------------------------------------------------
// PipelineError — categorised errors for assembly vs. execution
// ---------------------------------------------------------------------------

/// Categorized pipeline error.
///
/// `Config` and `PluginNotFound` are assembly failures: they surface
/// before any item flows and fail the whole launch. `Stage` is a
/// stream-level failure that terminated one branch. `Infrastructure`
/// wraps opaque host-side errors (state store, task join, source open).
#[derive(Debug)]
pub enum PipelineError {
    /// A stage configuration could not be built.
    Config(ConfigError),
    /// A stage name could not be resolved.
    PluginNotFound(PluginNotFoundError),
    /// A stage raised while processing.
    Stage(StageError),
    /// Infrastructure error (state store, task join, source open, etc.)
    Infrastructure(anyhow::Error),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::PluginNotFound(e) => write!(f, "{e}"),
            Self::Stage(e) => write!(f, "{e}"),
            Self::Infrastructure(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<PluginNotFoundError> for PipelineError {
    fn from(e: PluginNotFoundError) -> Self {
        Self::PluginNotFound(e)
    }
}

impl From<StageError> for PipelineError {
    fn from(e: StageError) -> Self {
        Self::Stage(e)
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(e: anyhow::Error) -> Self {
        Self::Infrastructure(e)
    }
}

impl PipelineError {
    /// `true` for failures that prevent the pipeline from assembling
    /// (vs. failures observed while items were flowing).
    #[must_use]
    pub fn is_assembly(&self) -> bool {
        matches!(self, Self::Config(_) | Self::PluginNotFound(_))
    }
}
