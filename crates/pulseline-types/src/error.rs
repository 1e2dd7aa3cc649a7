//! Error taxonomy shared across the pipeline core.

/// A stage configuration could not be built.
///
/// Fatal to pipeline assembly: surfaces before any item flows.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration document does not match the plugin's options.
    #[error("malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A recognized option carried a value the plugin cannot accept.
    #[error("invalid value for option '{option}': {reason}")]
    InvalidValue { option: String, reason: String },
}

impl ConfigError {
    /// Build an [`ConfigError::InvalidValue`] with owned fields.
    #[must_use]
    pub fn invalid_value(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

/// No plugin is registered under the requested family and name.
///
/// Distinguishable from transformation-time errors; resolution failure
/// leaves no partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no plugin named '{name}' in family '{family}'")]
pub struct PluginNotFoundError {
    pub family: String,
    pub name: String,
}

impl PluginNotFoundError {
    #[must_use]
    pub fn new(family: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            name: name.into(),
        }
    }
}

/// A stage raised while processing an item or a batch.
///
/// Terminates the stream it occurred on; sibling streams sharing the
/// same source keep flowing. Clonable so it can travel through
/// multicast fan-out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stage '{stage}' failed{}: {message}", entity_suffix(.entity_id))]
pub struct StageError {
    /// Name of the stage that raised.
    pub stage: String,
    /// Identifier of the entity being processed, when known.
    pub entity_id: Option<String>,
    pub message: String,
}

impl StageError {
    /// A stage-level failure not tied to one entity.
    #[must_use]
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            entity_id: None,
            message: message.into(),
        }
    }

    /// A failure raised while processing one specific entity.
    #[must_use]
    pub fn for_entity(
        stage: impl Into<String>,
        entity_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage: stage.into(),
            entity_id: Some(entity_id.into()),
            message: message.into(),
        }
    }
}

fn entity_suffix(entity_id: &Option<String>) -> String {
    entity_id
        .as_ref()
        .map(|id| format!(" on entity '{id}'"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_not_found_names_both_parts() {
        let err = PluginNotFoundError::new("tagger", "wikipedia");
        assert_eq!(
            err.to_string(),
            "no plugin named 'wikipedia' in family 'tagger'"
        );
    }

    #[test]
    fn stage_error_without_entity() {
        let err = StageError::new("sentiment", "model unavailable");
        assert_eq!(err.to_string(), "stage 'sentiment' failed: model unavailable");
    }

    #[test]
    fn stage_error_with_entity() {
        let err = StageError::for_entity("tokenize", "42", "empty text");
        assert_eq!(
            err.to_string(),
            "stage 'tokenize' failed on entity '42': empty text"
        );
    }

    #[test]
    fn config_error_invalid_value_displays_option() {
        let err = ConfigError::invalid_value("batch_size", "must be positive");
        assert!(err.to_string().contains("batch_size"));
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn config_error_from_serde() {
        let err: ConfigError = serde_json::from_str::<u32>("\"nope\"").unwrap_err().into();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }
}
