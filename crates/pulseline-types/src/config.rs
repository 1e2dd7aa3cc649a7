//! Stage configuration documents.
//!
//! A [`StageConfig`] is the immutable bag of options handed to a plugin
//! when it is applied to a stream. Plugins parse it into their own typed
//! options struct; each instance gets its own copy, so no shared default
//! is ever mutated.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ConfigError;

/// Immutable-after-build configuration document for one stage.
///
/// Built either from a structured JSON document (pipeline YAML `config:`
/// blocks deserialize into one) or from a flat key/value map.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct StageConfig(Value);

impl StageConfig {
    /// An empty document; plugins fall back to their defaults.
    #[must_use]
    pub fn empty() -> Self {
        Self(Value::Null)
    }

    /// Wrap a structured document.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Build a document from a flat string map. Values are kept as JSON
    /// strings; typed option structs parse them via serde.
    #[must_use]
    pub fn from_map<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        Self(Value::Object(map))
    }

    /// Borrow the raw document.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// `true` when no options were provided.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Deserialize the document into a plugin's typed options.
    ///
    /// An absent document yields `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] when the document does not
    /// match the expected shape (unknown options included, for plugins
    /// that opt into `deny_unknown_fields`).
    pub fn parse<T>(&self) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Default,
    {
        if self.is_empty() {
            return Ok(T::default());
        }
        serde_json::from_value(self.0.clone()).map_err(ConfigError::from)
    }
}
