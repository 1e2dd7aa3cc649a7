//! Domain entities flowing through enrichment pipelines.
//!
//! The pipeline core only ever relies on the [`Entity`] trait; the
//! concrete records ([`Message`], [`Profile`]) carry the full field set
//! that enrichment stages mutate in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal contract the pipeline core needs from a domain record.
///
/// Everything else on an entity is opaque to the core: stages mutate
/// fields they know about, the core only routes and tracks.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Stable identifier, unique within the entity's collection.
    fn id(&self) -> &str;

    /// ISO 639-1 language code, when known.
    fn language(&self) -> Option<&str>;
}

/// A social-media message, the primary entity of the pipeline.
///
/// Created by a source, enriched in place by successive stages,
/// persisted by a sink. The pipeline never deletes a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    /// Originating network (e.g. `"twitter"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_user: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_users: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub favs: u32,
    #[serde(default)]
    pub shares: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<Token>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
}

impl Message {
    /// Convenience constructor for the fields every message has.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set the language code, builder-style.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

impl Entity for Message {
    fn id(&self) -> &str {
        &self.id
    }

    fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

/// A semantic tag attached to a message by a tagging stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default)]
    pub stop_word: bool,
}

/// A single token of a message's text, produced by a tokenizer and
/// annotated by later stages (POS, lemma, stop-word, score).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    #[serde(default)]
    pub stop_word: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Token {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// An author profile, used by geo-fixing stages to borrow coordinates
/// from the message author.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub followings: u32,
}

impl Entity for Profile {
    fn id(&self) -> &str {
        &self.username
    }

    fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_entity_contract() {
        let msg = Message::new("42", "ciao mondo").with_language("it");
        assert_eq!(msg.id(), "42");
        assert_eq!(msg.language(), Some("it"));
    }

    #[test]
    fn message_without_language() {
        let msg = Message::new("1", "hello");
        assert!(msg.language().is_none());
    }

    #[test]
    fn message_serde_skips_empty_fields() {
        let json = serde_json::to_value(Message::new("1", "hi")).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("tags"));
        assert!(!obj.contains_key("language"));
        assert!(obj.contains_key("id"));
    }

    #[test]
    fn message_serde_roundtrip() {
        let mut msg = Message::new("7", "round trip").with_language("en");
        msg.tokens.push(Token::new("round"));
        msg.sentiment = Some(0.5);
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn profile_entity_contract() {
        let profile = Profile {
            username: "frapontillo".into(),
            latitude: Some(41.1),
            longitude: Some(16.8),
            ..Profile::default()
        };
        assert_eq!(profile.id(), "frapontillo");
        assert!(profile.language().is_none());
    }
}
