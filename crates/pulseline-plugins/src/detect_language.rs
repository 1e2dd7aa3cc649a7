//! Wordlist-based language detection.

use pulseline_engine::plugin::{item_operator, Stage};
use pulseline_engine::stream::EntityStream;
use pulseline_types::config::StageConfig;
use pulseline_types::entity::Message;
use pulseline_types::error::ConfigError;
use serde::Deserialize;

use crate::wordlists::{ENGLISH_STOP_WORDS, ITALIAN_STOP_WORDS};

/// Options for `detect-language/wordlist`.
///
/// Unknown options are rejected. `fallback` must be a two-letter code
/// when present (invalid values fail configuration).
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DetectOptions {
    /// Re-detect even when a language is already set.
    overwrite: bool,
    /// Language to assume when detection finds no signal.
    fallback: Option<String>,
}

/// Scores message text against built-in stop-word lists and sets the
/// language of the best-scoring list. No signal leaves the language
/// absent (a normal outcome, not an error) unless `fallback` is set.
pub struct WordlistLanguageDetector;

impl WordlistLanguageDetector {
    fn detect(text: &str) -> Option<&'static str> {
        let mut it_hits = 0usize;
        let mut en_hits = 0usize;
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            if word.is_empty() {
                continue;
            }
            let word = word.to_lowercase();
            if ITALIAN_STOP_WORDS.contains(&word.as_str()) {
                it_hits += 1;
            }
            if ENGLISH_STOP_WORDS.contains(&word.as_str()) {
                en_hits += 1;
            }
        }
        match (it_hits, en_hits) {
            (0, 0) => None,
            (it, en) if it >= en => Some("it"),
            _ => Some("en"),
        }
    }
}

impl Stage<Message> for WordlistLanguageDetector {
    fn name(&self) -> &str {
        "wordlist"
    }

    fn apply(
        &self,
        config: &StageConfig,
        input: EntityStream<Message>,
    ) -> Result<EntityStream<Message>, ConfigError> {
        let options: DetectOptions = config.parse()?;
        if let Some(fallback) = &options.fallback {
            if fallback.len() != 2 || !fallback.chars().all(|c| c.is_ascii_lowercase()) {
                return Err(ConfigError::invalid_value(
                    "fallback",
                    format!("'{fallback}' is not a two-letter language code"),
                ));
            }
        }

        Ok(item_operator(
            move |mut message: Message| {
                if message.language.is_none() || options.overwrite {
                    match Self::detect(&message.text) {
                        Some(lang) => message.language = Some(lang.to_string()),
                        None => {
                            if let Some(fallback) = &options.fallback {
                                message.language = Some(fallback.clone());
                            }
                        }
                    }
                }
                Ok(message)
            },
            input,
        ))
    }
}
