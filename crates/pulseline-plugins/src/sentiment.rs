//! Wordlist sentiment scoring.

use pulseline_engine::plugin::{item_operator, Stage};
use pulseline_engine::stream::EntityStream;
use pulseline_types::config::StageConfig;
use pulseline_types::entity::Message;
use pulseline_types::error::ConfigError;
use serde::Deserialize;

use crate::wordlists::{NEGATIVE_WORDS, POSITIVE_WORDS};

/// Options for `sentiment/wordlist`. Unknown options are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SentimentOptions {
    extra_positive: Vec<String>,
    extra_negative: Vec<String>,
}

/// Scores each message as the mean of +1/-1 word polarities over its
/// tokens (or raw words when no tokenizer ran). No polar words yield a
/// neutral 0.0 — absence of sentiment is a normal outcome.
pub struct WordlistSentimentAnalyzer;

impl Stage<Message> for WordlistSentimentAnalyzer {
    fn name(&self) -> &str {
        "wordlist"
    }

    fn apply(
        &self,
        config: &StageConfig,
        input: EntityStream<Message>,
    ) -> Result<EntityStream<Message>, ConfigError> {
        let options: SentimentOptions = config.parse()?;
        let positive: Vec<String> = options
            .extra_positive
            .iter()
            .map(|w| w.to_lowercase())
            .collect();
        let negative: Vec<String> = options
            .extra_negative
            .iter()
            .map(|w| w.to_lowercase())
            .collect();

        Ok(item_operator(
            move |mut message: Message| {
                let words: Vec<String> = if message.tokens.is_empty() {
                    message
                        .text
                        .split(|c: char| !c.is_alphanumeric())
                        .filter(|w| !w.is_empty())
                        .map(str::to_lowercase)
                        .collect()
                } else {
                    message
                        .tokens
                        .iter()
                        .map(|t| t.text.to_lowercase())
                        .collect()
                };

                let mut score = 0i64;
                let mut total = 0i64;
                for word in &words {
                    let polarity = if POSITIVE_WORDS.contains(&word.as_str())
                        || positive.contains(word)
                    {
                        1
                    } else if NEGATIVE_WORDS.contains(&word.as_str()) || negative.contains(word) {
                        -1
                    } else {
                        continue;
                    };
                    score += polarity;
                    total += 1;
                }

                #[allow(clippy::cast_precision_loss)]
                let sentiment = if total == 0 {
                    0.0
                } else {
                    score as f64 / total as f64
                };
                message.sentiment = Some(sentiment);
                Ok(message)
            },
            input,
        ))
    }
}
