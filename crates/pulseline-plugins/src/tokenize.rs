//! Simple unicode tokenizer.

use pulseline_engine::plugin::{item_operator, Stage};
use pulseline_engine::stream::EntityStream;
use pulseline_types::config::StageConfig;
use pulseline_types::entity::{Message, Token};
use pulseline_types::error::ConfigError;
use serde::Deserialize;

/// Options for `tokenize/simple`.
///
/// Unknown options are rejected; `min_length: 0` is invalid.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TokenizeOptions {
    lowercase: bool,
    min_length: usize,
}

impl Default for TokenizeOptions {
    fn default() -> Self {
        Self {
            lowercase: true,
            min_length: 1,
        }
    }
}

/// Splits message text on non-alphanumeric boundaries and fills the
/// token list. Replaces any tokens a previous stage produced.
pub struct SimpleTokenizer;

impl Stage<Message> for SimpleTokenizer {
    fn name(&self) -> &str {
        "simple"
    }

    fn apply(
        &self,
        config: &StageConfig,
        input: EntityStream<Message>,
    ) -> Result<EntityStream<Message>, ConfigError> {
        let options: TokenizeOptions = config.parse()?;
        if options.min_length == 0 {
            return Err(ConfigError::invalid_value(
                "min_length",
                "must be at least 1",
            ));
        }

        Ok(item_operator(
            move |mut message: Message| {
                message.tokens = message
                    .text
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|w| w.chars().count() >= options.min_length)
                    .map(|w| {
                        if options.lowercase {
                            Token::new(w.to_lowercase())
                        } else {
                            Token::new(w)
                        }
                    })
                    .collect();
                Ok(message)
            },
            input,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use pulseline_engine::stream::from_iter;

    async fn run_one(config: StageConfig, message: Message) -> Message {
        let stage = SimpleTokenizer;
        let out = stage.apply(&config, from_iter(vec![message])).unwrap();
        let mut items: Vec<Message> = out.map(Result::unwrap).collect().await;
        items.remove(0)
    }

    #[tokio::test]
    async fn splits_and_lowercases() {
        let msg = run_one(StageConfig::empty(), Message::new("1", "Ciao, Mondo!")).await;
        let texts: Vec<&str> = msg.tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["ciao", "mondo"]);
    }

    #[tokio::test]
    async fn min_length_filters_short_tokens() {
        let config = StageConfig::from_value(serde_json::json!({ "min_length": 3 }));
        let msg = run_one(config, Message::new("1", "a an the sea")).await;
        let texts: Vec<&str> = msg.tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["the", "sea"]);
    }

    #[tokio::test]
    async fn lowercase_can_be_disabled() {
        let config = StageConfig::from_value(serde_json::json!({ "lowercase": false }));
        let msg = run_one(config, Message::new("1", "Ciao Mondo")).await;
        assert_eq!(msg.tokens[0].text, "Ciao");
    }

    #[test]
    fn zero_min_length_fails_configuration() {
        let stage = SimpleTokenizer;
        let config = StageConfig::from_value(serde_json::json!({ "min_length": 0 }));
        let err = stage.apply(&config, from_iter(vec![])).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
