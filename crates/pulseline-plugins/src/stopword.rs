//! Stop-word marking over tokenized messages.

use pulseline_engine::plugin::{item_operator, Stage};
use pulseline_engine::stream::EntityStream;
use pulseline_types::config::StageConfig;
use pulseline_types::entity::Message;
use pulseline_types::error::ConfigError;
use serde::Deserialize;

use crate::wordlists::{ENGLISH_STOP_WORDS, ITALIAN_STOP_WORDS};

/// Options for `rem-stop-word/simple`. Unknown options are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StopWordOptions {
    /// Additional words to mark, applied to every language.
    extra: Vec<String>,
}

/// Marks stop-word tokens using the built-in list for the message's
/// language. Tokens are marked, never removed, so later stages still
/// see the full sequence. A message without tokens or with an unknown
/// language flows through untouched.
pub struct SimpleStopWordRemover;

fn list_for(language: Option<&str>) -> Option<&'static [&'static str]> {
    match language {
        Some("it") => Some(ITALIAN_STOP_WORDS),
        Some("en") => Some(ENGLISH_STOP_WORDS),
        _ => None,
    }
}

impl Stage<Message> for SimpleStopWordRemover {
    fn name(&self) -> &str {
        "simple"
    }

    fn apply(
        &self,
        config: &StageConfig,
        input: EntityStream<Message>,
    ) -> Result<EntityStream<Message>, ConfigError> {
        let options: StopWordOptions = config.parse()?;
        let extra: Vec<String> = options.extra.iter().map(|w| w.to_lowercase()).collect();

        Ok(item_operator(
            move |mut message: Message| {
                let builtin = list_for(message.language.as_deref());
                for token in &mut message.tokens {
                    let lowered = token.text.to_lowercase();
                    let is_builtin =
                        builtin.is_some_and(|list| list.contains(&lowered.as_str()));
                    if is_builtin || extra.contains(&lowered) {
                        token.stop_word = true;
                    }
                }
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
    use pulseline_types::entity::Token;

    fn tokenized(lang: Option<&str>, words: &[&str]) -> Message {
        let mut msg = Message::new("1", words.join(" "));
        msg.language = lang.map(String::from);
        msg.tokens = words.iter().map(|w| Token::new(*w)).collect();
        msg
    }

    async fn run_one(config: StageConfig, message: Message) -> Message {
        let stage = SimpleStopWordRemover;
        let out = stage.apply(&config, from_iter(vec![message])).unwrap();
        let mut items: Vec<Message> = out.map(Result::unwrap).collect().await;
        items.remove(0)
    }

    #[tokio::test]
    async fn marks_builtin_stop_words() {
        let msg = run_one(
            StageConfig::empty(),
            tokenized(Some("en"), &["the", "pipeline", "is", "fast"]),
        )
        .await;
        let marks: Vec<bool> = msg.tokens.iter().map(|t| t.stop_word).collect();
        assert_eq!(marks, vec![true, false, true, false]);
    }

    #[tokio::test]
    async fn unknown_language_is_untouched() {
        let msg = run_one(
            StageConfig::empty(),
            tokenized(Some("sw"), &["the", "il"]),
        )
        .await;
        assert!(msg.tokens.iter().all(|t| !t.stop_word));
    }

    #[tokio::test]
    async fn extra_words_apply_regardless_of_language() {
        let config = StageConfig::from_value(serde_json::json!({ "extra": ["RT"] }));
        let msg = run_one(config, tokenized(None, &["rt", "news"])).await;
        assert!(msg.tokens[0].stop_word);
        assert!(!msg.tokens[1].stop_word);
    }

    #[tokio::test]
    async fn tokens_are_marked_not_removed() {
        let msg = run_one(
            StageConfig::empty(),
            tokenized(Some("it"), &["il", "treno"]),
        )
        .await;
        assert_eq!(msg.tokens.len(), 2);
    }
}
