//! Message persistence stage.

use std::sync::Arc;

use pulseline_engine::plugin::{item_operator, Stage};
use pulseline_engine::stream::EntityStream;
use pulseline_types::config::StageConfig;
use pulseline_types::entity::Message;
use pulseline_types::error::{ConfigError, StageError};
use serde::Deserialize;

use crate::repository::MessageRepository;

/// Options for `persist/message`. Unknown options are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PersistOptions {
    /// Tags stamped onto every persisted message.
    custom_tags: Vec<String>,
}

/// Upserts each message mid-stream and passes it along.
///
/// When a message was already persisted in an earlier run, the stored
/// copy (with its accumulated enrichments) wins; only the volatile
/// counters (favs, shares) are refreshed from the incoming record.
/// Repository failures terminate the stream — losing persistence
/// silently here would defeat the stage's purpose.
pub struct MessagePersister {
    messages: Arc<dyn MessageRepository>,
}

impl MessagePersister {
    #[must_use]
    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }
}

impl Stage<Message> for MessagePersister {
    fn name(&self) -> &str {
        "message"
    }

    fn apply(
        &self,
        config: &StageConfig,
        input: EntityStream<Message>,
    ) -> Result<EntityStream<Message>, ConfigError> {
        let options: PersistOptions = config.parse()?;
        let messages = self.messages.clone();

        Ok(item_operator(
            move |incoming: Message| {
                let stored = messages.find(&incoming.id).map_err(|err| {
                    StageError::for_entity("message-persist", incoming.id.clone(), err.to_string())
                })?;
                let mut message = match stored {
                    Some(mut existing) => {
                        existing.favs = incoming.favs;
                        existing.shares = incoming.shares;
                        existing
                    }
                    None => incoming,
                };
                if !options.custom_tags.is_empty() {
                    message.custom_tags = options.custom_tags.clone();
                }
                messages.save(&message).map_err(|err| {
                    StageError::for_entity("message-persist", message.id.clone(), err.to_string())
                })?;
                Ok(message)
            },
            input,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryMessageRepository;
    use futures::StreamExt;
    use pulseline_engine::stream::from_iter;

    async fn run(
        repo: &Arc<InMemoryMessageRepository>,
        config: StageConfig,
        messages: Vec<Message>,
    ) -> Vec<Message> {
        let stage = MessagePersister::new(repo.clone());
        let out = stage.apply(&config, from_iter(messages)).unwrap();
        out.map(Result::unwrap).collect().await
    }

    #[tokio::test]
    async fn persists_and_passes_through() {
        let repo = Arc::new(InMemoryMessageRepository::new());
        let out = run(
            &repo,
            StageConfig::empty(),
            vec![Message::new("1", "a"), Message::new("2", "b")],
        )
        .await;
        assert_eq!(out.len(), 2);
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn existing_record_keeps_enrichment_refreshes_counters() {
        let repo = Arc::new(InMemoryMessageRepository::new());
        let mut enriched = Message::new("1", "enriched text").with_language("it");
        enriched.favs = 2;
        repo.save(&enriched).unwrap();

        let mut incoming = Message::new("1", "raw text");
        incoming.favs = 9;
        incoming.shares = 3;
        let out = run(&repo, StageConfig::empty(), vec![incoming]).await;

        assert_eq!(out[0].text, "enriched text");
        assert_eq!(out[0].language.as_deref(), Some("it"));
        assert_eq!(out[0].favs, 9);
        assert_eq!(out[0].shares, 3);
    }

    #[tokio::test]
    async fn custom_tags_are_stamped() {
        let repo = Arc::new(InMemoryMessageRepository::new());
        let config = StageConfig::from_value(serde_json::json!({
            "custom_tags": ["campaign-42"],
        }));
        let out = run(&repo, config, vec![Message::new("1", "a")]).await;
        assert_eq!(out[0].custom_tags, vec!["campaign-42"]);
        assert_eq!(
            repo.find("1").unwrap().unwrap().custom_tags,
            vec!["campaign-42"]
        );
    }

    #[tokio::test]
    async fn repository_failure_terminates_the_stream() {
        struct BrokenRepo;
        impl MessageRepository for BrokenRepo {
            fn find(&self, _: &str) -> anyhow::Result<Option<Message>> {
                anyhow::bail!("disk full")
            }
            fn save(&self, _: &Message) -> anyhow::Result<()> {
                anyhow::bail!("disk full")
            }
        }

        let stage = MessagePersister::new(Arc::new(BrokenRepo));
        let out = stage
            .apply(&StageConfig::empty(), from_iter(vec![Message::new("1", "a")]))
            .unwrap();
        let items: Vec<_> = out.collect().await;
        assert!(items[0].is_err());
    }
}
