//! Built-in enrichment plugins for the Pulseline engine.
//!
//! Each plugin registers under `{family, name}` in the registry built
//! by [`builtin_registry`]. The enrichment algorithms are deliberately
//! simple reference implementations; external collaborators
//! (repositories, index services) are reached through traits so real
//! backends can be swapped in.

#![warn(clippy::pedantic)]

pub mod detect_language;
pub mod geo;
pub mod index;
pub mod jsonl;
pub mod persist;
pub mod repository;
pub mod sentiment;
pub mod stopword;
pub mod tokenize;
mod wordlists;

use std::sync::Arc;

use pulseline_engine::lifecycle::ProgressSink;
use pulseline_engine::PluginRegistry;
use pulseline_types::entity::Message;

use crate::detect_language::WordlistLanguageDetector;
use crate::geo::FromProfileGeoFixer;
use crate::index::{GroupedIndexer, IndexService};
use crate::persist::MessagePersister;
use crate::repository::{MessageRepository, ProfileRepository};
use crate::sentiment::WordlistSentimentAnalyzer;
use crate::stopword::SimpleStopWordRemover;
use crate::tokenize::SimpleTokenizer;

/// External collaborators the built-in plugins depend on.
pub struct PluginDeps {
    pub messages: Arc<dyn MessageRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub index: Arc<dyn IndexService>,
    /// Progress hooks for long-running grouped stages; usually the
    /// run's lifecycle wrapper.
    pub progress: Option<Arc<dyn ProgressSink>>,
}

/// Build the registration table for every built-in plugin.
///
/// Constructed once at startup and handed to the pipeline assembler;
/// the registry caches one instance per plugin for the process
/// lifetime.
#[must_use]
pub fn builtin_registry(deps: &PluginDeps) -> PluginRegistry<Message> {
    let mut registry = PluginRegistry::new();

    registry.register("detect-language", "wordlist", || {
        Arc::new(WordlistLanguageDetector)
    });
    registry.register("tokenize", "simple", || Arc::new(SimpleTokenizer));
    registry.register("rem-stop-word", "simple", || Arc::new(SimpleStopWordRemover));
    registry.register("sentiment", "wordlist", || {
        Arc::new(WordlistSentimentAnalyzer)
    });

    let profiles = deps.profiles.clone();
    registry.register("fix-geo-message", "from-profile", move || {
        Arc::new(FromProfileGeoFixer::new(profiles.clone()))
    });

    let messages = deps.messages.clone();
    registry.register("persist", "message", move || {
        Arc::new(MessagePersister::new(messages.clone()))
    });

    let index = deps.index.clone();
    let progress = deps.progress.clone();
    registry.register("index", "grouped", move || {
        Arc::new(GroupedIndexer::new(index.clone(), progress.clone()))
    });

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::LogIndexService;
    use crate::repository::{InMemoryMessageRepository, InMemoryProfileRepository};

    fn deps() -> PluginDeps {
        PluginDeps {
            messages: Arc::new(InMemoryMessageRepository::new()),
            profiles: Arc::new(InMemoryProfileRepository::new()),
            index: Arc::new(LogIndexService),
            progress: None,
        }
    }

    #[test]
    fn all_builtins_resolve() {
        let registry = builtin_registry(&deps());
        for (family, name) in [
            ("detect-language", "wordlist"),
            ("tokenize", "simple"),
            ("rem-stop-word", "simple"),
            ("sentiment", "wordlist"),
            ("fix-geo-message", "from-profile"),
            ("persist", "message"),
            ("index", "grouped"),
        ] {
            let plugin = registry.resolve(family, name).unwrap();
            assert_eq!(plugin.name(), name);
        }
    }

    #[test]
    fn families_enumerate_for_cli_listing() {
        let registry = builtin_registry(&deps());
        let families = registry.families();
        assert!(families.contains(&"detect-language".to_string()));
        assert!(families.contains(&"index".to_string()));
        assert_eq!(registry.names("tokenize"), vec!["simple"]);
    }
}
