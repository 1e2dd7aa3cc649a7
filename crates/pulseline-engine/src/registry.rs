//! Plugin registry: an explicit registration table with cached
//! singleton resolution.
//!
//! Built once at process start and passed to whoever assembles the
//! pipeline; no static state. Families (tagger, lemmatizer, indexer,
//! ...) are independent namespaces within one registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use pulseline_types::entity::Entity;
use pulseline_types::error::PluginNotFoundError;

use crate::plugin::Stage;

type StageFactory<E> = Box<dyn Fn() -> Arc<dyn Stage<E>> + Send + Sync>;
type PluginKey = (String, String);

/// Registration table from `{family, name}` to a stage factory,
/// caching one instance per key for the process lifetime.
pub struct PluginRegistry<E: Entity> {
    factories: HashMap<PluginKey, StageFactory<E>>,
    instances: Mutex<HashMap<PluginKey, Arc<dyn Stage<E>>>>,
}

impl<E: Entity> Default for PluginRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> PluginRegistry<E> {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Register a factory under `{family, name}`. A later registration
    /// for the same key replaces the earlier one (last wins), which
    /// lets tests shadow built-ins.
    pub fn register<F>(&mut self, family: &str, name: &str, factory: F)
    where
        F: Fn() -> Arc<dyn Stage<E>> + Send + Sync + 'static,
    {
        self.factories
            .insert((family.to_string(), name.to_string()), Box::new(factory));
    }

    /// Resolve a plugin by family and name, instantiating it on first
    /// use and returning the same cached instance afterwards.
    ///
    /// Safe under concurrent resolution of the same name: the
    /// insert-if-absent happens under one lock.
    ///
    /// # Errors
    ///
    /// Returns [`PluginNotFoundError`] when nothing is registered under
    /// the key; the cache is left untouched.
    pub fn resolve(
        &self,
        family: &str,
        name: &str,
    ) -> Result<Arc<dyn Stage<E>>, PluginNotFoundError> {
        let key = (family.to_string(), name.to_string());
        let mut instances = self
            .instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(instance) = instances.get(&key) {
            return Ok(instance.clone());
        }
        let factory = self
            .factories
            .get(&key)
            .ok_or_else(|| PluginNotFoundError::new(family, name))?;
        let instance = factory();
        tracing::debug!(family, name, "instantiated plugin");
        instances.insert(key, instance.clone());
        Ok(instance)
    }

    /// `true` when a factory is registered under `{family, name}`.
    #[must_use]
    pub fn contains(&self, family: &str, name: &str) -> bool {
        self.factories
            .contains_key(&(family.to_string(), name.to_string()))
    }

    /// Sorted list of registered families.
    #[must_use]
    pub fn families(&self) -> Vec<String> {
        let mut families: Vec<String> =
            self.factories.keys().map(|(f, _)| f.clone()).collect();
        families.sort();
        families.dedup();
        families
    }

    /// Sorted list of plugin names registered under one family.
    #[must_use]
    pub fn names(&self, family: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .keys()
            .filter(|(f, _)| f == family)
            .map(|(_, n)| n.clone())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::item_operator;
    use crate::stream::EntityStream;
    use pulseline_types::config::StageConfig;
    use pulseline_types::entity::Message;
    use pulseline_types::error::ConfigError;

    struct NoopStage;

    impl Stage<Message> for NoopStage {
        fn name(&self) -> &str {
            "noop"
        }

        fn apply(
            &self,
            _config: &StageConfig,
            input: EntityStream<Message>,
        ) -> Result<EntityStream<Message>, ConfigError> {
            Ok(item_operator(Ok, input))
        }
    }

    fn registry_with_noop() -> PluginRegistry<Message> {
        let mut registry = PluginRegistry::new();
        registry.register("demo", "noop", || Arc::new(NoopStage));
        registry
    }

    #[test]
    fn resolve_twice_returns_same_instance() {
        let registry = registry_with_noop();
        let a = registry.resolve("demo", "noop").unwrap();
        let b = registry.resolve("demo", "noop").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unknown_name_fails_without_side_effects() {
        let registry = registry_with_noop();
        let err = registry.resolve("demo", "missing").err().unwrap();
        assert_eq!(err.family, "demo");
        assert_eq!(err.name, "missing");
        // The failed lookup must not have polluted the cache.
        let cached = registry.instances.lock().unwrap();
        assert!(cached.is_empty());
    }

    #[test]
    fn unknown_family_fails() {
        let registry = registry_with_noop();
        assert!(registry.resolve("other", "noop").is_err());
    }

    #[test]
    fn families_and_names_are_sorted() {
        let mut registry = registry_with_noop();
        registry.register("alpha", "b", || Arc::new(NoopStage));
        registry.register("alpha", "a", || Arc::new(NoopStage));
        assert_eq!(registry.families(), vec!["alpha", "demo"]);
        assert_eq!(registry.names("alpha"), vec!["a", "b"]);
    }

    #[test]
    fn concurrent_resolution_yields_one_instance() {
        let registry = Arc::new(registry_with_noop());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.resolve("demo", "noop").unwrap())
            })
            .collect();
        let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for pair in instances.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }
    }
}
