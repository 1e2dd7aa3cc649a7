//! Repository collaborator traits and in-memory implementations.
//!
//! Durable storage of domain entities belongs to collaborators; the
//! plugins only see these seams. The in-memory implementations back
//! tests and standalone CLI runs.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use pulseline_types::entity::{Message, Profile};

/// Message storage with upsert-by-id semantics.
pub trait MessageRepository: Send + Sync {
    /// Load a message by id.
    ///
    /// # Errors
    ///
    /// Returns an error on storage failure.
    fn find(&self, id: &str) -> anyhow::Result<Option<Message>>;

    /// Insert or replace a message.
    ///
    /// # Errors
    ///
    /// Returns an error on storage failure.
    fn save(&self, message: &Message) -> anyhow::Result<()>;
}

/// Profile lookup by username.
pub trait ProfileRepository: Send + Sync {
    /// Load a profile by username.
    ///
    /// # Errors
    ///
    /// Returns an error on storage failure.
    fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Profile>>;
}

/// In-memory [`MessageRepository`].
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Mutex<HashMap<String, Message>>,
}

impl InMemoryMessageRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// `true` when nothing has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MessageRepository for InMemoryMessageRepository {
    fn find(&self, id: &str) -> anyhow::Result<Option<Message>> {
        Ok(self
            .messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned())
    }

    fn save(&self, message: &Message) -> anyhow::Result<()> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(message.id.clone(), message.clone());
        Ok(())
    }
}

/// In-memory [`ProfileRepository`], seeded up front.
#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: Mutex<HashMap<String, Profile>>,
}

impl InMemoryProfileRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace one profile.
    pub fn insert(&self, profile: Profile) {
        self.profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile.username.clone(), profile);
    }
}

impl ProfileRepository for InMemoryProfileRepository {
    fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Profile>> {
        Ok(self
            .profiles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(username)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_upsert_roundtrip() {
        let repo = InMemoryMessageRepository::new();
        assert!(repo.find("1").unwrap().is_none());

        repo.save(&Message::new("1", "first")).unwrap();
        repo.save(&Message::new("1", "second")).unwrap();
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.find("1").unwrap().unwrap().text, "second");
    }

    #[test]
    fn profile_lookup() {
        let repo = InMemoryProfileRepository::new();
        repo.insert(Profile {
            username: "ada".into(),
            latitude: Some(51.5),
            ..Profile::default()
        });
        assert!(repo.find_by_username("ada").unwrap().is_some());
        assert!(repo.find_by_username("ghost").unwrap().is_none());
    }
}
