//! Source collaborator contract.

use chrono::{DateTime, Utc};
use pulseline_types::entity::Entity;

use crate::stream::EntityStream;

/// Selection window handed to a source when opening a stream.
///
/// Either bound may be absent. Undated entities pass any window — a
/// source that cannot date its records should not silently lose them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionRange {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl SelectionRange {
    /// A range with no bounds: everything matches.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// `true` when a record dated `at` falls inside the window.
    #[must_use]
    pub fn contains(&self, at: Option<DateTime<Utc>>) -> bool {
        let Some(at) = at else { return true };
        if self.since.is_some_and(|since| at < since) {
            return false;
        }
        if self.until.is_some_and(|until| at >= until) {
            return false;
        }
        true
    }
}

/// Produces an entity stream for a selection window.
///
/// Push (tailing) and pull (finite historical query) sources are
/// treated uniformly: the engine only ever sees the stream handle.
pub trait Source<E: Entity>: Send + Sync {
    /// Open the stream. Opening performs no side effects beyond what
    /// the source needs to start producing lazily.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying data source cannot be
    /// reached or read; fatal to pipeline assembly.
    fn open(&self, range: &SelectionRange) -> anyhow::Result<EntityStream<E>>;
}
