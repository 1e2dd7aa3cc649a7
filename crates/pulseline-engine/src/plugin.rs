//! Plugin contract and the item-operator stage adapter.
//!
//! A stage is one polymorphic capability: a named transformation from
//! one [`EntityStream`] to another. Per-item enrichers lift their
//! function through [`item_operator`]; whole-stream transformers
//! implement [`Stage::apply`] directly. Downstream composition cannot
//! tell the two shapes apart.

use futures::StreamExt;
use pulseline_types::config::StageConfig;
use pulseline_types::entity::Entity;
use pulseline_types::error::{ConfigError, StageError};

use crate::stream::EntityStream;

/// A named, independently resolvable pipeline stage.
///
/// `apply` composes lazily: configuration is validated when the stage
/// is applied, before any item flows. Implementations must expose the
/// same stream contract regardless of their internal shape (per-item
/// operator or whole-stream transformer).
pub trait Stage<E: Entity>: Send + Sync {
    /// Unique name within the stage's capability family.
    fn name(&self) -> &str;

    /// Wrap `input` with this stage's transformation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration document is
    /// malformed or carries an unacceptable value. Assembly-time only;
    /// item-level failures travel through the stream as [`StageError`]s.
    fn apply(
        &self,
        config: &StageConfig,
        input: EntityStream<E>,
    ) -> Result<EntityStream<E>, ConfigError>;
}

/// Lift a per-item function into a stream operator.
///
/// Preserves ordering and cardinality: exactly one output per input,
/// in input order. A returned `Err` becomes the stream's terminal
/// error event.
pub fn item_operator<E, F>(mut f: F, input: EntityStream<E>) -> EntityStream<E>
where
    E: Entity,
    F: FnMut(E) -> Result<E, StageError> + Send + 'static,
{
    input.map(move |item| item.and_then(&mut f)).boxed()
}
