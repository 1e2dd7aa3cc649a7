//! Sink collaborator contract.

use pulseline_types::entity::Entity;

/// Consumes batches of entities and performs a durable upsert.
///
/// Persistence is best-effort from the stream's point of view: a
/// failing batch is logged by the sink driver and surfaced in the run
/// summary, but never propagates back into the stream. Full protocol
/// and format ownership stays with the implementation.
pub trait Sink<E: Entity>: Send + Sync {
    /// Durably upsert one batch.
    ///
    /// # Errors
    ///
    /// Returns an error when the batch could not be persisted; the
    /// driver logs it and keeps the stream flowing.
    fn persist(&self, batch: &[E]) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulseline_types::entity::Message;

    #[test]
    fn trait_is_object_safe() {
        fn _assert_object_safe(_: &dyn Sink<Message>) {}
    }
}
