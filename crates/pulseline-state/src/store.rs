//! Run store trait definition.
//!
//! [`RunStore`] defines the storage contract for run lifecycle records
//! and per-element progress marks. Model types live in
//! [`pulseline_types::record`].
//!
//! Access pattern is read-modify-write keyed by run id: the engine
//! loads a record, mutates it, and writes it back. No listing or
//! querying is required by the core.

use pulseline_types::record::{RunId, RunRecord};

use crate::error;

/// Storage contract for run lifecycle state.
///
/// Implementations must be `Send + Sync` for use behind `Arc<dyn RunStore>`.
pub trait RunStore: Send + Sync {
    /// Insert a fresh run record. Fails if the id already exists.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on storage failure.
    fn create_run(&self, record: &RunRecord) -> error::Result<()>;

    /// Load a run record by id.
    ///
    /// Returns `Ok(None)` when no record exists for the id.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on storage failure.
    fn get_run(&self, id: &RunId) -> error::Result<Option<RunRecord>>;

    /// Write back a mutated run record. A missing id is not an error;
    /// zero rows are updated.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on storage failure.
    fn update_run(&self, record: &RunRecord) -> error::Result<()>;

    /// Mark one element of the run as started (long-operation progress).
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on storage failure.
    fn element_started(&self, run: &RunId, element: &str) -> error::Result<()>;

    /// Mark one element of the run as ended.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on storage failure.
    fn element_ended(&self, run: &RunId, element: &str) -> error::Result<()>;
}
