//! Run record persistence for the Pulseline engine.
//!
//! Provides the [`RunStore`] trait and a [`SqliteRunStore`]
//! implementation for run lifecycle records and per-element progress.

#![warn(clippy::pedantic)]

pub mod error;
pub mod sqlite;
pub mod store;

pub use error::StateError;
pub use sqlite::SqliteRunStore;
pub use store::RunStore;
