//! Storage traits and error types
//!
//! This module defines the trait interface for pulse store backends and
//! associated error types.

use crate::pulse::CanonicalRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
///
/// A duplicate pulse id is not an error: it is reported as
/// [`InsertOutcome::Duplicate`].
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt row for pulse {pulse_id}: {message}")]
    CorruptRow { pulse_id: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// What happened to a single insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The pulse was new and is now stored
    Inserted,

    /// A pulse with the same id already exists; nothing was changed
    Duplicate,
}

/// Trait for pulse store implementations
///
/// Implementations must enforce uniqueness of `pulse_id` in the store itself,
/// so that concurrent writers cannot both insert the same pulse.
pub trait PulseStore {
    /// Inserts one pulse, reporting a duplicate id distinctly from failures
    ///
    /// # Arguments
    ///
    /// * `record` - The pulse to insert; its `pulse_id` must be set
    ///
    /// # Returns
    ///
    /// * `Ok(InsertOutcome::Inserted)` - The pulse was stored
    /// * `Ok(InsertOutcome::Duplicate)` - The id was already present
    /// * `Err(StorageError)` - Any other storage failure
    fn insert_pulse(&mut self, record: &CanonicalRecord) -> StorageResult<InsertOutcome>;

    /// Gets a stored pulse by id
    fn get_pulse(&self, pulse_id: &str) -> StorageResult<Option<CanonicalRecord>>;

    /// Counts all stored pulses
    fn count_pulses(&self) -> StorageResult<u64>;

    /// Counts stored pulses grouped by TLP marking (None for unmarked pulses)
    fn count_by_tlp(&self) -> StorageResult<Vec<(Option<String>, u64)>>;

    /// Gets the earliest and latest `ingested_at` values, if any pulse is stored
    fn ingestion_window(&self) -> StorageResult<Option<(String, String)>>;
}
