//! Storage module for persisting pulses
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - First-seen pulse insertion guarded by a unique index on `pulse_id`
//! - Read queries used by the statistics report

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{InsertOutcome, PulseStore, StorageError, StorageResult};

use crate::EtlError;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(EtlError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, EtlError> {
    SqliteStorage::new(path)
}
