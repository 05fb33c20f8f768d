//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the PulseStore trait.
//! List-valued fields are stored as JSON text.

use crate::pulse::CanonicalRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{InsertOutcome, PulseStore, StorageError, StorageResult};
use crate::EtlError;
use chrono::{DateTime, Utc};
use rusqlite::{ffi, params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(EtlError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, EtlError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, EtlError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Returns true if the error is a UNIQUE or PRIMARY KEY constraint failure
fn is_duplicate_key(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}

fn encode_list(list: &Option<Vec<String>>) -> StorageResult<Option<String>> {
    list.as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(StorageError::from)
}

fn decode_list(text: Option<String>) -> StorageResult<Option<Vec<String>>> {
    text.as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(StorageError::from)
}

/// A pulse row before its JSON and timestamp columns are decoded
struct PulseRow {
    pulse_id: String,
    name: Option<String>,
    description: Option<String>,
    created: Option<String>,
    modified: Option<String>,
    indicator_count: Option<i64>,
    subscriber_count: Option<i64>,
    tags: Option<String>,
    industries: Option<String>,
    targeted_countries: Option<String>,
    references: Option<String>,
    tlp: Option<String>,
    public: Option<bool>,
    adversary: Option<String>,
    ingested_at: String,
}

impl PulseRow {
    fn into_record(self) -> StorageResult<CanonicalRecord> {
        let ingested_at = DateTime::parse_from_rfc3339(&self.ingested_at)
            .map_err(|e| StorageError::CorruptRow {
                pulse_id: self.pulse_id.clone(),
                message: format!("bad ingested_at '{}': {}", self.ingested_at, e),
            })?
            .with_timezone(&Utc);

        Ok(CanonicalRecord {
            pulse_id: Some(self.pulse_id),
            name: self.name,
            description: self.description,
            created: self.created,
            modified: self.modified,
            indicator_count: self.indicator_count,
            subscriber_count: self.subscriber_count,
            tags: decode_list(self.tags)?,
            industries: decode_list(self.industries)?,
            targeted_countries: decode_list(self.targeted_countries)?,
            references: decode_list(self.references)?,
            tlp: self.tlp,
            public: self.public,
            adversary: self.adversary,
            ingested_at,
        })
    }
}

impl PulseStore for SqliteStorage {
    fn insert_pulse(&mut self, record: &CanonicalRecord) -> StorageResult<InsertOutcome> {
        let result = self.conn.execute(
            r#"INSERT INTO pulses (
                pulse_id, name, description, created, modified,
                indicator_count, subscriber_count, tags, industries,
                targeted_countries, "references", tlp, public, adversary, ingested_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"#,
            params![
                record.pulse_id,
                record.name,
                record.description,
                record.created,
                record.modified,
                record.indicator_count,
                record.subscriber_count,
                encode_list(&record.tags)?,
                encode_list(&record.industries)?,
                encode_list(&record.targeted_countries)?,
                encode_list(&record.references)?,
                record.tlp,
                record.public,
                record.adversary,
                record.ingested_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if is_duplicate_key(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    fn get_pulse(&self, pulse_id: &str) -> StorageResult<Option<CanonicalRecord>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT pulse_id, name, description, created, modified,
             indicator_count, subscriber_count, tags, industries,
             targeted_countries, "references", tlp, public, adversary, ingested_at
             FROM pulses WHERE pulse_id = ?1"#,
        )?;

        let row = stmt
            .query_row(params![pulse_id], |row| {
                Ok(PulseRow {
                    pulse_id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created: row.get(3)?,
                    modified: row.get(4)?,
                    indicator_count: row.get(5)?,
                    subscriber_count: row.get(6)?,
                    tags: row.get(7)?,
                    industries: row.get(8)?,
                    targeted_countries: row.get(9)?,
                    references: row.get(10)?,
                    tlp: row.get(11)?,
                    public: row.get(12)?,
                    adversary: row.get(13)?,
                    ingested_at: row.get(14)?,
                })
            })
            .optional()?;

        row.map(PulseRow::into_record).transpose()
    }

    fn count_pulses(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pulses", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_tlp(&self) -> StorageResult<Vec<(Option<String>, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT tlp, COUNT(*) FROM pulses GROUP BY tlp ORDER BY COUNT(*) DESC, tlp",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn ingestion_window(&self) -> StorageResult<Option<(String, String)>> {
        let window: (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(ingested_at), MAX(ingested_at) FROM pulses",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(match window {
            (Some(first), Some(last)) => Some((first, last)),
            _ => None,
        })
    }
}
