//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Pulse-ETL database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per pulse, first-seen wins
CREATE TABLE IF NOT EXISTS pulses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pulse_id TEXT NOT NULL,
    name TEXT,
    description TEXT,
    created TEXT,
    modified TEXT,
    indicator_count INTEGER,
    subscriber_count INTEGER,
    tags TEXT,
    industries TEXT,
    targeted_countries TEXT,
    "references" TEXT,
    tlp TEXT,
    public INTEGER,
    adversary TEXT,
    ingested_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_pulses_pulse_id ON pulses(pulse_id);
CREATE INDEX IF NOT EXISTS idx_pulses_tlp ON pulses(tlp);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
