//! Pulse-ETL: a subscription harvester for threat-intelligence pulses
//!
//! This crate pulls paginated pulses from the AlienVault OTX subscription API,
//! normalizes them, and stores each pulse exactly once in a local SQLite store
//! keyed by its pulse id.

pub mod config;
pub mod output;
pub mod pipeline;
pub mod pulse;
pub mod state;
pub mod storage;

use thiserror::Error;

pub use pipeline::{FetchError, WriteError};

/// Main error type for Pulse-ETL operations
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Page counter overflow after page {0}")]
    PageOverflow(u32),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("API key not found in environment variable {0}")]
    MissingApiKey(String),
}

/// Result type alias for Pulse-ETL operations
pub type Result<T> = std::result::Result<T, EtlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use output::RunSummary;
pub use pulse::{normalize, CanonicalRecord, RawPage};
pub use state::{LoopState, StopReason};
