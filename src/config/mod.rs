//! Configuration module for Pulse-ETL
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and resolving the API key from the environment.
//!
//! # Example
//!
//! ```no_run
//! use pulse_etl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("pulse-etl.toml")).unwrap();
//! println!("Fetching {} pulses per page", config.api.page_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, Config, OutputConfig, RetryConfig, DEFAULT_API_KEY_ENV, DEFAULT_API_KEY_HEADER,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_RATE_LIMIT_WAIT_SECS, DEFAULT_PAGE_DELAY_SECS,
    DEFAULT_PAGE_SIZE, DEFAULT_RATE_LIMIT_WAIT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_TRANSIENT_WAIT_SECS,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, resolve_api_key,
    resolve_api_key_from,
};
