use serde::Deserialize;
use std::time::Duration;

/// Default header carrying the OTX API key
pub const DEFAULT_API_KEY_HEADER: &str = "X-OTX-API-KEY";

/// Default environment variable holding the OTX API key
pub const DEFAULT_API_KEY_ENV: &str = "OTX_API_KEY";

/// Number of pulses requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Per-attempt HTTP timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Attempts allowed per page for non-rate-limit failures
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Wait before retrying a transient failure, in seconds
pub const DEFAULT_TRANSIENT_WAIT_SECS: u64 = 3;

/// Wait after a 429 without a usable Retry-After header, in seconds
pub const DEFAULT_RATE_LIMIT_WAIT_SECS: u64 = 5;

/// Longest a server-supplied Retry-After is honoured, in seconds
pub const DEFAULT_MAX_RATE_LIMIT_WAIT_SECS: u64 = 300;

/// Politeness delay between pages, in seconds
pub const DEFAULT_PAGE_DELAY_SECS: u64 = 1;

/// Main configuration structure for Pulse-ETL
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub output: OutputConfig,
}

/// Remote subscription API settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the API, e.g. `https://otx.alienvault.com/api/v1`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Header name the API key is sent in
    #[serde(rename = "api-key-header", default = "default_api_key_header")]
    pub api_key_header: String,

    /// Environment variable the API key is read from
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    /// Pulses per page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Timeout for a single HTTP attempt (seconds)
    #[serde(
        rename = "request-timeout-secs",
        default = "default_request_timeout_secs"
    )]
    pub request_timeout_secs: u64,
}

/// Retry and pacing policy
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Attempts per page for transient failures (rate limits are not counted)
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait between transient failures (seconds)
    #[serde(
        rename = "transient-wait-secs",
        default = "default_transient_wait_secs"
    )]
    pub transient_wait_secs: u64,

    /// Wait on HTTP 429 when the server gives no hint (seconds)
    #[serde(
        rename = "rate-limit-wait-secs",
        default = "default_rate_limit_wait_secs"
    )]
    pub rate_limit_wait_secs: u64,

    /// Upper bound on any single rate-limit wait, including Retry-After (seconds)
    #[serde(
        rename = "max-rate-limit-wait-secs",
        default = "default_max_rate_limit_wait_secs"
    )]
    pub max_rate_limit_wait_secs: u64,

    /// Delay between consecutive pages (seconds)
    #[serde(rename = "page-delay-secs", default = "default_page_delay_secs")]
    pub page_delay_secs: u64,
}

impl RetryConfig {
    pub fn transient_wait(&self) -> Duration {
        Duration::from_secs(self.transient_wait_secs)
    }

    pub fn rate_limit_wait(&self) -> Duration {
        Duration::from_secs(self.rate_limit_wait_secs)
    }

    pub fn max_rate_limit_wait(&self) -> Duration {
        Duration::from_secs(self.max_rate_limit_wait_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_secs(self.page_delay_secs)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            transient_wait_secs: DEFAULT_TRANSIENT_WAIT_SECS,
            rate_limit_wait_secs: DEFAULT_RATE_LIMIT_WAIT_SECS,
            max_rate_limit_wait_secs: DEFAULT_MAX_RATE_LIMIT_WAIT_SECS,
            page_delay_secs: DEFAULT_PAGE_DELAY_SECS,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_api_key_header() -> String {
    DEFAULT_API_KEY_HEADER.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_transient_wait_secs() -> u64 {
    DEFAULT_TRANSIENT_WAIT_SECS
}

fn default_rate_limit_wait_secs() -> u64 {
    DEFAULT_RATE_LIMIT_WAIT_SECS
}

fn default_max_rate_limit_wait_secs() -> u64 {
    DEFAULT_MAX_RATE_LIMIT_WAIT_SECS
}

fn default_page_delay_secs() -> u64 {
    DEFAULT_PAGE_DELAY_SECS
}
