//! ETL pipeline module
//!
//! This module contains the core extract-transform-load logic, including:
//! - HTTP page fetching with rate-limit and transient-failure retries
//! - Idempotent batch writing against the pulse store
//! - The pagination loop that ties both to the normalizer

mod controller;
mod fetcher;
mod pause;
mod writer;

pub use controller::{Controller, RunOutcome};
pub use fetcher::{build_http_client, FetchError, FetchSettings, HttpFetcher, PageSource};
pub use pause::{Pause, RecordingPause, TokioPause};
pub use writer::{BatchReport, PulseWriter, WriteError};

use crate::config::Config;
use crate::storage::open_storage;
use crate::EtlError;
use std::path::Path;
use std::sync::Arc;

/// Runs a complete ETL pass
///
/// This is the main entry point. It will:
/// 1. Open (or create) the pulse store
/// 2. Build the HTTP fetcher
/// 3. Walk every subscribed page, storing pulses not seen before
/// 4. Log and return the run summary
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `api_key` - The resolved API key
///
/// # Returns
///
/// * `Ok(RunOutcome)` - The run reached a stop state (which may itself be a failure)
/// * `Err(EtlError)` - Setup failed before the loop could start
///
/// # Example
///
/// ```no_run
/// use pulse_etl::config::{load_config, resolve_api_key};
/// use pulse_etl::pipeline::run_etl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("pulse-etl.toml"))?;
/// let api_key = resolve_api_key(&config.api)?;
/// let outcome = run_etl(&config, api_key).await?;
/// println!("Inserted {} new pulses", outcome.summary.records_inserted);
/// # Ok(())
/// # }
/// ```
pub async fn run_etl(config: &Config, api_key: String) -> Result<RunOutcome, EtlError> {
    let storage = open_storage(Path::new(&config.output.database_path))?;
    let pause: Arc<dyn Pause> = Arc::new(TokioPause);

    let settings = FetchSettings::from_config(config, api_key)?;
    let fetcher = HttpFetcher::new(settings, Arc::clone(&pause))?;

    let mut controller = Controller::new(
        fetcher,
        PulseWriter::new(storage),
        pause,
        config.retry.page_delay(),
    );

    Ok(controller.run().await)
}
