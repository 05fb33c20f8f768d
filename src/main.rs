//! Pulse-ETL main entry point
//!
//! This is the command-line interface for the pulse harvester.

use anyhow::Context;
use clap::Parser;
use pulse_etl::config::{load_config_with_hash, resolve_api_key, Config};
use pulse_etl::pipeline::{run_etl, FetchSettings};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Pulse-ETL: harvest subscribed threat-intelligence pulses
///
/// Pulls every page of subscribed pulses from the OTX API and stores each
/// pulse once, keyed by its id. Re-running is safe: known pulses are skipped.
#[derive(Parser, Debug)]
#[command(name = "pulse-etl")]
#[command(version)]
#[command(about = "Harvest subscribed OTX pulses into a local store", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be fetched without contacting the API
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // A missing .env file is fine; the key may come from the real environment
    let _ = dotenvy::dotenv();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    if cli.stats {
        handle_stats(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    handle_run(&config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pulse_etl=info,warn"),
            1 => EnvFilter::new("pulse_etl=debug,info"),
            2 => EnvFilter::new("pulse_etl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be fetched
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Pulse-ETL Dry Run ===\n");

    // The key is irrelevant for building the URL and is never printed
    let first_page_url = FetchSettings::from_config(config, String::new())?.page_url(1)?;

    println!("API:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  First page: {}", first_page_url);
    println!("  Page size: {}", config.api.page_size);
    println!("  Key header: {}", config.api.api_key_header);
    println!(
        "  Key variable: {} ({})",
        config.api.api_key_env,
        if resolve_api_key(&config.api).is_ok() {
            "set"
        } else {
            "NOT SET"
        }
    );
    println!("  Request timeout: {}s", config.api.request_timeout_secs);

    println!("\nRetry Policy:");
    println!("  Max attempts per page: {}", config.retry.max_attempts);
    println!("  Transient wait: {}s", config.retry.transient_wait_secs);
    println!(
        "  Rate-limit wait (no Retry-After): {}s",
        config.retry.rate_limit_wait_secs
    );
    println!(
        "  Longest rate-limit wait honoured: {}s",
        config.retry.max_rate_limit_wait_secs
    );
    println!("  Delay between pages: {}s", config.retry.page_delay_secs);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use pulse_etl::output::{load_statistics, print_statistics};
    use pulse_etl::storage::open_storage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))
        .context("Failed to open pulse database")?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main ETL run
async fn handle_run(config: &Config) -> anyhow::Result<ExitCode> {
    let api_key = resolve_api_key(&config.api)?;

    let outcome = run_etl(config, api_key).await?;

    if outcome.reason.is_failure() {
        tracing::error!("Run ended early: {}", outcome.reason);
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
