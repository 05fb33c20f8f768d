//! Statistics generation from the pulse store
//!
//! This module provides functionality for extracting and displaying
//! store statistics for the `--stats` mode.

use crate::storage::PulseStore;
use crate::EtlError;

/// Pulse store statistics summary
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    /// Total number of stored pulses
    pub total_pulses: u64,

    /// Pulse counts per TLP marking, most common first
    pub pulses_by_tlp: Vec<(Option<String>, u64)>,

    /// First ingestion timestamp (RFC 3339)
    pub first_ingested: Option<String>,

    /// Most recent ingestion timestamp (RFC 3339)
    pub last_ingested: Option<String>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(EtlError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn PulseStore) -> Result<StoreStatistics, EtlError> {
    let total_pulses = storage.count_pulses()?;
    let pulses_by_tlp = storage.count_by_tlp()?;
    let (first_ingested, last_ingested) = match storage.ingestion_window()? {
        Some((first, last)) => (Some(first), Some(last)),
        None => (None, None),
    };

    Ok(StoreStatistics {
        total_pulses,
        pulses_by_tlp,
        first_ingested,
        last_ingested,
    })
}

/// Prints statistics to stdout in a human-readable format
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Pulse Store Statistics ===\n");

    println!("Total pulses: {}", stats.total_pulses);
    println!();

    if !stats.pulses_by_tlp.is_empty() {
        println!("Pulses by TLP:");
        for (tlp, count) in &stats.pulses_by_tlp {
            let label = tlp.as_deref().unwrap_or("(unmarked)");
            let share = if stats.total_pulses > 0 {
                (*count as f64 / stats.total_pulses as f64) * 100.0
            } else {
                0.0
            };
            println!("  {:<12} {:>8} ({:.1}%)", label, count, share);
        }
        println!();
    }

    match (&stats.first_ingested, &stats.last_ingested) {
        (Some(first), Some(last)) => {
            println!("First ingested: {}", first);
            println!("Last ingested:  {}", last);
        }
        _ => println!("No pulses ingested yet"),
    }
}
