//! Output module for run reporting
//!
//! This module handles:
//! - The per-run summary logged when the loop stops
//! - Store statistics for the `--stats` mode

pub mod stats;
mod summary;

pub use stats::{load_statistics, print_statistics, StoreStatistics};
pub use summary::RunSummary;
