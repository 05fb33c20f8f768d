//! Run summary aggregation
//!
//! A `RunSummary` lives for exactly one run: created when the loop starts,
//! added to after every page, logged once when the loop stops. It is never
//! persisted.

use crate::pipeline::BatchReport;
use crate::state::StopReason;

/// Aggregate counters for one full run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Pages successfully fetched, including a final empty page
    pub pages_processed: u64,

    /// Pulses the API returned across all pages
    pub records_received: u64,

    /// Pulses newly stored during this run
    pub records_inserted: u64,

    /// Pulses not stored because they were already known (or had no id)
    pub records_skipped: u64,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one fetched page and the pulses it carried
    pub fn record_page(&mut self, received: usize) {
        self.pages_processed += 1;
        self.records_received += received as u64;
    }

    /// Adds the outcome of one written batch
    pub fn record_batch(&mut self, report: &BatchReport) {
        self.records_inserted += report.inserted as u64;
        self.records_skipped += report.skipped as u64;
    }

    /// Emits the final summary lines
    pub fn log(&self, reason: StopReason) {
        if reason.is_failure() {
            tracing::warn!(
                reason = %reason,
                "Run stopped early; partial progress: {} pages, {} received, {} inserted, {} skipped",
                self.pages_processed,
                self.records_received,
                self.records_inserted,
                self.records_skipped
            );
        } else {
            tracing::info!(
                reason = %reason,
                pages = self.pages_processed,
                "Run finished"
            );
        }

        tracing::info!(
            "Completed. Total API records received: {}, total new inserted: {}",
            self.records_received,
            self.records_inserted
        );
    }
}
