//! Idempotent batch writer
//!
//! Inserts one record at a time so a duplicate never blocks its siblings.
//! The store's unique index decides what counts as "already seen".

use crate::pulse::CanonicalRecord;
use crate::storage::{InsertOutcome, PulseStore, StorageError};
use thiserror::Error;

/// Counts for one written batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Records handed to the writer
    pub total: usize,

    /// Records newly stored
    pub inserted: usize,

    /// Records not stored: duplicates, plus records without a pulse id
    pub skipped: usize,
}

/// A non-duplicate storage failure, with the counts reached before it
#[derive(Debug, Error)]
#[error("Storage failure after inserting {} of {} records: {source}", .partial.inserted, .partial.total)]
pub struct WriteError {
    pub partial: BatchReport,
    #[source]
    pub source: StorageError,
}

/// Writes normalized pulses into a store
pub struct PulseWriter<S: PulseStore> {
    store: S,
}

impl<S: PulseStore> PulseWriter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read access to the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the writer, returning the store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Writes a batch, skipping pulses that are already stored
    ///
    /// # Returns
    ///
    /// * `Ok(BatchReport)` - Every record was inserted or skipped; `skipped == total - inserted`
    /// * `Err(WriteError)` - A storage failure other than a duplicate key; terminal for the run
    pub fn write(&mut self, batch: Vec<CanonicalRecord>) -> Result<BatchReport, WriteError> {
        let mut report = BatchReport {
            total: batch.len(),
            ..BatchReport::default()
        };

        for record in batch {
            let Some(pulse_id) = record.pulse_id.as_deref() else {
                tracing::warn!(name = ?record.name, "Pulse without an id cannot be stored; skipping");
                report.skipped += 1;
                continue;
            };

            match self.store.insert_pulse(&record) {
                Ok(InsertOutcome::Inserted) => {
                    tracing::debug!(pulse_id, "Inserted pulse");
                    report.inserted += 1;
                }
                Ok(InsertOutcome::Duplicate) => {
                    tracing::debug!(pulse_id, "Pulse already stored; skipping");
                    report.skipped += 1;
                }
                Err(source) => {
                    return Err(WriteError {
                        partial: report,
                        source,
                    });
                }
            }
        }

        tracing::info!(
            "[DB] API sent {} records, inserted {}, skipped {}",
            report.total,
            report.inserted,
            report.skipped
        );

        Ok(report)
    }
}
