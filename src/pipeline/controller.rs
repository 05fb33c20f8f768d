//! Pagination loop controller - main ETL orchestration logic
//!
//! Drives Fetcher -> Normalizer -> Writer page by page as an explicit state
//! machine (see [`LoopState`]), accumulating a [`RunSummary`] until a
//! terminal state is reached. Every stop reason still produces a summary.

use crate::output::RunSummary;
use crate::pipeline::fetcher::PageSource;
use crate::pipeline::pause::Pause;
use crate::pipeline::writer::PulseWriter;
use crate::pulse::{normalize, RawPage};
use crate::state::{LoopState, StopReason};
use crate::storage::PulseStore;
use crate::EtlError;
use std::sync::Arc;
use std::time::Duration;

/// Final result of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub reason: StopReason,
}

/// Main ETL controller structure
pub struct Controller<F: PageSource, S: PulseStore> {
    source: F,
    writer: PulseWriter<S>,
    pause: Arc<dyn Pause>,
    page_delay: Duration,
}

impl<F: PageSource, S: PulseStore> Controller<F, S> {
    /// Creates a new controller
    ///
    /// # Arguments
    ///
    /// * `source` - Where pages come from
    /// * `writer` - Where normalized pulses go
    /// * `pause` - Used for the politeness delay between pages
    /// * `page_delay` - How long to wait before requesting the next page
    pub fn new(
        source: F,
        writer: PulseWriter<S>,
        pause: Arc<dyn Pause>,
        page_delay: Duration,
    ) -> Self {
        Self {
            source,
            writer,
            pause,
            page_delay,
        }
    }

    pub fn writer(&self) -> &PulseWriter<S> {
        &self.writer
    }

    /// Consumes the controller, returning the writer and its store
    pub fn into_writer(self) -> PulseWriter<S> {
        self.writer
    }

    /// Runs the loop from page 1 until a terminal state
    ///
    /// Never returns an error: failures become a [`StopReason`] and the
    /// partial summary is still reported.
    pub async fn run(&mut self) -> RunOutcome {
        tracing::info!("[ETL] Starting pulse ETL job (full load)");

        let mut summary = RunSummary::new();
        let mut state = LoopState::initial();

        let reason = loop {
            tracing::trace!(state = %state, "Loop transition");

            state = match state {
                LoopState::Fetching(page) => self.fetch_page(page, &mut summary).await,

                LoopState::Processing { page, raw } => {
                    match self.process_page(page, raw, &mut summary) {
                        Ok(next) => next,
                        Err(e) => {
                            tracing::error!(page, "[ETL Error] {}", e);
                            LoopState::Stopped(StopReason::Unexpected)
                        }
                    }
                }

                LoopState::Advancing(page) => match self.advance(page).await {
                    Ok(next) => next,
                    Err(e) => {
                        tracing::error!(page, "[ETL Error] {}", e);
                        LoopState::Stopped(StopReason::Unexpected)
                    }
                },

                LoopState::Stopped(reason) => break reason,
            };
        };

        summary.log(reason);

        RunOutcome { summary, reason }
    }

    /// `Fetching(p)`: request the page and decide whether there is work
    async fn fetch_page(&mut self, page: u32, summary: &mut RunSummary) -> LoopState {
        tracing::info!("[ETL] Processing page {}...", page);

        let raw = match self.source.fetch(page).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(page, attempts = e.attempts, "[ETL Error] {}", e);
                return LoopState::Stopped(StopReason::FetchFailed);
            }
        };

        tracing::info!("[ETL] Received {} pulses from API", raw.len());
        summary.record_page(raw.len());

        if raw.is_empty() {
            return LoopState::Stopped(StopReason::EmptyPage);
        }

        LoopState::Processing { page, raw }
    }

    /// `Processing(p)`: normalize, write, and decide whether to continue
    fn process_page(
        &mut self,
        page: u32,
        raw: RawPage,
        summary: &mut RunSummary,
    ) -> Result<LoopState, EtlError> {
        let records = normalize(&raw);

        let report = match self.writer.write(records) {
            Ok(report) => report,
            Err(e) => {
                summary.record_batch(&e.partial);
                return Err(e.into());
            }
        };
        summary.record_batch(&report);

        if !raw.has_next() {
            tracing::debug!(page, "No next page reported");
            return Ok(LoopState::Stopped(StopReason::EndOfPages));
        }

        Ok(LoopState::Advancing(page))
    }

    /// `Advancing`: politeness delay, then the next page number
    async fn advance(&mut self, page: u32) -> Result<LoopState, EtlError> {
        let next = page.checked_add(1).ok_or(EtlError::PageOverflow(page))?;
        self.pause.pause(self.page_delay).await;
        Ok(LoopState::Fetching(next))
    }
}
