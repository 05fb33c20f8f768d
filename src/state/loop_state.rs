//! Loop state definitions for the pagination controller
//!
//! This module defines every state the ETL loop can be in and why it stops.
use crate::pulse::RawPage;
use std::fmt;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    // ===== Normal Completion =====
    /// The last page reported no successor
    EndOfPages,

    /// A page came back with zero pulses
    EmptyPage,

    // ===== Failures =====
    /// A page could not be fetched within the retry budget
    FetchFailed,

    /// Processing or advancing hit an error (including a storage failure)
    Unexpected,
}

impl StopReason {
    /// Returns true if the run ended because something went wrong
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::Unexpected)
    }

    /// Short machine-friendly name, used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EndOfPages => "end_of_pages",
            Self::EmptyPage => "empty_page",
            Self::FetchFailed => "fetch_failed",
            Self::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents the current state of the pagination loop
///
/// The loop starts in `Fetching(1)` and always ends in `Stopped`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    /// About to request the given page
    Fetching(u32),

    /// A non-empty page is in hand and must be normalized and written
    Processing { page: u32, raw: RawPage },

    /// The given page is done and the API reported another one
    Advancing(u32),

    /// Terminal state
    Stopped(StopReason),
}

impl LoopState {
    /// The state every run begins in
    pub fn initial() -> Self {
        Self::Fetching(1)
    }

    /// Returns true once the loop has stopped
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped(_))
    }

    /// Page number this state refers to, if any
    pub fn page(&self) -> Option<u32> {
        match self {
            Self::Fetching(page) | Self::Advancing(page) => Some(*page),
            Self::Processing { page, .. } => Some(*page),
            Self::Stopped(_) => None,
        }
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetching(page) => write!(f, "fetching({})", page),
            Self::Processing { page, .. } => write!(f, "processing({})", page),
            Self::Advancing(page) => write!(f, "advancing({})", page),
            Self::Stopped(reason) => write!(f, "stopped({})", reason),
        }
    }
}
