//! State module for tracking run progress
//!
//! # Components
//!
//! - `LoopState`: where the pagination loop currently is
//! - `StopReason`: why a run ended

mod loop_state;

pub use loop_state::{LoopState, StopReason};
