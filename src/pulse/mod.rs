//! Pulse data model and normalization
//!
//! - `RawPage` / `RawRecord`: what the subscription API returns
//! - `CanonicalRecord`: what gets stored
//! - `normalize`: the pure mapping between the two

mod normalize;
mod record;

pub use normalize::{normalize, normalize_record};
pub use record::{CanonicalRecord, RawPage, RawRecord};
