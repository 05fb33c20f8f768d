//! Raw and canonical pulse shapes

use chrono::{DateTime, Utc};
use serde_json::Value;

/// One pulse exactly as the API returned it
///
/// Kept as untyped JSON: any field may be missing or carry an unexpected type.
pub type RawRecord = Value;

/// The response of a single page request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPage {
    /// Pulses in the order the API returned them
    pub results: Vec<RawRecord>,

    /// URL of the next page, if the API reported one
    pub next: Option<String>,
}

impl RawPage {
    /// Builds a page from a decoded response body
    ///
    /// A body that is not an object, a missing or non-array `results`, and a
    /// `next` that is not a non-empty string all degrade to "nothing there".
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut body) = value else {
            return Self::default();
        };

        let results = match body.remove("results") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };

        let next = match body.remove("next") {
            Some(Value::String(url)) if !url.is_empty() => Some(url),
            _ => None,
        };

        Self { results, next }
    }

    /// Decodes a page from a raw response body
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(bytes)?;
        Ok(Self::from_value(value))
    }

    /// Number of pulses on this page
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Whether the API reported another page after this one
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

/// A pulse in the shape it is stored in
///
/// `pulse_id` is the identity: two records with the same id are the same pulse,
/// and only the first one ever seen is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub pulse_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
    pub indicator_count: Option<i64>,
    pub subscriber_count: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub industries: Option<Vec<String>>,
    pub targeted_countries: Option<Vec<String>>,
    pub references: Option<Vec<String>>,
    pub tlp: Option<String>,
    pub public: Option<bool>,
    pub adversary: Option<String>,

    /// When this record was normalized, not when the source last changed it
    pub ingested_at: DateTime<Utc>,
}

impl CanonicalRecord {
    /// Creates a record with only an id and an ingestion time
    pub fn new(pulse_id: impl Into<String>, ingested_at: DateTime<Utc>) -> Self {
        Self {
            pulse_id: Some(pulse_id.into()),
            ..Self::empty(ingested_at)
        }
    }

    /// Creates a record with every source field absent
    pub fn empty(ingested_at: DateTime<Utc>) -> Self {
        Self {
            pulse_id: None,
            name: None,
            description: None,
            created: None,
            modified: None,
            indicator_count: None,
            subscriber_count: None,
            tags: None,
            industries: None,
            targeted_countries: None,
            references: None,
            tlp: None,
            public: None,
            adversary: None,
            ingested_at,
        }
    }
}
