//! Raw pulse to canonical record mapping
//!
//! Normalization never fails: a missing field, or one with an unexpected JSON
//! type, simply comes out as `None`.

use crate::pulse::record::{CanonicalRecord, RawPage, RawRecord};
use chrono::Utc;
use serde_json::{Map, Value};

/// Normalizes every pulse on a page, preserving order
///
/// Each record gets its own `ingested_at` timestamp taken when it is mapped.
pub fn normalize(page: &RawPage) -> Vec<CanonicalRecord> {
    page.results.iter().map(normalize_record).collect()
}

/// Normalizes a single raw pulse
pub fn normalize_record(raw: &RawRecord) -> CanonicalRecord {
    let empty = Map::new();
    let fields = raw.as_object().unwrap_or(&empty);

    CanonicalRecord {
        pulse_id: identifier(fields.get("id")),
        name: string(fields.get("name")),
        description: string(fields.get("description")),
        created: string(fields.get("created")),
        modified: string(fields.get("modified")),
        indicator_count: integer(fields.get("indicator_count")),
        subscriber_count: integer(fields.get("subscriber_count")),
        tags: string_list(fields.get("tags")),
        industries: string_list(fields.get("industries")),
        targeted_countries: string_list(fields.get("targeted_countries")),
        references: string_list(fields.get("references")),
        tlp: string(fields.get("tlp")),
        public: flag(fields.get("public")),
        adversary: string(fields.get("adversary")),
        ingested_at: Utc::now(),
    }
}

/// Pulse ids are hex strings, but numeric ids are accepted and stringified
fn identifier(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string(value: Option<&Value>) -> Option<String> {
    value?.as_str().map(str::to_string)
}

fn integer(value: Option<&Value>) -> Option<i64> {
    value?.as_i64()
}

/// OTX reports `public` as either a boolean or 0/1
fn flag(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

/// Keeps string entries in their original order; other entries are dropped
fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let items = value?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
    )
}
