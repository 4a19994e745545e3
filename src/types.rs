//! Common types used throughout courtsync
//!
//! Records are kept as opaque JSON objects; the only structure the crate
//! relies on is the filing-date field used for the incremental watermark.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// One record as returned by the API, field order preserved
pub type Record = serde_json::Map<String, JsonValue>;

/// Default field holding an opinion's filing date
pub const DEFAULT_DATE_FIELD: &str = "date_filed";

/// Format used for dates in query parameters and state files
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Page
// ============================================================================

/// One batch of results plus the continuation cursor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Records on this page
    pub records: Vec<Record>,
    /// URL of the next page, `None` on the last page
    pub next: Option<String>,
}

#[derive(Deserialize)]
struct RawPage {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    next: Option<String>,
}

impl Page {
    /// Parse a page from an API response body
    pub fn from_body(body: &str) -> crate::Result<Self> {
        let raw: RawPage = serde_json::from_str(body)
            .map_err(|e| crate::Error::decode(format!("invalid page body: {e}")))?;

        let records = raw
            .results
            .into_iter()
            .enumerate()
            .map(|(i, value)| match value {
                Value::Object(map) => Ok(map),
                other => Err(crate::Error::decode(format!(
                    "result {i} is not an object: {other}"
                ))),
            })
            .collect::<crate::Result<Vec<_>>>()?;

        let next = raw.next.filter(|n| !n.trim().is_empty());
        Ok(Self { records, next })
    }

    /// Whether another page follows this one
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Number of records on the page
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the page holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// Filing dates
// ============================================================================

/// Extract the filing date of a record.
///
/// Only the leading `YYYY-MM-DD` part of the value is considered, so both
/// plain dates and timestamps work. Missing or unparseable values yield `None`.
pub fn filing_date(record: &Record, field: &str) -> Option<NaiveDate> {
    let raw = match record.get(field)? {
        Value::String(s) => s.as_str(),
        _ => return None,
    };
    let head = raw.get(..10)?;
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Format a date the way the API and state files expect
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
