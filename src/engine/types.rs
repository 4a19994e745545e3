//! Engine types
//!
//! Request and report types for one sync run.

use crate::pagination::OpinionQuery;
use crate::types::{Record, DEFAULT_DATE_FIELD};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// What to fetch for one user
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// User identity, keys the state and index entries
    pub user: String,
    /// Endpoint and filters, without the date floor
    pub query: OpinionQuery,
    /// Explicit floor, wins over the stored one
    pub date_min: Option<NaiveDate>,
    /// Fields to keep, `None` keeps whole records
    pub fields: Option<Vec<String>>,
    /// Maximum records to fetch, `None` for no limit
    pub limit: Option<usize>,
    /// Field holding the filing date
    pub date_field: String,
    /// Output file, recorded in the user index
    pub output_path: PathBuf,
}

impl SyncRequest {
    /// Create a request with default query and no limit
    pub fn new(user: impl Into<String>, output_path: impl AsRef<Path>) -> Self {
        Self {
            user: user.into(),
            query: OpinionQuery::opinions(),
            date_min: None,
            fields: None,
            limit: None,
            date_field: DEFAULT_DATE_FIELD.to_string(),
            output_path: output_path.as_ref().to_path_buf(),
        }
    }

    /// Set the query
    #[must_use]
    pub fn with_query(mut self, query: OpinionQuery) -> Self {
        self.query = query;
        self
    }

    /// Set an explicit date floor
    #[must_use]
    pub fn with_date_min(mut self, date: Option<NaiveDate>) -> Self {
        self.date_min = date;
        self
    }

    /// Set the field allowlist
    #[must_use]
    pub fn with_fields(mut self, fields: Option<Vec<String>>) -> Self {
        self.fields = fields;
        self
    }

    /// Set the record limit
    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Read filing dates from another field
    #[must_use]
    pub fn with_date_field(mut self, field: impl Into<String>) -> Self {
        self.date_field = field.into();
        self
    }
}

/// Where the floor of a run came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloorSource {
    /// Given on the request
    Explicit,
    /// Read from the floor store
    Stored,
    /// No floor, everything is fetched
    None,
}

impl std::fmt::Display for FloorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explicit => f.write_str("explicit"),
            Self::Stored => f.write_str("stored"),
            Self::None => f.write_str("none"),
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    /// User the run was for
    pub user: String,
    /// Records written to the output
    pub records_written: usize,
    /// Pages fetched from the API
    pub pages_fetched: usize,
    /// Floor sent with the query
    pub floor_used: Option<NaiveDate>,
    /// Where that floor came from
    pub floor_source: FloorSource,
    /// Newest filing date among the written records
    pub newest_filed: Option<NaiveDate>,
    /// Floor written to the store, `None` if unchanged
    pub saved_floor: Option<NaiveDate>,
    /// Output file
    pub output_path: PathBuf,
    /// First record written, for the run summary
    pub first_record: Option<Record>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}
