//! Execution engine module
//!
//! Runs one sync for one user.
//!
//! # Overview
//!
//! A run resolves the date floor, pages through the API, streams each record
//! to the output, and only then moves the user's watermark and updates the
//! user index. A run that fails part way keeps the records it already wrote
//! but leaves the watermark where it was, so rerunning starts from the same
//! floor (and appends those records again).

mod types;

pub use types::{FloorSource, SyncReport, SyncRequest};

use crate::error::Result;
use crate::http::{HttpClient, ReqwestTransport, Transport};
use crate::index::UserIndex;
use crate::output::{JsonlWriter, RecordSink};
use crate::pagination::Paginator;
use crate::state::{advance_floor, FloorStore, Watermark};
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Sync engine for one user at a time
pub struct SyncEngine<T = ReqwestTransport> {
    /// HTTP client
    client: HttpClient<T>,
    /// Watermark store, `None` for one-shot fetches
    floors: Option<Box<dyn FloorStore>>,
    /// User index, updated best-effort
    index: Option<UserIndex>,
}

impl<T: Transport> SyncEngine<T> {
    /// Create an engine without state or index
    pub fn new(client: HttpClient<T>) -> Self {
        Self {
            client,
            floors: None,
            index: None,
        }
    }

    /// Enable incremental mode with the given store
    #[must_use]
    pub fn with_floor_store(mut self, store: Box<dyn FloorStore>) -> Self {
        self.floors = Some(store);
        self
    }

    /// Record runs in a user index
    #[must_use]
    pub fn with_index(mut self, index: UserIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Get the HTTP client
    pub fn client(&self) -> &HttpClient<T> {
        &self.client
    }

    /// Get the floor store, if incremental mode is on
    pub fn floor_store(&self) -> Option<&dyn FloorStore> {
        self.floors.as_deref()
    }

    /// Run a sync, appending to the request's output file
    pub async fn sync(&self, request: &SyncRequest) -> Result<SyncReport> {
        let mut writer = JsonlWriter::open(&request.output_path)?;
        self.sync_into(request, &mut writer).await
    }

    /// Run a sync, writing records to `sink`
    pub async fn sync_into<S: RecordSink + ?Sized>(
        &self,
        request: &SyncRequest,
        sink: &mut S,
    ) -> Result<SyncReport> {
        let start = Instant::now();
        let user = request.user.as_str();

        let stored = match &self.floors {
            Some(store) => store.load_floor(user).await?,
            None => None,
        };
        let (floor_used, floor_source) = match (request.date_min, stored) {
            (Some(date), _) => (Some(date), FloorSource::Explicit),
            (None, Some(date)) => (Some(date), FloorSource::Stored),
            (None, None) => (None, FloorSource::None),
        };

        info!(
            user,
            floor = ?floor_used,
            source = %floor_source,
            limit = ?request.limit,
            "Starting sync"
        );

        let query = request.query.clone().with_date_min(floor_used);
        let mut pager = Paginator::new(
            &self.client,
            &query,
            request.fields.clone(),
            request.limit,
        )
        .with_date_field(&request.date_field);

        let mut watermark = Watermark::new();
        let mut first_record = None;

        loop {
            let paged = match pager.next_record().await {
                Ok(Some(paged)) => paged,
                Ok(None) => break,
                Err(e) => {
                    warn!(
                        user,
                        written = watermark.seen(),
                        "Fetch failed, keeping records written so far: {e}"
                    );
                    return Err(e);
                }
            };

            if let Err(e) = sink.write(&paged.record) {
                warn!(
                    user,
                    written = watermark.seen(),
                    "Write failed, aborting run: {e}"
                );
                return Err(e);
            }

            watermark.observe(paged.filed);
            if first_record.is_none() {
                first_record = Some(paged.record);
            }
        }

        let records_written = watermark.seen();
        let newest_filed = watermark.newest();
        debug!(
            user,
            records_written,
            pages = pager.pages_fetched(),
            newest = ?newest_filed,
            "Fetch complete"
        );

        let saved_floor = match (&self.floors, advance_floor(stored, newest_filed)) {
            (Some(store), Some(date)) => {
                store.save_floor(user, date).await?;
                info!(user, floor = %date, "Saved floor to {}", store.location(user));
                Some(date)
            }
            _ => None,
        };

        if let Some(index) = &self.index {
            if let Err(e) = index
                .record_run(user, records_written, &request.output_path, Utc::now())
                .await
            {
                warn!(user, "Failed to update user index {}: {e}", index.path().display());
            }
        }

        let report = SyncReport {
            user: request.user.clone(),
            records_written,
            pages_fetched: pager.pages_fetched(),
            floor_used,
            floor_source,
            newest_filed,
            saved_floor,
            output_path: request.output_path.clone(),
            first_record,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            user,
            "Completed sync: {} records in {} pages",
            report.records_written,
            report.pages_fetched
        );

        Ok(report)
    }
}

impl<T> std::fmt::Debug for SyncEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("client", &self.client)
            .field("incremental", &self.floors.is_some())
            .field("index", &self.index)
            .finish()
    }
}
