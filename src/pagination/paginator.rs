//! Paginator over an opinion query

use super::query::OpinionQuery;
use crate::error::Result;
use crate::http::{HttpClient, ReqwestTransport, RequestConfig, Transport};
use crate::types::{filing_date, Record, DEFAULT_DATE_FIELD};
use chrono::NaiveDate;
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// A record as yielded by the paginator
#[derive(Debug, Clone, PartialEq)]
pub struct PagedRecord {
    /// The record, reduced to the field allowlist
    pub record: Record,
    /// Filing date, read before projection
    pub filed: Option<NaiveDate>,
}

/// Reduce a record to `fields`, in allowlist order.
///
/// Fields missing from the record are left out rather than written as null.
pub fn project(mut record: Record, fields: &[String]) -> Record {
    let mut projected = Record::new();
    for field in fields {
        if let Some(value) = record.remove(field) {
            projected.insert(field.clone(), value);
        }
    }
    projected
}

/// Single-pass cursor over the records of a query.
///
/// Pages are fetched lazily: a page is only requested when the buffered
/// records are used up and the limit still allows more. Once it returns
/// `None` or an error the paginator stays exhausted.
pub struct Paginator<'a, T = ReqwestTransport> {
    client: &'a HttpClient<T>,
    first_request: Option<RequestConfig>,
    next_url: Option<String>,
    buffer: VecDeque<Record>,
    fields: Option<Vec<String>>,
    date_field: String,
    limit: Option<usize>,
    yielded: usize,
    pages_fetched: usize,
    exhausted: bool,
}

impl<'a, T: Transport> Paginator<'a, T> {
    /// Create a paginator for `query`
    pub fn new(
        client: &'a HttpClient<T>,
        query: &OpinionQuery,
        fields: Option<Vec<String>>,
        limit: Option<usize>,
    ) -> Self {
        Self {
            client,
            first_request: Some(query.to_request()),
            next_url: Some(query.endpoint.clone()),
            buffer: VecDeque::new(),
            fields,
            date_field: DEFAULT_DATE_FIELD.to_string(),
            limit,
            yielded: 0,
            pages_fetched: 0,
            exhausted: false,
        }
    }

    /// Read filing dates from another field
    #[must_use]
    pub fn with_date_field(mut self, field: impl Into<String>) -> Self {
        self.date_field = field.into();
        self
    }

    /// Whether a call to [`next_record`](Self::next_record) may still yield
    pub fn has_more(&self) -> bool {
        !self.exhausted
            && !self.limit_reached()
            && (!self.buffer.is_empty() || self.next_url.is_some())
    }

    /// Whether the paginator is finished for good
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Records yielded so far
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Pages fetched so far
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Yield the next record, fetching another page when needed
    pub async fn next_record(&mut self) -> Result<Option<PagedRecord>> {
        loop {
            if self.exhausted || self.limit_reached() {
                self.finish();
                return Ok(None);
            }

            if let Some(record) = self.buffer.pop_front() {
                self.yielded += 1;
                return Ok(Some(self.accept(record)));
            }

            let Some(url) = self.next_url.take() else {
                self.finish();
                return Ok(None);
            };

            let request = self.first_request.take().unwrap_or_default();
            let page = match self.client.fetch(&url, &request).await {
                Ok(page) => page,
                Err(e) => {
                    self.finish();
                    return Err(e);
                }
            };

            self.pages_fetched += 1;
            debug!(
                "Page {}: {} records, next: {:?}",
                self.pages_fetched,
                page.len(),
                page.next
            );

            if page.next.as_deref() == Some(url.as_str()) {
                warn!("Page {} links to itself, stopping", self.pages_fetched);
                self.next_url = None;
            } else {
                self.next_url = page.next;
            }
            self.buffer.extend(page.records);
        }
    }

    /// Consume the paginator as a stream of records
    pub fn into_stream(self) -> impl Stream<Item = Result<PagedRecord>> + 'a
    where
        T: 'a,
    {
        stream::try_unfold(self, |mut pager| async move {
            Ok(pager.next_record().await?.map(|record| (record, pager)))
        })
    }

    fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|limit| self.yielded >= limit)
    }

    fn accept(&self, record: Record) -> PagedRecord {
        let filed = filing_date(&record, &self.date_field);
        let record = match &self.fields {
            Some(fields) => project(record, fields),
            None => record,
        };
        PagedRecord { record, filed }
    }

    fn finish(&mut self) {
        self.exhausted = true;
        self.buffer.clear();
        self.next_url = None;
    }
}

impl<T> std::fmt::Debug for Paginator<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("next_url", &self.next_url)
            .field("buffered", &self.buffer.len())
            .field("limit", &self.limit)
            .field("yielded", &self.yielded)
            .field("pages_fetched", &self.pages_fetched)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}
