//! Query for the first page of a sync

use crate::http::RequestConfig;
use crate::types::format_date;
use chrono::NaiveDate;

/// Opinions endpoint, relative to the API base URL
pub const OPINIONS_ENDPOINT: &str = "/opinions/";

/// Query parameter carrying the inclusive date floor
pub const DEFAULT_FLOOR_PARAM: &str = "date_filed__gte";

/// Oldest first, so a limited run resumes where it stopped
pub const DEFAULT_ORDER_BY: &str = "date_filed";

/// Endpoint and filters for the first request of a paginated fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpinionQuery {
    /// Endpoint path or absolute URL
    pub endpoint: String,
    /// Inclusive lower bound on the filing date
    pub date_min: Option<NaiveDate>,
    /// Name of the floor query parameter
    pub floor_param: String,
    /// Ordering field, `-` prefix for descending
    pub order_by: Option<String>,
    /// Page size hint
    pub page_size: Option<u32>,
    /// Extra filters, sent verbatim
    pub filters: Vec<(String, String)>,
}

impl Default for OpinionQuery {
    fn default() -> Self {
        Self::new(OPINIONS_ENDPOINT)
    }
}

impl OpinionQuery {
    /// Create a query against the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            date_min: None,
            floor_param: DEFAULT_FLOOR_PARAM.to_string(),
            order_by: Some(DEFAULT_ORDER_BY.to_string()),
            page_size: None,
            filters: Vec::new(),
        }
    }

    /// Query the opinions endpoint
    pub fn opinions() -> Self {
        Self::default()
    }

    /// Set the date floor
    #[must_use]
    pub fn with_date_min(mut self, date: Option<NaiveDate>) -> Self {
        self.date_min = date;
        self
    }

    /// Rename the floor parameter
    #[must_use]
    pub fn with_floor_param(mut self, param: impl Into<String>) -> Self {
        self.floor_param = param.into();
        self
    }

    /// Set the ordering, `None` leaves the API default
    #[must_use]
    pub fn ordered_by(mut self, order_by: Option<String>) -> Self {
        self.order_by = order_by;
        self
    }

    /// Set the page size hint
    #[must_use]
    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    /// Add a filter
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    /// Request settings for the first page
    pub fn to_request(&self) -> RequestConfig {
        let mut request = RequestConfig::new();

        if let Some(date) = self.date_min {
            request = request.query(&self.floor_param, format_date(date));
        }
        if let Some(order_by) = &self.order_by {
            request = request.query("order_by", order_by);
        }
        if let Some(page_size) = self.page_size {
            request = request.query("page_size", page_size.to_string());
        }
        for (key, value) in &self.filters {
            request = request.query(key, value);
        }

        request
    }
}
