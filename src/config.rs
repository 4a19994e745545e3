//! Configuration
//!
//! Settings come from, lowest precedence first: built-in defaults, an
//! optional JSON config file, environment variables, command-line flags.
//! Every layer is a [`Settings`] with optional fields; layers are combined
//! with [`Settings::merge`] and checked once by [`Settings::resolve`], before
//! any request is made.

use crate::engine::SyncRequest;
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig, RetryPolicy};
use crate::output::{output_path_for, validate_user};
use crate::pagination::{OpinionQuery, DEFAULT_FLOOR_PARAM, DEFAULT_ORDER_BY, OPINIONS_ENDPOINT};
use crate::state::{FileFloorStore, FloorStore, SinceFileStore};
use crate::types::{parse_date, DEFAULT_DATE_FIELD};
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

/// CourtListener REST API root
pub const DEFAULT_BASE_URL: &str = "https://www.courtlistener.com/api/rest/v4";

/// Records fetched per run unless told otherwise
pub const DEFAULT_LIMIT: usize = 10;

/// Seconds before a single attempt times out
pub const DEFAULT_TIMEOUT_SECS: f64 = 60.0;

/// Directory for output files and the user index
pub const DEFAULT_DATA_DIR: &str = "data";

/// Index file name inside the data directory
pub const INDEX_FILE_NAME: &str = "users.json";

/// `App/version (Operator Name someone@example.org)`
static USER_AGENT_POLICY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[A-Za-z0-9][\w.\-]*/[\w.\-]+",
        r"\s+\(?\s*\p{L}[\p{L}'.\-]*(\s+\p{L}[\p{L}'.\-]*)*,?",
        r"\s+<?[\w.+\-]+@[\w\-]+(\.[\w\-]+)+>?",
    ))
    .expect("Invalid user agent regex")
});

/// One layer of configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// API token
    pub token: Option<String>,
    /// Identifying User-Agent
    pub user_agent: Option<String>,
    /// API root
    pub base_url: Option<String>,
    /// Endpoint below the API root
    pub endpoint: Option<String>,
    /// Per-attempt timeout in seconds
    pub timeout_secs: Option<f64>,
    /// Attempts per page request
    pub max_retries: Option<u32>,
    /// First backoff delay in seconds
    pub backoff_factor: Option<f64>,
    /// Request pacing, unset for none
    pub requests_per_second: Option<u32>,
    /// Comma-separated field allowlist
    pub fields: Option<String>,
    /// Explicit date floor, `YYYY-MM-DD`
    pub date_min: Option<String>,
    /// Records per run
    pub limit: Option<usize>,
    /// Ignore the limit and fetch everything
    pub all: Option<bool>,
    /// Page size hint
    pub page_size: Option<u32>,
    /// Ordering field
    pub order_by: Option<String>,
    /// Floor query parameter name
    pub floor_param: Option<String>,
    /// Field holding the filing date
    pub date_field: Option<String>,
    /// User identity
    pub user: Option<String>,
    /// Output and index directory
    pub data_dir: Option<PathBuf>,
    /// User index file
    pub index_file: Option<PathBuf>,
    /// Single since-file for the watermark
    pub since_file: Option<PathBuf>,
    /// Directory of per-user watermark files
    pub state_dir: Option<PathBuf>,
}

/// Where the watermark is kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateTarget {
    /// One-shot fetch, no watermark
    None,
    /// A single since-file
    SinceFile(PathBuf),
    /// One file per user in a directory
    Directory(PathBuf),
}

impl StateTarget {
    /// Build the matching store
    pub fn into_store(self) -> Option<Box<dyn FloorStore>> {
        match self {
            Self::None => None,
            Self::SinceFile(path) => Some(Box::new(SinceFileStore::new(path))),
            Self::Directory(dir) => Some(Box::new(FileFloorStore::new(dir))),
        }
    }
}

/// Validated configuration for a fetch
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub http: HttpClientConfig,
    pub request: SyncRequest,
    pub state: StateTarget,
    pub index_file: PathBuf,
}

impl Settings {
    /// Load a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Parse settings from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid config: {e}")))
    }

    /// Overlay `over` on top of `self`; values set in `over` win
    #[must_use]
    pub fn merge(self, over: Settings) -> Settings {
        Settings {
            token: over.token.or(self.token),
            user_agent: over.user_agent.or(self.user_agent),
            base_url: over.base_url.or(self.base_url),
            endpoint: over.endpoint.or(self.endpoint),
            timeout_secs: over.timeout_secs.or(self.timeout_secs),
            max_retries: over.max_retries.or(self.max_retries),
            backoff_factor: over.backoff_factor.or(self.backoff_factor),
            requests_per_second: over.requests_per_second.or(self.requests_per_second),
            fields: over.fields.or(self.fields),
            date_min: over.date_min.or(self.date_min),
            limit: over.limit.or(self.limit),
            all: over.all.or(self.all),
            page_size: over.page_size.or(self.page_size),
            order_by: over.order_by.or(self.order_by),
            floor_param: over.floor_param.or(self.floor_param),
            date_field: over.date_field.or(self.date_field),
            user: over.user.or(self.user),
            data_dir: over.data_dir.or(self.data_dir),
            index_file: over.index_file.or(self.index_file),
            since_file: over.since_file.or(self.since_file),
            state_dir: over.state_dir.or(self.state_dir),
        }
    }

    /// Validated user identity
    pub fn user(&self) -> Result<&str> {
        let user = self
            .user
            .as_deref()
            .ok_or_else(|| Error::missing_field("user"))?;
        validate_user(user)?;
        Ok(user)
    }

    /// Data directory
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// User index file
    pub fn index_path(&self) -> PathBuf {
        self.index_file
            .clone()
            .unwrap_or_else(|| self.data_dir().join(INDEX_FILE_NAME))
    }

    /// Where the watermark is kept
    pub fn state_target(&self) -> Result<StateTarget> {
        match (&self.since_file, &self.state_dir) {
            (Some(_), Some(_)) => Err(Error::config(
                "use either since_file or state_dir, not both",
            )),
            (Some(path), None) => Ok(StateTarget::SinceFile(path.clone())),
            (None, Some(dir)) => Ok(StateTarget::Directory(dir.clone())),
            (None, None) => Ok(StateTarget::None),
        }
    }

    /// Check everything a fetch needs and build its configuration
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let token = required(self.token.as_deref(), "token")?;
        let user_agent = required(self.user_agent.as_deref(), "user_agent")?;
        validate_user_agent(user_agent)?;
        let user = self.user()?;

        let timeout = seconds(
            "timeout_secs",
            self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            false,
        )?;
        let backoff = seconds(
            "backoff_factor",
            self.backoff_factor
                .unwrap_or(RetryPolicy::default().initial_backoff.as_secs_f64()),
            true,
        )?;
        let attempts = self
            .max_retries
            .unwrap_or(RetryPolicy::default().max_attempts);
        if attempts == 0 {
            return Err(Error::invalid_value("max_retries", "must be at least 1"));
        }

        let base_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        Url::parse(base_url)
            .map_err(|e| Error::invalid_value("base_url", format!("'{base_url}': {e}")))?;

        let mut http = HttpClientConfig::builder()
            .base_url(base_url)
            .timeout(timeout)
            .retry(RetryPolicy::new(attempts, backoff))
            .token(token)
            .user_agent(user_agent);
        if let Some(rps) = self.requests_per_second {
            if rps == 0 {
                return Err(Error::invalid_value(
                    "requests_per_second",
                    "must be at least 1",
                ));
            }
            http = http.rate_limit(RateLimiterConfig::per_second(rps));
        }

        let limit = if self.all.unwrap_or(false) {
            None
        } else {
            let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
            if limit == 0 {
                return Err(Error::invalid_value(
                    "limit",
                    "must be at least 1 (use --all for no limit)",
                ));
            }
            Some(limit)
        };

        let query = OpinionQuery::new(self.endpoint.as_deref().unwrap_or(OPINIONS_ENDPOINT))
            .with_floor_param(self.floor_param.as_deref().unwrap_or(DEFAULT_FLOOR_PARAM))
            .ordered_by(order_by(self.order_by.as_deref()))
            .with_page_size(self.page_size);

        let request = SyncRequest::new(user, output_path_for(&self.data_dir(), user)?)
            .with_query(query)
            .with_date_min(self.date_min()?)
            .with_fields(self.fields()?)
            .with_limit(limit)
            .with_date_field(self.date_field.as_deref().unwrap_or(DEFAULT_DATE_FIELD));

        Ok(ResolvedConfig {
            http: http.build(),
            request,
            state: self.state_target()?,
            index_file: self.index_path(),
        })
    }

    /// Parsed explicit floor
    pub fn date_min(&self) -> Result<Option<NaiveDate>> {
        match self.date_min.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_date(raw).map(Some).ok_or_else(|| {
                Error::invalid_value("date_min", format!("'{raw}' is not a YYYY-MM-DD date"))
            }),
        }
    }

    /// Parsed field allowlist
    pub fn fields(&self) -> Result<Option<Vec<String>>> {
        self.fields.as_deref().map(parse_fields).transpose()
    }
}

/// Split a comma-separated field list.
///
/// Blank entries are skipped. A list with no fields at all, or a field name
/// containing whitespace, is rejected.
pub fn parse_fields(raw: &str) -> Result<Vec<String>> {
    let mut fields: Vec<String> = Vec::new();
    for field in raw.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        if field.chars().any(char::is_whitespace) {
            return Err(Error::invalid_value(
                "fields",
                format!("'{field}' is not a field name"),
            ));
        }
        if !fields.iter().any(|f| f == field) {
            fields.push(field.to_string());
        }
    }

    if fields.is_empty() {
        return Err(Error::invalid_value("fields", "no field names given"));
    }
    Ok(fields)
}

/// Check a User-Agent against the API's identification policy
pub fn validate_user_agent(user_agent: &str) -> Result<()> {
    if USER_AGENT_POLICY.is_match(user_agent.trim()) {
        return Ok(());
    }
    Err(Error::invalid_value(
        "user_agent",
        format!(
            "'{user_agent}' must name the application and version and include the \
             operator's name and email, e.g. 'MyApp/1.0 (Jane Doe jane@example.org)'"
        ),
    ))
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::missing_field(field)),
    }
}

fn seconds(field: &str, value: f64, allow_zero: bool) -> Result<Duration> {
    let valid = value.is_finite() && (value > 0.0 || (allow_zero && value == 0.0));
    if !valid {
        return Err(Error::invalid_value(
            field,
            format!("{value} is not a usable number of seconds"),
        ));
    }
    Ok(Duration::from_secs_f64(value))
}

/// `"none"` (or blank) leaves ordering to the API
fn order_by(raw: Option<&str>) -> Option<String> {
    match raw.map(str::trim) {
        None => Some(DEFAULT_ORDER_BY.to_string()),
        Some("" | "none") => None,
        Some(field) => Some(field.to_string()),
    }
}
