// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # courtsync
//!
//! Incremental sync of court opinions from the CourtListener REST API into
//! per-user JSON Lines files.
//!
//! ## Features
//!
//! - **Resilient fetching**: Retries with exponential backoff on timeouts,
//!   connection failures and 429/5xx responses
//! - **Cursor pagination**: Follows `next` links with an optional record limit
//! - **Field projection**: Keeps only the requested fields, in the order given
//! - **Incremental sync**: A per-user date watermark so reruns only fetch new
//!   opinions
//! - **User index**: A JSON summary of every user's runs and output files
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use courtsync::engine::{SyncEngine, SyncRequest};
//! use courtsync::http::{HttpClient, HttpClientConfig};
//! use courtsync::state::FileFloorStore;
//!
//! #[tokio::main]
//! async fn main() -> courtsync::Result<()> {
//!     let config = HttpClientConfig::builder()
//!         .base_url("https://www.courtlistener.com/api/rest/v4")
//!         .token("...")
//!         .user_agent("MyApp/1.0 (Jane Doe jane@example.org)")
//!         .build();
//!
//!     let engine = SyncEngine::new(HttpClient::new(config)?)
//!         .with_floor_store(Box::new(FileFloorStore::new("state")));
//!
//!     let request = SyncRequest::new("alice", "data/alice_opinions.jsonl")
//!         .with_limit(Some(100));
//!     let report = engine.sync(&request).await?;
//!     println!("{} new opinions", report.records_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           SyncEngine                            │
//! │  resolve floor → paginate → write records → advance watermark   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌────────────┬─────────────────┼───────────────┬──────────────────┐
//! │    HTTP    │    Paginate     │    Output     │   State / Index  │
//! ├────────────┼─────────────────┼───────────────┼──────────────────┤
//! │ Retry      │ next links      │ JSON Lines    │ Since file       │
//! │ Backoff    │ Record limit    │ Append+flush  │ Per-user files   │
//! │ Rate Limit │ Projection      │               │ users.json       │
//! └────────────┴─────────────────┴───────────────┴──────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client with retry and rate limiting
pub mod http;

/// Cursor pagination and field projection
pub mod pagination;

/// JSON Lines output
pub mod output;

/// Date watermarks and their stores
pub mod state;

/// Per-user run index
pub mod index;

/// Sync engine
pub mod engine;

/// Layered configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::Settings;
pub use engine::{SyncEngine, SyncReport, SyncRequest};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
