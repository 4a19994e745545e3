//! Pagination module
//!
//! Follows the API's `next` links from page to page, yielding records one at
//! a time until the results run out or the caller's limit is reached.
//!
//! # Overview
//!
//! - [`OpinionQuery`] - endpoint plus the filters of the first request
//! - [`Paginator`] - single-pass cursor over the records of a query
//! - [`project`] - reduce a record to an allowlist of fields
//!
//! The date floor is sent as an inclusive (`>=`) filter. Records filed on
//! the floor date itself are fetched again on the next run that uses the
//! same floor; nothing here removes those repeats.

mod paginator;
mod query;

pub use paginator::{project, PagedRecord, Paginator};
pub use query::{OpinionQuery, DEFAULT_FLOOR_PARAM, DEFAULT_ORDER_BY, OPINIONS_ENDPOINT};
