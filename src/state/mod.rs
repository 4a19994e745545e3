//! State management module
//!
//! Tracks the per-user watermark: the newest filing date already synced.
//! The watermark becomes the date floor of the next run's query.
//!
//! # Overview
//!
//! The state module provides:
//! - [`FloorStore`] - key-value store of one date per user
//! - [`FileFloorStore`] - one `<user>.since` file per user in a directory
//! - [`SinceFileStore`] - a single since-file shared by every user
//! - [`MemoryFloorStore`] - in-memory store for tests and dry runs
//! - [`advance_floor`] - decides whether a run moves the watermark

mod store;
mod watermark;

pub use store::{FileFloorStore, FloorStore, MemoryFloorStore, SinceFileStore};
pub use watermark::{advance_floor, Watermark};

#[cfg(test)]
mod store_tests;
