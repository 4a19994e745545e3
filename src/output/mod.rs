//! Output module
//!
//! Streams records to JSON Lines files.
//!
//! # Overview
//!
//! - [`RecordSink`] - anything that accepts records one at a time
//! - [`JsonlWriter`] - append-mode JSON Lines file, flushed per record
//! - [`output_path_for`] - per-user output file location

mod jsonl;

pub use jsonl::{output_path_for, validate_user, JsonlWriter, RecordSink};
