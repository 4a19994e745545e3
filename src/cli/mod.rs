//! CLI module
//!
//! Command-line interface for syncing opinions.
//!
//! # Commands
//!
//! - `fetch` - Fetch new opinions for a user and move their watermark
//! - `status` - Show a user's stored floor and last run

mod commands;
mod runner;

pub use commands::{Cli, Commands, FetchArgs, OutputFormat, StateArgs, StatusArgs};
pub use runner::{render_report, report_json, Runner};
