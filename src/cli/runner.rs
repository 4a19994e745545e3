//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, FetchArgs, OutputFormat, StatusArgs};
use crate::config::Settings;
use crate::engine::{SyncEngine, SyncReport};
use crate::error::{Result, ResultExt};
use crate::http::HttpClient;
use crate::index::{UserIndex, UserIndexEntry};
use crate::state::FloorStore;
use crate::types::JsonValue;
use chrono::NaiveDate;
use serde_json::json;
use std::fmt::Write as _;
use tracing::debug;

/// Fields shown for the first record of a run
const PREVIEW_FIELDS: [&str; 3] = ["id", "absolute_url", "date_filed"];

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Fetch(args) => self.fetch(args).await,
            Commands::Status(args) => self.status(args).await,
        }
    }

    /// Combine the config file, global flags and command flags
    fn settings(&self, command: Settings) -> Result<Settings> {
        let base = match &self.cli.config {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                Settings::from_file(path)?
            }
            None => Settings::default(),
        };
        Ok(base.merge(self.cli.settings()).merge(command))
    }

    async fn fetch(&self, args: &FetchArgs) -> Result<()> {
        let resolved = self.settings(args.settings())?.resolve()?;

        let client = HttpClient::new(resolved.http)?;
        let mut engine = SyncEngine::new(client).with_index(UserIndex::new(&resolved.index_file));
        if let Some(store) = resolved.state.into_store() {
            engine = engine.with_floor_store(store);
        }

        let report = engine
            .sync(&resolved.request)
            .await
            .with_context(|| format!("Sync for '{}' failed", resolved.request.user))?;
        self.emit(render_report(&report), &report_json(&report));
        Ok(())
    }

    async fn status(&self, args: &StatusArgs) -> Result<()> {
        let settings = self.settings(args.settings())?;
        let user = settings.user()?;

        let floor = match settings.state_target()?.into_store() {
            Some(store) => Some((
                floor_location(store.as_ref(), user),
                store.load_floor(user).await?,
            )),
            None => None,
        };
        let index = UserIndex::new(settings.index_path());
        let entry = index
            .get(user)
            .await
            .with_context(|| format!("Reading {}", index.path().display()))?;

        self.emit(
            render_status(user, floor.as_ref(), entry.as_ref()),
            &status_json(user, floor.as_ref(), entry.as_ref()),
        );
        Ok(())
    }

    fn emit(&self, pretty: String, value: &JsonValue) {
        match self.cli.format {
            OutputFormat::Pretty => print!("{pretty}"),
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
            }
        }
    }
}

/// Human-readable run summary
pub fn render_report(report: &SyncReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Saved {} records for {} to {}",
        report.records_written,
        report.user,
        report.output_path.display()
    );
    let _ = writeln!(
        out,
        "Floor: {} ({})",
        date_or_dash(report.floor_used),
        report.floor_source
    );
    if let Some(floor) = report.saved_floor {
        let _ = writeln!(out, "New floor: {floor}");
    }

    let Some(first) = &report.first_record else {
        let _ = writeln!(out, "No new opinions");
        return out;
    };

    let _ = writeln!(out, "First opinion:");
    for field in PREVIEW_FIELDS {
        if let Some(value) = first.get(field) {
            let _ = writeln!(out, "  {field}: {}", scalar(value));
        }
    }
    if let Some(JsonValue::String(text)) = first.get("plain_text") {
        let _ = writeln!(out, "  plain_text: {} chars", text.chars().count());
    }
    out
}

/// Machine-readable run summary
pub fn report_json(report: &SyncReport) -> JsonValue {
    json!({
        "user": report.user,
        "records_written": report.records_written,
        "pages_fetched": report.pages_fetched,
        "floor_used": report.floor_used.map(|d| d.to_string()),
        "floor_source": report.floor_source.to_string(),
        "newest_filed": report.newest_filed.map(|d| d.to_string()),
        "saved_floor": report.saved_floor.map(|d| d.to_string()),
        "output_path": report.output_path.display().to_string(),
        "duration_ms": report.duration_ms,
    })
}

fn render_status(
    user: &str,
    floor: Option<&(String, Option<NaiveDate>)>,
    entry: Option<&UserIndexEntry>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "User: {user}");
    match floor {
        Some((location, date)) => {
            let _ = writeln!(out, "Floor: {} ({location})", date_or_dash(*date));
        }
        None => {
            let _ = writeln!(out, "Floor: not tracked (no --since-file or --state-dir)");
        }
    }
    match entry {
        Some(entry) => {
            let _ = writeln!(
                out,
                "Last run: {} ({} records, {} runs, {} total)",
                entry.last_run.to_rfc3339(),
                entry.count,
                entry.runs,
                entry.total_records
            );
            let _ = writeln!(out, "Output: {}", entry.last_output);
        }
        None => {
            let _ = writeln!(out, "No runs recorded");
        }
    }
    out
}

fn status_json(
    user: &str,
    floor: Option<&(String, Option<NaiveDate>)>,
    entry: Option<&UserIndexEntry>,
) -> JsonValue {
    json!({
        "user": user,
        "floor": floor.and_then(|(_, date)| date.map(|d| d.to_string())),
        "state": floor.map(|(location, _)| location),
        "index": entry,
    })
}

/// Where a user's floor lives, flagging files every user shares
fn floor_location(store: &dyn FloorStore, user: &str) -> String {
    if store.is_shared() {
        format!("{}, shared by all users", store.location(user))
    } else {
        store.location(user)
    }
}

fn date_or_dash(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.to_string())
}

fn scalar(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
