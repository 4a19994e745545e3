//! CLI commands and argument parsing

use crate::config::Settings;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Incremental CourtListener opinion sync
#[derive(Parser, Debug)]
#[command(name = "courtsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for output files and the user index
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// User index file (default: <data-dir>/users.json)
    #[arg(long, global = true)]
    pub index_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch new opinions for a user
    Fetch(FetchArgs),

    /// Show the stored floor and index entry for a user
    Status(StatusArgs),
}

/// Where the watermark lives
#[derive(Args, Debug, Clone, Default)]
pub struct StateArgs {
    /// Single file holding the date floor, shared by every user
    #[arg(long, conflicts_with = "state_dir")]
    pub since_file: Option<PathBuf>,

    /// Directory of per-user floor files
    #[arg(long)]
    pub state_dir: Option<PathBuf>,
}

/// Arguments for `fetch`
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// User identity
    #[arg(short, long)]
    pub user: Option<String>,

    /// Maximum records to fetch
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Fetch everything past the floor, ignoring the limit
    #[arg(long, conflicts_with = "limit")]
    pub all: bool,

    /// Only fetch opinions filed on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub date_min: Option<String>,

    /// Fields to keep (comma-separated)
    #[arg(long)]
    pub fields: Option<String>,

    #[command(flatten)]
    pub state: StateArgs,

    /// API token
    #[arg(long, env = "COURTLISTENER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// User-Agent naming the app, version, operator and a contact email
    #[arg(long = "user-agent", env = "COURTLISTENER_UA")]
    pub user_agent: Option<String>,

    /// Seconds before a request attempt times out
    #[arg(long, env = "COURTLISTENER_TIMEOUT")]
    pub timeout: Option<f64>,

    /// Attempts per page request
    #[arg(long, env = "COURTLISTENER_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// First retry delay in seconds, doubled on each retry
    #[arg(long, env = "COURTLISTENER_BACKOFF_FACTOR")]
    pub backoff: Option<f64>,

    /// Maximum requests per second
    #[arg(long)]
    pub requests_per_second: Option<u32>,

    /// API root URL
    #[arg(long, env = "COURTLISTENER_BASE_URL")]
    pub base_url: Option<String>,

    /// Endpoint below the API root
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Query parameter carrying the date floor
    #[arg(long)]
    pub floor_param: Option<String>,

    /// Ordering field, or "none"
    #[arg(long)]
    pub order_by: Option<String>,

    /// Records per page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Field holding the filing date
    #[arg(long)]
    pub date_field: Option<String>,
}

/// Arguments for `status`
#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// User identity
    #[arg(short, long)]
    pub user: Option<String>,

    #[command(flatten)]
    pub state: StateArgs,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Pretty,
}

impl Cli {
    /// Settings given by global flags
    pub fn settings(&self) -> Settings {
        Settings {
            data_dir: self.data_dir.clone(),
            index_file: self.index_file.clone(),
            ..Settings::default()
        }
    }
}

impl StateArgs {
    fn apply(&self, settings: Settings) -> Settings {
        Settings {
            since_file: self.since_file.clone(),
            state_dir: self.state_dir.clone(),
            ..settings
        }
    }
}

impl FetchArgs {
    /// Settings given by flags and environment
    pub fn settings(&self) -> Settings {
        self.state.apply(Settings {
            token: self.token.clone(),
            user_agent: self.user_agent.clone(),
            base_url: self.base_url.clone(),
            endpoint: self.endpoint.clone(),
            timeout_secs: self.timeout,
            max_retries: self.max_retries,
            backoff_factor: self.backoff,
            requests_per_second: self.requests_per_second,
            fields: self.fields.clone(),
            date_min: self.date_min.clone(),
            limit: self.limit,
            all: self.all.then_some(true),
            page_size: self.page_size,
            order_by: self.order_by.clone(),
            floor_param: self.floor_param.clone(),
            date_field: self.date_field.clone(),
            user: self.user.clone(),
            ..Settings::default()
        })
    }
}

impl StatusArgs {
    /// Settings given by flags
    pub fn settings(&self) -> Settings {
        self.state.apply(Settings {
            user: self.user.clone(),
            ..Settings::default()
        })
    }
}
