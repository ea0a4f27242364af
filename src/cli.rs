use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// coinwatch: live cryptocurrency market tracker.
#[derive(Parser, Debug)]
#[command(name = "coinwatch", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(flatten)]
    pub source: SourceArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Where and what to fetch. Shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// CoinGecko API root
    #[arg(long, global = true, default_value = gecko::config::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Quote currency code
    #[arg(long, global = true, default_value = gecko::config::DEFAULT_VS_CURRENCY)]
    pub currency: String,

    /// Tracked asset ids, comma separated (e.g. bitcoin,ethereum)
    #[arg(long, global = true, value_delimiter = ',')]
    pub assets: Vec<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value = "15")]
    pub timeout_secs: u64,

    /// Auto-refresh interval in milliseconds
    #[arg(long, global = true, default_value = "60000")]
    pub refresh_ms: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the market snapshot once and print it
    Snapshot(SnapshotArgs),

    /// Fetch one asset's price history and print it with daily changes
    History(HistoryArgs),

    /// Print a fresh snapshot on every refresh interval
    Watch(WatchArgs),

    /// Launch the market tracker TUI
    Monitor(MonitorArgs),
}

/// Arguments for the `snapshot` subcommand.
#[derive(Parser, Debug)]
pub struct SnapshotArgs {
    /// Only print assets whose name or symbol contains this text
    #[arg(long, default_value = "")]
    pub search: String,

    /// Output as JSON instead of TSV
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `history` subcommand.
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Asset id (e.g. bitcoin)
    pub asset: String,

    /// Range in days: 7, 30, 90 or 365
    #[arg(long, default_value = "30")]
    pub days: u32,

    /// Output as JSON instead of TSV
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `watch` subcommand.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Output as JSON instead of TSV
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `monitor` subcommand.
#[derive(Parser, Debug)]
pub struct MonitorArgs {
    /// Initial chart range in days: 7, 30, 90 or 365
    #[arg(long, default_value = "30")]
    pub days: u32,

    /// File receiving log output while the TUI owns the terminal
    #[arg(long, default_value = "coinwatch.log")]
    pub log_file: PathBuf,
}
