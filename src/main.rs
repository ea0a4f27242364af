mod cli;
mod config;
mod controller;
mod error;
mod monitor;
mod output;
mod watch;

use std::fs::File;
use std::io::{self, BufWriter};
use std::sync::Mutex;

use clap::Parser;
use cli::Command;
use config::{AppConfig, API_KEY_ENV};
use error::AppError;
use gecko::{filter_snapshots, ChartRange, Gecko};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv(); // load .env if present

    let cli = cli::Cli::parse();

    // Initialize tracing. RUST_LOG wins over --log-level.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    // The TUI owns the terminal, so its logs go to a file.
    if let Command::Monitor(args) = &cli.command {
        match File::create(&args.log_file) {
            Ok(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
            Err(e) => {
                eprintln!("cannot open log file {}: {e}", args.log_file.display());
                std::process::exit(1);
            }
        }
    } else {
        builder.with_writer(io::stderr).init();
    }

    let api_key = std::env::var(API_KEY_ENV).ok();
    let config = match AppConfig::from_args(&cli.source, api_key) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    // Shared cancellation token + signal handlers.
    let cancel = setup_signal_handlers();

    let result = match cli.command {
        Command::Snapshot(args) => run_snapshot(config, &args.search, args.json).await,

        Command::History(args) => run_history(config, &args.asset, args.days, args.json).await,

        Command::Watch(args) => match Gecko::new(config.gecko) {
            Ok(gecko) => {
                info!(assets = gecko.asset_ids.len(), json = args.json, "watch starting");
                let stdout = io::stdout();
                let mut writer = BufWriter::new(stdout.lock());
                watch::run_watch(&gecko, config.refresh_interval, args.json, &mut writer, cancel).await
            }
            Err(e) => Err(e.into()),
        },

        Command::Monitor(args) => match config.with_range(args.days) {
            Ok(config) => monitor::run_monitor(config, cancel).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "coinwatch failed");
        std::process::exit(1);
    }
}

async fn run_snapshot(config: AppConfig, search: &str, json_mode: bool) -> Result<(), AppError> {
    let gecko = Gecko::new(config.gecko)?;
    let snapshots = gecko.fetch_snapshots().await?;
    let matching = filter_snapshots(&snapshots, search);
    info!(total = snapshots.len(), shown = matching.len(), "snapshot fetched");

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    let mut buf = String::with_capacity(512);
    output::write_header(output::SNAPSHOT_HEADER, json_mode, &mut writer)?;
    output::write_snapshots(matching, json_mode, &mut buf, &mut writer)
}

async fn run_history(
    config: AppConfig,
    asset_id: &str,
    days: u32,
    json_mode: bool,
) -> Result<(), AppError> {
    let range = ChartRange::try_from(days)?;
    let gecko = Gecko::new(config.gecko)?;
    let series = gecko.fetch_history(&asset_id.to_lowercase(), range).await?;

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    let mut buf = String::with_capacity(128);
    output::write_header(output::HISTORY_HEADER, json_mode, &mut writer)?;
    output::write_history(&series, json_mode, &mut buf, &mut writer)
}

/// Register SIGINT and SIGTERM handlers that trigger the returned token.
fn setup_signal_handlers() -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received SIGINT, shutting down");
        cancel_clone.cancel();
    });

    #[cfg(unix)]
    {
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("received SIGTERM, shutting down");
                    cancel_clone.cancel();
                }
                Err(e) => tracing::warn!(error = %e, "failed to register SIGTERM handler"),
            }
        });
    }

    cancel
}
