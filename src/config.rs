//! Application configuration.

use std::time::Duration;

use gecko::{ChartRange, GeckoConfig};

use crate::cli::SourceArgs;
use crate::error::AppError;

/// Auto-refresh cadence when none is configured.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(60_000);

/// Environment variable holding an optional CoinGecko demo API key.
pub const API_KEY_ENV: &str = "COINGECKO_API_KEY";

/// Everything the commands need besides their own flags.
///
/// Use [`Default::default()`] for the stock tracker, or [`AppConfig::from_args`]
/// to apply command-line overrides.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Client settings (endpoint, currency, tracked assets, timeout).
    pub gecko: GeckoConfig,
    /// Interval between automatic snapshot refreshes.
    pub refresh_interval: Duration,
    /// Chart range selected at startup.
    pub default_range: ChartRange,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gecko: GeckoConfig::default(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            default_range: ChartRange::default(),
        }
    }
}

impl AppConfig {
    /// Apply command-line overrides on top of the defaults.
    pub fn from_args(args: &SourceArgs, api_key: Option<String>) -> Result<Self, AppError> {
        if args.refresh_ms == 0 {
            return Err(AppError::Config("refresh interval must be positive".into()));
        }
        if args.timeout_secs == 0 {
            return Err(AppError::Config("timeout must be positive".into()));
        }

        let mut config = Self::default();
        config.gecko.base_url = args.base_url.clone();
        config.gecko.vs_currency = args.currency.to_lowercase();
        config.gecko.request_timeout = Duration::from_secs(args.timeout_secs);
        config.gecko.api_key = api_key.filter(|k| !k.trim().is_empty());

        let assets: Vec<String> = args
            .assets
            .iter()
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
        if !assets.is_empty() {
            config.gecko.asset_ids = assets;
        }

        config.refresh_interval = Duration::from_millis(args.refresh_ms);
        Ok(config)
    }

    pub fn with_range(mut self, days: u32) -> Result<Self, AppError> {
        self.default_range = ChartRange::try_from(days)?;
        Ok(self)
    }
}
