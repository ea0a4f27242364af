pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod history;
pub mod icons;
pub mod rest;
pub mod types;

// ---- Top-level re-exports for ergonomic usage ----

pub use client::Gecko;
pub use config::GeckoConfig;
pub use error::{GeckoError, Result};

// REST client
pub use rest::GeckoHttpClient;

// Market + history types
pub use types::{AssetSnapshot, ChartRange, MarketChart, PriceChange, PricePoint, PriceSeries, Trend};

// Filtering + icons
pub use filter::filter_snapshots;
pub use icons::{Icon, IconCache};
