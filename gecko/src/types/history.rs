use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{ChartRange, Trend};

/// Body of `/coins/{id}/market_chart`. Only `prices` is consumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketChart {
    /// `[epoch_millis, price]` pairs.
    pub prices: Vec<(i64, f64)>,
}

/// A single price sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Period-over-period change ending at `timestamp`.
///
/// `percent_change` and `trend` are `None` when the previous price was zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub percent_change: Option<f64>,
    pub trend: Option<Trend>,
}

/// Time-ordered history for one (asset, range) query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub asset_id: String,
    pub range: ChartRange,
    pub points: Vec<PricePoint>,
    /// One entry per point after the first.
    pub changes: Vec<PriceChange>,
}
