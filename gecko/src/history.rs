//! Price history transform.
//!
//! Turns the raw `[epoch_millis, price]` pairs of a market chart into an
//! ascending [`PriceSeries`] with a [`PriceChange`] for every point after the
//! first.

use chrono::DateTime;

use crate::error::{GeckoError, Result};
use crate::types::{ChartRange, MarketChart, PriceChange, PricePoint, PriceSeries, Trend};

/// Percentage change from `prev` to `curr`; `None` when `prev` is zero.
pub fn percent_change(prev: f64, curr: f64) -> Option<f64> {
    if prev == 0.0 {
        None
    } else {
        Some((curr - prev) / prev * 100.0)
    }
}

/// Convert raw pairs into points sorted by timestamp.
///
/// Input that is already ascending is kept as is; otherwise a stable sort is
/// applied so equal timestamps keep their server order.
pub fn to_points(prices: &[(i64, f64)]) -> Result<Vec<PricePoint>> {
    let mut points = prices
        .iter()
        .map(|&(ms, price)| {
            DateTime::from_timestamp_millis(ms)
                .map(|timestamp| PricePoint { timestamp, price })
                .ok_or(GeckoError::InvalidTimestamp(ms))
        })
        .collect::<Result<Vec<_>>>()?;

    let ordered = points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp);
    if !ordered {
        points.sort_by_key(|p| p.timestamp);
    }
    Ok(points)
}

/// Derive the change entry for each consecutive pair.
pub fn changes(points: &[PricePoint]) -> Vec<PriceChange> {
    points
        .windows(2)
        .map(|w| {
            let pct = percent_change(w[0].price, w[1].price);
            PriceChange {
                timestamp: w[1].timestamp,
                price: w[1].price,
                percent_change: pct,
                trend: pct.map(Trend::classify),
            }
        })
        .collect()
}

/// Build the series for one (asset, range) query.
///
/// # Errors
///
/// Returns [`GeckoError::NoData`] when the chart has no prices, and
/// [`GeckoError::InvalidTimestamp`] for epoch values chrono cannot represent.
pub fn build_series(asset_id: &str, range: ChartRange, chart: MarketChart) -> Result<PriceSeries> {
    if chart.prices.is_empty() {
        return Err(GeckoError::NoData {
            asset_id: asset_id.to_string(),
            days: range.days(),
        });
    }

    let points = to_points(&chart.prices)?;
    let changes = changes(&points);

    Ok(PriceSeries {
        asset_id: asset_id.to_string(),
        range,
        points,
        changes,
    })
}

impl PriceSeries {
    /// Lowest and highest price in the series.
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        let mut iter = self.points.iter().map(|p| p.price);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Change over the whole series, first to last point.
    pub fn overall_change(&self) -> Option<f64> {
        let first = self.points.first()?;
        let last = self.points.last()?;
        percent_change(first.price, last.price)
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}
