//! Line-oriented stdout output for the one-shot and watch commands.
//!
//! TSV rows use raw numbers (fast `ryu` formatting) so they stay machine
//! readable; JSON mode writes one object per line.

use std::io::Write;

use gecko::format::INFINITE_SUPPLY;
use gecko::{AssetSnapshot, PriceSeries};
use serde::Serialize;

use crate::error::AppError;

/// Column header for snapshot TSV output.
pub const SNAPSHOT_HEADER: &str =
    "id\tsymbol\tname\tprice\tmarket_cap\tchange_24h\tchange_7d\tvolume\tcirculating\ttotal_supply";

/// Column header for history TSV output.
pub const HISTORY_HEADER: &str = "date\tprice\tchange_pct\ttrend";

/// Write the TSV column header. JSON lines carry their own keys, so JSON
/// mode writes nothing.
pub fn write_header<W: Write>(header: &str, json_mode: bool, writer: &mut W) -> Result<(), AppError> {
    if !json_mode {
        writer.write_all(header.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Write one line per snapshot.
pub fn write_snapshots<'a, W, I>(
    snapshots: I,
    json_mode: bool,
    buf: &mut String,
    writer: &mut W,
) -> Result<(), AppError>
where
    W: Write,
    I: IntoIterator<Item = &'a AssetSnapshot>,
{
    for snap in snapshots {
        buf.clear();
        if json_mode {
            buf.push_str(&serde_json::to_string(snap)?);
        } else {
            // TSV: id \t symbol \t name \t price \t market_cap \t 24h \t 7d \t volume \t circ \t total
            buf.push_str(&snap.id);
            buf.push('\t');
            buf.push_str(&gecko::format::format_symbol(&snap.symbol));
            buf.push('\t');
            buf.push_str(&snap.name);
            buf.push('\t');
            format_f64(buf, snap.current_price);
            buf.push('\t');
            format_f64(buf, snap.market_cap);
            buf.push('\t');
            format_f64(buf, snap.change_24h());
            buf.push('\t');
            format_f64(buf, snap.change_7d());
            buf.push('\t');
            format_f64(buf, snap.total_volume);
            buf.push('\t');
            format_opt_f64(buf, snap.circulating_supply, "");
            buf.push('\t');
            format_opt_f64(buf, snap.total_supply, INFINITE_SUPPLY);
        }
        buf.push('\n');
        writer.write_all(buf.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct HistoryLine<'a> {
    asset_id: &'a str,
    timestamp_ms: i64,
    price: f64,
    change_pct: Option<f64>,
    trend: Option<gecko::Trend>,
}

/// Write one line per history point. The first point has no change.
pub fn write_history<W: Write>(
    series: &PriceSeries,
    json_mode: bool,
    buf: &mut String,
    writer: &mut W,
) -> Result<(), AppError> {
    for (i, point) in series.points.iter().enumerate() {
        // changes[i - 1] ends at points[i].
        let change = i.checked_sub(1).and_then(|j| series.changes.get(j));
        let change_pct = change.and_then(|c| c.percent_change);
        let trend = change.and_then(|c| c.trend);

        buf.clear();
        if json_mode {
            let line = HistoryLine {
                asset_id: &series.asset_id,
                timestamp_ms: point.timestamp.timestamp_millis(),
                price: point.price,
                change_pct,
                trend,
            };
            buf.push_str(&serde_json::to_string(&line)?);
        } else {
            buf.push_str(&point.timestamp.format("%Y-%m-%d").to_string());
            buf.push('\t');
            format_f64(buf, point.price);
            buf.push('\t');
            format_opt_f64(buf, change_pct, "");
            buf.push('\t');
            if let Some(t) = trend {
                buf.push_str(&t.to_string());
            }
        }
        buf.push('\n');
        writer.write_all(buf.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Fast f64 formatting via `ryu`.
fn format_f64(buf: &mut String, val: f64) {
    let mut b = ryu::Buffer::new();
    buf.push_str(b.format(val));
}

fn format_opt_f64(buf: &mut String, val: Option<f64>, missing: &str) {
    match val {
        Some(v) => format_f64(buf, v),
        None => buf.push_str(missing),
    }
}
