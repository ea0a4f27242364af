//! Auto-refresh mode: print a fresh snapshot on every interval tick.

use std::io::Write;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::controller::MarketSource;
use crate::error::AppError;
use crate::output::{self, SNAPSHOT_HEADER};

/// Refresh loop. Runs until cancelled.
///
/// A failed fetch is logged and the loop waits for the next tick; nothing is
/// printed for that round. Only a failed write ends the loop early.
pub async fn run_watch<S, W>(
    source: &S,
    every: Duration,
    json_mode: bool,
    writer: &mut W,
    cancel: CancellationToken,
) -> Result<(), AppError>
where
    S: MarketSource,
    W: Write,
{
    info!(interval = ?every, "starting watch");

    let mut buf = String::with_capacity(512);
    output::write_header(SNAPSHOT_HEADER, json_mode, writer)?;

    let mut ticker = time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => {
                info!("watch stopped");
                return Ok(());
            }
        }

        let result = tokio::select! {
            r = source.snapshots() => r,
            _ = cancel.cancelled() => {
                info!("shutdown during fetch");
                return Ok(());
            }
        };

        match result {
            Ok(snapshots) => output::write_snapshots(&snapshots, json_mode, &mut buf, writer)?,
            Err(e) => error!(error = %e, "snapshot fetch failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use gecko::{AssetSnapshot, ChartRange, GeckoError, Icon, PriceSeries};

    /// Replays queued snapshot results, then keeps failing.
    #[derive(Default)]
    struct ScriptedSource {
        results: Mutex<VecDeque<gecko::Result<Vec<AssetSnapshot>>>>,
        calls: AtomicUsize,
    }

    impl MarketSource for ScriptedSource {
        fn snapshots(&self) -> impl Future<Output = gecko::Result<Vec<AssetSnapshot>>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GeckoError::Timeout));
            async move { next }
        }

        fn history(
            &self,
            _asset_id: &str,
            _range: ChartRange,
        ) -> impl Future<Output = gecko::Result<PriceSeries>> + Send {
            async { Err(GeckoError::Timeout) }
        }

        fn icon(&self, _asset_id: &str, _url: &str) -> impl Future<Output = gecko::Result<Icon>> + Send {
            async { Err(GeckoError::Timeout) }
        }
    }

    fn snap(id: &str, price: f64) -> AssetSnapshot {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": id,
            "symbol": &id[..3],
            "current_price": price,
            "market_cap": price * 10.0,
            "total_volume": price,
        }))
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_round_is_skipped_and_loop_continues() {
        let every = Duration::from_secs(60);
        let source = ScriptedSource::default();
        {
            let mut results = source.results.lock().unwrap();
            results.push_back(Err(GeckoError::Http {
                status: 503,
                message: "unavailable".into(),
            }));
            results.push_back(Ok(vec![snap("bitcoin", 65000.0), snap("ethereum", 3200.0)]));
        }

        let cancel = CancellationToken::new();
        let mut out = Vec::new();

        let stopper = async {
            // Error round, good round, then one more failing round.
            while source.calls.load(Ordering::SeqCst) < 3 {
                time::sleep(every / 4).await;
            }
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(
            run_watch(&source, every, false, &mut out, cancel.clone()),
            stopper
        );
        result.unwrap();

        assert!(source.calls.load(Ordering::SeqCst) >= 3);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], SNAPSHOT_HEADER);
        assert!(lines[1].starts_with("bitcoin\t"));
        assert!(lines[2].starts_with("ethereum\t"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_json_mode_has_no_header() {
        let source = ScriptedSource::default();
        source
            .results
            .lock()
            .unwrap()
            .push_back(Ok(vec![snap("solana", 150.0)]));

        let cancel = CancellationToken::new();
        let mut out = Vec::new();
        let stopper = async {
            while source.calls.load(Ordering::SeqCst) < 1 {
                tokio::task::yield_now().await;
            }
            // Let the first round finish writing.
            time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(
            run_watch(&source, Duration::from_secs(60), true, &mut out, cancel.clone()),
            stopper
        );
        result.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        let v: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(v["id"], "solana");
    }
}
