//! Fetch controller.
//!
//! Owns the last good snapshot list and history series. Every fetch runs on
//! its own tokio task and reports back through an mpsc channel; the
//! interaction loop feeds each [`FetchOutcome`] into [`Controller::apply`].
//!
//! At most one fetch per kind is in flight. Issuing a new one aborts the
//! previous task and bumps the kind's generation, so a result that still
//! arrives from a superseded request is discarded instead of applied.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use gecko::{AssetSnapshot, ChartRange, Gecko, GeckoError, Icon, PriceSeries};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The fetch operations the controller dispatches.
pub trait MarketSource: Send + Sync + 'static {
    fn snapshots(&self) -> impl Future<Output = gecko::Result<Vec<AssetSnapshot>>> + Send;

    fn history(
        &self,
        asset_id: &str,
        range: ChartRange,
    ) -> impl Future<Output = gecko::Result<PriceSeries>> + Send;

    fn icon(&self, asset_id: &str, url: &str) -> impl Future<Output = gecko::Result<Icon>> + Send;
}

impl MarketSource for Gecko {
    fn snapshots(&self) -> impl Future<Output = gecko::Result<Vec<AssetSnapshot>>> + Send {
        self.fetch_snapshots()
    }

    fn history(
        &self,
        asset_id: &str,
        range: ChartRange,
    ) -> impl Future<Output = gecko::Result<PriceSeries>> + Send {
        self.fetch_history(asset_id, range)
    }

    fn icon(&self, asset_id: &str, url: &str) -> impl Future<Output = gecko::Result<Icon>> + Send {
        self.fetch_icon(asset_id, url)
    }
}

/// Completed fetch, tagged with the generation it was issued under.
#[derive(Debug)]
pub enum FetchOutcome {
    Snapshots {
        generation: u64,
        result: gecko::Result<Vec<AssetSnapshot>>,
    },
    History {
        generation: u64,
        asset_id: String,
        range: ChartRange,
        result: gecko::Result<PriceSeries>,
    },
    Icon {
        asset_id: String,
        result: gecko::Result<Icon>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Transport, status, decode or timeout failure.
    Fetch,
    /// Valid response without history.
    NoData,
}

/// User-facing failure report.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    fn from_error(what: &str, err: &GeckoError) -> Self {
        let (kind, message) = if err.is_no_data() {
            (NoticeKind::NoData, err.to_string())
        } else {
            (NoticeKind::Fetch, format!("failed to fetch {what}: {err}"))
        };
        Self {
            kind,
            message,
            at: Utc::now(),
        }
    }
}

/// Effect of applying one outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Snapshots { count: usize },
    History {
        asset_id: String,
        range: ChartRange,
        points: usize,
    },
    Icon { asset_id: String },
    /// Result of a superseded request; nothing changed.
    Stale,
    /// Fetch failed; nothing changed.
    Failed(Notice),
}

pub struct Controller<S: MarketSource> {
    source: Arc<S>,
    tx: mpsc::UnboundedSender<FetchOutcome>,

    snapshots: Vec<AssetSnapshot>,
    history: Option<PriceSeries>,
    icon: Option<(String, Icon)>,
    last_refresh: Option<DateTime<Utc>>,

    snapshot_generation: u64,
    history_generation: u64,
    snapshot_task: Option<JoinHandle<()>>,
    history_task: Option<JoinHandle<()>>,
    icon_task: Option<JoinHandle<()>>,
    history_target: Option<(String, ChartRange)>,
    icon_target: Option<String>,
    icon_failed: Option<String>,
}

impl<S: MarketSource> Controller<S> {
    /// Create a controller and the receiver its fetch results arrive on.
    pub fn new(source: Arc<S>) -> (Self, mpsc::UnboundedReceiver<FetchOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Self {
            source,
            tx,
            snapshots: Vec::new(),
            history: None,
            icon: None,
            last_refresh: None,
            snapshot_generation: 0,
            history_generation: 0,
            snapshot_task: None,
            history_task: None,
            icon_task: None,
            history_target: None,
            icon_target: None,
            icon_failed: None,
        };
        (controller, rx)
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Start a snapshot fetch, superseding any in-flight one.
    pub fn request_snapshots(&mut self) -> u64 {
        self.snapshot_generation += 1;
        let generation = self.snapshot_generation;

        if let Some(task) = self.snapshot_task.take() {
            if !task.is_finished() {
                debug!(generation, "superseding in-flight snapshot fetch");
            }
            task.abort();
        }

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.snapshot_task = Some(tokio::spawn(async move {
            let result = source.snapshots().await;
            let _ = tx.send(FetchOutcome::Snapshots { generation, result });
        }));
        generation
    }

    /// Start a history fetch for `asset_id`, superseding any in-flight one.
    pub fn request_history(&mut self, asset_id: &str, range: ChartRange) -> u64 {
        self.history_generation += 1;
        let generation = self.history_generation;

        if let Some(task) = self.history_task.take() {
            if !task.is_finished() {
                debug!(generation, "superseding in-flight history fetch");
            }
            task.abort();
        }

        self.history_target = Some((asset_id.to_string(), range));
        let asset_id = asset_id.to_string();
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.history_task = Some(tokio::spawn(async move {
            let result = source.history(&asset_id, range).await;
            let _ = tx.send(FetchOutcome::History {
                generation,
                asset_id,
                range,
                result,
            });
        }));
        generation
    }

    /// Load the icon of `asset` unless it is already shown or has none.
    pub fn request_icon(&mut self, asset: &AssetSnapshot) {
        let Some(url) = asset.image.clone() else {
            return;
        };
        if self.icon_target.as_deref() == Some(asset.id.as_str()) {
            return;
        }
        if let Some(task) = self.icon_task.take() {
            task.abort();
        }

        self.icon_target = Some(asset.id.clone());
        self.icon_failed = None;
        let asset_id = asset.id.clone();
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.icon_task = Some(tokio::spawn(async move {
            let result = source.icon(&asset_id, &url).await;
            let _ = tx.send(FetchOutcome::Icon { asset_id, result });
        }));
    }

    // -----------------------------------------------------------------------
    // Completion
    // -----------------------------------------------------------------------

    /// Apply a finished fetch. Failures and stale results leave state as is.
    pub fn apply(&mut self, outcome: FetchOutcome) -> Update {
        match outcome {
            FetchOutcome::Snapshots { generation, result } => {
                if generation != self.snapshot_generation {
                    debug!(generation, current = self.snapshot_generation, "discarding stale snapshot");
                    return Update::Stale;
                }
                self.snapshot_task = None;
                match result {
                    Ok(snapshots) => {
                        let count = snapshots.len();
                        self.snapshots = snapshots;
                        self.last_refresh = Some(Utc::now());
                        info!(count, generation, "snapshot applied");
                        Update::Snapshots { count }
                    }
                    Err(e) => {
                        warn!(error = %e, "snapshot fetch failed, keeping previous data");
                        Update::Failed(Notice::from_error("market data", &e))
                    }
                }
            }

            FetchOutcome::History {
                generation,
                asset_id,
                range,
                result,
            } => {
                if generation != self.history_generation {
                    debug!(generation, current = self.history_generation, "discarding stale history");
                    return Update::Stale;
                }
                self.history_task = None;
                match result {
                    Ok(series) => {
                        let points = series.points.len();
                        self.history = Some(series);
                        info!(asset_id = %asset_id, days = range.days(), points, "history applied");
                        Update::History {
                            asset_id,
                            range,
                            points,
                        }
                    }
                    Err(e) => {
                        warn!(asset_id = %asset_id, error = %e, "history fetch failed, keeping previous chart");
                        Update::Failed(Notice::from_error(&format!("{asset_id} history"), &e))
                    }
                }
            }

            FetchOutcome::Icon { asset_id, result } => {
                if self.icon_target.as_deref() != Some(asset_id.as_str()) {
                    return Update::Stale;
                }
                self.icon_task = None;
                match result {
                    Ok(icon) => {
                        self.icon = Some((asset_id.clone(), icon));
                        Update::Icon { asset_id }
                    }
                    Err(e) => {
                        // Target stays set: no retry until another asset is selected.
                        self.icon_failed = Some(asset_id.clone());
                        Update::Failed(Notice::from_error(&format!("{asset_id} icon"), &e))
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // State
    // -----------------------------------------------------------------------

    /// Last successfully fetched snapshot list, in server order.
    pub fn snapshots(&self) -> &[AssetSnapshot] {
        &self.snapshots
    }

    /// Last successfully fetched history series.
    pub fn history(&self) -> Option<&PriceSeries> {
        self.history.as_ref()
    }

    /// Icon for `asset_id` if it is the one currently loaded.
    pub fn icon(&self, asset_id: &str) -> Option<&Icon> {
        self.icon
            .as_ref()
            .filter(|(id, _)| id == asset_id)
            .map(|(_, icon)| icon)
    }

    /// `true` if the icon fetch for `asset_id` failed and is not being retried.
    pub fn icon_failed(&self, asset_id: &str) -> bool {
        self.icon_failed.as_deref() == Some(asset_id)
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    /// Asset and range of the most recent history request.
    pub fn history_target(&self) -> Option<(&str, ChartRange)> {
        self.history_target
            .as_ref()
            .map(|(id, range)| (id.as_str(), *range))
    }

    pub fn is_snapshot_pending(&self) -> bool {
        self.snapshot_task.is_some()
    }

    pub fn is_history_pending(&self) -> bool {
        self.history_task.is_some()
    }

    pub fn find(&self, asset_id: &str) -> Option<&AssetSnapshot> {
        self.snapshots.iter().find(|s| s.id == asset_id)
    }
}

impl<S: MarketSource> Drop for Controller<S> {
    fn drop(&mut self) {
        for task in [
            self.snapshot_task.take(),
            self.history_task.take(),
            self.icon_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use gecko::{MarketChart, Trend};
    use tokio::sync::oneshot;

    type SnapshotGate = oneshot::Receiver<gecko::Result<Vec<AssetSnapshot>>>;
    type HistoryGate = oneshot::Receiver<gecko::Result<PriceSeries>>;

    /// Source whose calls block until the test releases them, in call order.
    #[derive(Default)]
    struct GatedSource {
        snapshot_gates: Mutex<VecDeque<SnapshotGate>>,
        history_gates: Mutex<VecDeque<HistoryGate>>,
        snapshot_calls: AtomicUsize,
        history_calls: AtomicUsize,
        icons_fail: AtomicBool,
    }

    impl GatedSource {
        fn gate_snapshot(&self) -> oneshot::Sender<gecko::Result<Vec<AssetSnapshot>>> {
            let (tx, rx) = oneshot::channel();
            self.snapshot_gates.lock().unwrap().push_back(rx);
            tx
        }

        fn gate_history(&self) -> oneshot::Sender<gecko::Result<PriceSeries>> {
            let (tx, rx) = oneshot::channel();
            self.history_gates.lock().unwrap().push_back(rx);
            tx
        }
    }

    impl MarketSource for GatedSource {
        fn snapshots(&self) -> impl Future<Output = gecko::Result<Vec<AssetSnapshot>>> + Send {
            self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.snapshot_gates.lock().unwrap().pop_front();
            async move {
                match gate {
                    Some(rx) => rx.await.unwrap_or(Err(GeckoError::Timeout)),
                    None => Err(GeckoError::Timeout),
                }
            }
        }

        fn history(
            &self,
            _asset_id: &str,
            _range: ChartRange,
        ) -> impl Future<Output = gecko::Result<PriceSeries>> + Send {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.history_gates.lock().unwrap().pop_front();
            async move {
                match gate {
                    Some(rx) => rx.await.unwrap_or(Err(GeckoError::Timeout)),
                    None => Err(GeckoError::Timeout),
                }
            }
        }

        fn icon(&self, _asset_id: &str, _url: &str) -> impl Future<Output = gecko::Result<Icon>> + Send {
            let fail = self.icons_fail.load(Ordering::SeqCst);
            async move {
                if fail {
                    return Err(GeckoError::Http {
                        status: 404,
                        message: "not found".into(),
                    });
                }
                Ok(Icon {
                    content_type: Some("image/png".into()),
                    bytes: Arc::from(vec![1u8, 2, 3]),
                })
            }
        }
    }

    fn snap(id: &str, price: f64) -> AssetSnapshot {
        AssetSnapshot {
            id: id.into(),
            symbol: id[..3].into(),
            name: id.into(),
            image: Some(format!("https://example.invalid/{id}.png")),
            current_price: price,
            market_cap: price * 10.0,
            total_volume: price,
            circulating_supply: None,
            total_supply: None,
            price_change_percentage_24h: Some(1.0),
            price_change_percentage_7d_in_currency: None,
        }
    }

    fn series(asset_id: &str, prices: &[f64]) -> PriceSeries {
        let chart = MarketChart {
            prices: prices
                .iter()
                .enumerate()
                .map(|(i, p)| (i as i64 * 86_400_000, *p))
                .collect(),
        };
        gecko::history::build_series(asset_id, ChartRange::Week, chart).unwrap()
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<FetchOutcome>) -> FetchOutcome {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for outcome")
            .expect("channel closed")
    }

    async fn wait_for(calls: &AtomicUsize, n: usize) {
        while calls.load(Ordering::SeqCst) < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_snapshot_success_replaces_list() {
        let source = Arc::new(GatedSource::default());
        let gate = source.gate_snapshot();
        let (mut ctl, mut rx) = Controller::new(Arc::clone(&source));

        ctl.request_snapshots();
        assert!(ctl.is_snapshot_pending());
        gate.send(Ok(vec![snap("bitcoin", 1.0), snap("ethereum", 2.0)]))
            .unwrap();

        let update = ctl.apply(next(&mut rx).await);
        assert_eq!(update, Update::Snapshots { count: 2 });
        assert_eq!(ctl.snapshots().len(), 2);
        assert_eq!(ctl.snapshots()[0].id, "bitcoin");
        assert!(ctl.last_refresh().is_some());
        assert!(!ctl.is_snapshot_pending());
    }

    #[tokio::test]
    async fn test_second_snapshot_request_supersedes_first() {
        let source = Arc::new(GatedSource::default());
        let first = source.gate_snapshot();
        let second = source.gate_snapshot();
        let (mut ctl, mut rx) = Controller::new(Arc::clone(&source));

        ctl.request_snapshots();
        wait_for(&source.snapshot_calls, 1).await;
        ctl.request_snapshots();
        wait_for(&source.snapshot_calls, 2).await;

        second.send(Ok(vec![snap("solana", 2.0)])).unwrap();
        // The first request was aborted; releasing it must not produce a result.
        let _ = first.send(Ok(vec![snap("bitcoin", 1.0)]));

        let update = ctl.apply(next(&mut rx).await);
        assert_eq!(update, Update::Snapshots { count: 1 });
        assert_eq!(ctl.snapshots()[0].id, "solana");

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(rx.try_recv().is_err());
        assert_eq!(ctl.snapshots()[0].id, "solana");
    }

    #[tokio::test]
    async fn test_late_result_of_superseded_request_is_discarded() {
        let source = Arc::new(GatedSource::default());
        let gate = source.gate_snapshot();
        let (mut ctl, mut rx) = Controller::new(Arc::clone(&source));

        ctl.request_snapshots();
        gate.send(Ok(vec![snap("cardano", 0.4)])).unwrap();
        let current = ctl.apply(next(&mut rx).await);
        assert_eq!(current, Update::Snapshots { count: 1 });

        // A result tagged with an older generation arrives after a newer one
        // was issued.
        let _pending = source.gate_snapshot();
        let latest = ctl.request_snapshots();
        let update = ctl.apply(FetchOutcome::Snapshots {
            generation: latest - 1,
            result: Ok(vec![snap("bitcoin", 1.0), snap("ethereum", 2.0)]),
        });
        assert_eq!(update, Update::Stale);
        assert_eq!(ctl.snapshots().len(), 1);
        assert_eq!(ctl.snapshots()[0].id, "cardano");
        assert!(ctl.is_snapshot_pending());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_state_and_reports_once() {
        let source = Arc::new(GatedSource::default());
        let ok_snap = source.gate_snapshot();
        let ok_hist = source.gate_history();
        let bad_snap = source.gate_snapshot();
        let bad_hist = source.gate_history();
        let (mut ctl, mut rx) = Controller::new(Arc::clone(&source));

        ctl.request_snapshots();
        ok_snap.send(Ok(vec![snap("bitcoin", 1.0)])).unwrap();
        ctl.apply(next(&mut rx).await);

        ctl.request_history("bitcoin", ChartRange::Week);
        ok_hist.send(Ok(series("bitcoin", &[1.0, 2.0, 3.0]))).unwrap();
        ctl.apply(next(&mut rx).await);

        let before_snaps = ctl.snapshots().to_vec();
        let before_hist = ctl.history().cloned();

        ctl.request_snapshots();
        bad_snap
            .send(Err(GeckoError::Http {
                status: 503,
                message: "unavailable".into(),
            }))
            .unwrap();
        ctl.request_history("bitcoin", ChartRange::Month);
        bad_hist.send(Err(GeckoError::Timeout)).unwrap();

        let mut notices = Vec::new();
        for _ in 0..2 {
            if let Update::Failed(notice) = ctl.apply(next(&mut rx).await) {
                notices.push(notice);
            }
        }

        assert_eq!(notices.len(), 2);
        assert!(notices.iter().all(|n| n.kind == NoticeKind::Fetch));
        assert_eq!(ctl.snapshots(), before_snaps.as_slice());
        assert_eq!(ctl.history().cloned(), before_hist);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_no_data_is_reported_distinctly() {
        let source = Arc::new(GatedSource::default());
        let gate = source.gate_history();
        let (mut ctl, mut rx) = Controller::new(Arc::clone(&source));

        ctl.request_history("ripple", ChartRange::Year);
        gate.send(Err(GeckoError::NoData {
            asset_id: "ripple".into(),
            days: 365,
        }))
        .unwrap();

        match ctl.apply(next(&mut rx).await) {
            Update::Failed(notice) => {
                assert_eq!(notice.kind, NoticeKind::NoData);
                assert!(notice.message.contains("ripple"));
            }
            other => panic!("unexpected update: {other:?}"),
        }
        assert!(ctl.history().is_none());
        assert_eq!(ctl.history_target(), Some(("ripple", ChartRange::Year)));
    }

    #[tokio::test]
    async fn test_history_supersede_applies_latest_only() {
        let source = Arc::new(GatedSource::default());
        let first = source.gate_history();
        let second = source.gate_history();
        let (mut ctl, mut rx) = Controller::new(Arc::clone(&source));

        ctl.request_history("bitcoin", ChartRange::Week);
        wait_for(&source.history_calls, 1).await;
        ctl.request_history("ethereum", ChartRange::Quarter);
        wait_for(&source.history_calls, 2).await;

        second.send(Ok(series("ethereum", &[10.0, 10.0]))).unwrap();
        let _ = first.send(Ok(series("bitcoin", &[1.0, 2.0])));

        let update = ctl.apply(next(&mut rx).await);
        assert_eq!(
            update,
            Update::History {
                asset_id: "ethereum".into(),
                range: ChartRange::Quarter,
                points: 2,
            }
        );
        let hist = ctl.history().unwrap();
        assert_eq!(hist.asset_id, "ethereum");
        assert_eq!(hist.changes[0].trend, Some(Trend::Increase));
    }

    #[tokio::test]
    async fn test_icon_loaded_once_per_selection() {
        let source = Arc::new(GatedSource::default());
        let (mut ctl, mut rx) = Controller::new(Arc::clone(&source));
        let btc = snap("bitcoin", 1.0);

        ctl.request_icon(&btc);
        // Same asset again while loading: no second request.
        ctl.request_icon(&btc);

        let update = ctl.apply(next(&mut rx).await);
        assert_eq!(
            update,
            Update::Icon {
                asset_id: "bitcoin".into()
            }
        );
        assert_eq!(ctl.icon("bitcoin").unwrap().len(), 3);
        assert!(ctl.icon("ethereum").is_none());

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_icon_is_marked_until_reselected() {
        let source = Arc::new(GatedSource::default());
        source.icons_fail.store(true, Ordering::SeqCst);
        let (mut ctl, mut rx) = Controller::new(Arc::clone(&source));
        let btc = snap("bitcoin", 1.0);
        let eth = snap("ethereum", 1.0);

        ctl.request_icon(&btc);
        assert!(!ctl.icon_failed("bitcoin"));
        match ctl.apply(next(&mut rx).await) {
            Update::Failed(notice) => assert_eq!(notice.kind, NoticeKind::Fetch),
            other => panic!("unexpected update: {other:?}"),
        }
        assert!(ctl.icon_failed("bitcoin"));
        assert!(ctl.icon("bitcoin").is_none());

        // Same selection: no retry, still failed.
        ctl.request_icon(&btc);
        assert!(ctl.icon_failed("bitcoin"));

        source.icons_fail.store(false, Ordering::SeqCst);
        ctl.request_icon(&eth);
        assert!(!ctl.icon_failed("bitcoin"));
        assert!(!ctl.icon_failed("ethereum"));
        assert_eq!(
            ctl.apply(next(&mut rx).await),
            Update::Icon {
                asset_id: "ethereum".into()
            }
        );
    }
}
