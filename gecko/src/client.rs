use tracing::{debug, info};

use crate::config::GeckoConfig;
use crate::error::Result;
use crate::history::build_series;
use crate::icons::{Icon, IconCache};
use crate::rest::GeckoHttpClient;
use crate::types::*;

/// Main client: market snapshots, price history and icons for the tracked set.
#[derive(Clone)]
pub struct Gecko {
    /// Quote currency code.
    pub vs_currency: String,
    /// Tracked asset ids.
    pub asset_ids: Vec<String>,
    /// HTTP client.
    pub http_client: GeckoHttpClient,
    icons: IconCache,
}

impl Gecko {
    /// Create a client from configuration. No request is made.
    pub fn new(config: GeckoConfig) -> Result<Self> {
        let http_client = GeckoHttpClient::new(
            &config.base_url,
            config.request_timeout,
            config.api_key.as_deref(),
        )?;
        let icons = IconCache::new(http_client.clone(), config.icon_capacity());

        Ok(Self {
            vs_currency: config.vs_currency,
            asset_ids: config.asset_ids,
            http_client,
            icons,
        })
    }

    /// Fetch the current snapshot of every tracked asset, in server order.
    pub async fn fetch_snapshots(&self) -> Result<Vec<AssetSnapshot>> {
        debug!(assets = self.asset_ids.len(), "fetching market snapshot");
        let snapshots = self
            .http_client
            .get_coin_markets(&self.vs_currency, &self.asset_ids)
            .await?;
        info!(count = snapshots.len(), "market snapshot fetched");
        Ok(snapshots)
    }

    /// Fetch and transform the daily price history of one asset.
    pub async fn fetch_history(&self, asset_id: &str, range: ChartRange) -> Result<PriceSeries> {
        debug!(asset_id, days = range.days(), "fetching price history");
        let chart = self
            .http_client
            .get_market_chart(asset_id, &self.vs_currency, range.days())
            .await?;
        let series = build_series(asset_id, range, chart)?;
        info!(asset_id, points = series.points.len(), "price history fetched");
        Ok(series)
    }

    /// Icon for an asset, through the bounded cache.
    pub async fn fetch_icon(&self, asset_id: &str, url: &str) -> Result<Icon> {
        self.icons.get_or_fetch(asset_id, url).await
    }

    pub fn icon_cache(&self) -> &IconCache {
        &self.icons
    }
}
