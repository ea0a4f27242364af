use std::time::Duration;

/// Public CoinGecko API root.
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Quote currency used when none is configured.
pub const DEFAULT_VS_CURRENCY: &str = "usd";

/// Assets tracked out of the box.
pub const DEFAULT_ASSET_IDS: [&str; 6] = [
    "bitcoin", "ethereum", "solana", "dogecoin", "cardano", "ripple",
];

/// Upper bound on a single request round trip.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration for the CoinGecko client.
#[derive(Debug, Clone)]
pub struct GeckoConfig {
    /// API root (e.g. `https://api.coingecko.com/api/v3`).
    pub base_url: String,
    /// Quote currency code, lowercase.
    pub vs_currency: String,
    /// Catalog ids of the tracked assets, in display order.
    pub asset_ids: Vec<String>,
    /// Bounded wait for each request.
    pub request_timeout: Duration,
    /// Demo API key, sent as `x-cg-demo-api-key` when set.
    pub api_key: Option<String>,
    /// Icon cache capacity; defaults to the number of tracked assets.
    pub icon_cache_capacity: Option<u64>,
}

impl GeckoConfig {
    pub fn icon_capacity(&self) -> u64 {
        self.icon_cache_capacity
            .unwrap_or(self.asset_ids.len() as u64)
            .max(1)
    }
}

impl Default for GeckoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            vs_currency: DEFAULT_VS_CURRENCY.into(),
            asset_ids: DEFAULT_ASSET_IDS.iter().map(|s| s.to_string()).collect(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            api_key: None,
            icon_cache_capacity: None,
        }
    }
}
