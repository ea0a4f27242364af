use serde::{Deserialize, Serialize};

/// Current market state for one tracked asset, as returned by `/coins/markets`.
///
/// Numeric fields are in the units supplied by the API; no conversion is done
/// client-side. Nullable percentage fields are kept as `Option` and defaulted
/// explicitly through [`AssetSnapshot::change_24h`] / [`AssetSnapshot::change_7d`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub current_price: f64,
    pub market_cap: f64,
    pub total_volume: f64,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub total_supply: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_7d_in_currency: Option<f64>,
}

impl AssetSnapshot {
    /// 24h change in percent; `0.0` when the API omitted it.
    pub fn change_24h(&self) -> f64 {
        self.price_change_percentage_24h.unwrap_or(0.0)
    }

    /// 7d change in percent; `0.0` when the API omitted it.
    pub fn change_7d(&self) -> f64 {
        self.price_change_percentage_7d_in_currency.unwrap_or(0.0)
    }

    /// `true` when the asset has no capped supply.
    pub fn has_unlimited_supply(&self) -> bool {
        self.total_supply.is_none()
    }
}
