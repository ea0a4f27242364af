use crate::error::Result;
use crate::rest::GeckoHttpClient;
use crate::types::*;

/// Percentage-change windows requested alongside market data.
pub const PRICE_CHANGE_WINDOWS: &str = "24h,7d";

impl GeckoHttpClient {
    // --- Markets ---

    /// GET /coins/markets - Current market data for the given ids, in server order.
    pub async fn get_coin_markets(
        &self,
        vs_currency: &str,
        ids: &[String],
    ) -> Result<Vec<AssetSnapshot>> {
        let ids = ids.join(",");
        self.get(
            &["coins", "markets"],
            &[
                ("vs_currency", vs_currency),
                ("ids", ids.as_str()),
                ("price_change_percentage", PRICE_CHANGE_WINDOWS),
            ],
        )
        .await
    }

    // --- History ---

    /// GET /coins/{id}/market_chart - Daily price history over `days`.
    pub async fn get_market_chart(
        &self,
        asset_id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<MarketChart> {
        let days = days.to_string();
        self.get(
            &["coins", asset_id, "market_chart"],
            &[
                ("vs_currency", vs_currency),
                ("days", days.as_str()),
                ("interval", "daily"),
            ],
        )
        .await
    }
}
