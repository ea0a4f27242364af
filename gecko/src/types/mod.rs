mod enums;
mod history;
mod market;

pub use enums::{ChartRange, Trend};
pub use history::{MarketChart, PriceChange, PricePoint, PriceSeries};
pub use market::AssetSnapshot;
