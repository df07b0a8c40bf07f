//! Market data sources.
//!
//! The monitor only depends on [`MarketDataSource`]; [`CoinGeckoSource`] is
//! the HTTP implementation used by the binary.

pub mod coingecko;
pub mod parse;

use async_trait::async_trait;

use crate::utils::types::{PricePoint, SecondaryIndex, SentimentReading};
use crate::Result;

pub use coingecko::CoinGeckoSource;

/// Trait for providers of price, supply and sentiment data.
///
/// Implementations perform no retries; a failed call fails the run and the
/// next scheduled run tries again.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Current price in the configured quote currency.
    async fn fetch_current_value(&self) -> Result<f64>;

    /// Price series covering the last `window_days`, oldest first.
    async fn fetch_recent_price_series(&self, window_days: u32) -> Result<Vec<PricePoint>>;

    /// Current circulating supply.
    async fn fetch_circulating_supply(&self) -> Result<f64>;

    /// Latest Fear & Greed reading.
    async fn fetch_sentiment_index(&self) -> Result<SentimentReading>;

    /// Secondary (e.g. volatility) index.
    async fn fetch_secondary_index(&self) -> Result<SecondaryIndex>;
}
