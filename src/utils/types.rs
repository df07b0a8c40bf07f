//! Common types shared between data sources, the engine and the report.

use serde::{Deserialize, Serialize};

/// One point of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp_ms: i64, price: f64) -> Self {
        Self { timestamp_ms, price }
    }
}

/// Fear & Greed style sentiment reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentReading {
    /// 0–100
    pub index: u8,
    /// Classification reported by the provider, e.g. "Extreme Fear"
    pub label: String,
}

/// Secondary market index (e.g. a volatility index) with its display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryIndex {
    pub label: String,
    pub value: f64,
}

/// Everything fetched from the market data source for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketObservation {
    pub current_value: f64,
    pub price_series: Vec<PricePoint>,
    pub circulating_supply: f64,
    pub sentiment: Option<SentimentReading>,
    pub secondary_index: Option<SecondaryIndex>,
}
