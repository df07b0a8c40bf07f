//! CoinGecko price/supply client with the alternative.me Fear & Greed index.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{parse, MarketDataSource};
use crate::config::{Config, SecondaryIndexConfig};
use crate::utils::error::{Error, Result};
use crate::utils::types::{PricePoint, SecondaryIndex, SentimentReading};

/// HTTP market data source.
#[derive(Clone)]
pub struct CoinGeckoSource {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    coin_id: String,
    vs_currency: String,
    sentiment_url: String,
    secondary: Option<SecondaryIndexConfig>,
}

impl CoinGeckoSource {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.market.timeout_seconds))
            .user_agent(concat!("tetherwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_url: config.market.api_url.trim_end_matches('/').to_string(),
            api_key: config.market.api_key.clone(),
            coin_id: config.asset.coin_id.clone(),
            vs_currency: config.asset.vs_currency.to_lowercase(),
            sentiment_url: config.market.sentiment_url.clone(),
            secondary: config.metrics.secondary_index.clone(),
        })
    }

    async fn get_json(&self, stage: &'static str, url: &str, query: &[(&str, String)]) -> Result<Value> {
        let mut req = self.client.get(url).query(query);
        if let Some(ref key) = self.api_key {
            if url.starts_with(&self.api_url) {
                req = req.header("x-cg-demo-api-key", key);
            }
        }
        let resp = req
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::data_source(stage, e))?;
        let body: Value = resp.json().await.map_err(|e| Error::data_source(stage, e))?;
        log::debug!("{} response from {}: {}", stage, url, body);
        Ok(body)
    }
}

#[async_trait]
impl MarketDataSource for CoinGeckoSource {
    async fn fetch_current_value(&self) -> Result<f64> {
        let url = format!("{}/simple/price", self.api_url);
        let body = self
            .get_json(
                "current_value",
                &url,
                &[("ids", self.coin_id.clone()), ("vs_currencies", self.vs_currency.clone())],
            )
            .await?;
        let value = parse::simple_price(&body, &self.coin_id, &self.vs_currency)?;
        log::debug!("Current value fetched: {} {}", value, self.vs_currency.to_uppercase());
        Ok(value)
    }

    async fn fetch_recent_price_series(&self, window_days: u32) -> Result<Vec<PricePoint>> {
        let url = format!("{}/coins/{}/market_chart", self.api_url, self.coin_id);
        let body = self
            .get_json(
                "price_series",
                &url,
                &[("vs_currency", self.vs_currency.clone()), ("days", window_days.to_string())],
            )
            .await?;
        let series = parse::price_series(&body)?;
        log::debug!("Fetched {} price points over {} days", series.len(), window_days);
        Ok(series)
    }

    async fn fetch_circulating_supply(&self) -> Result<f64> {
        let url = format!("{}/coins/{}", self.api_url, self.coin_id);
        let body = self
            .get_json(
                "circulating_supply",
                &url,
                &[
                    ("localization", "false".to_string()),
                    ("tickers", "false".to_string()),
                    ("market_data", "true".to_string()),
                    ("community_data", "false".to_string()),
                    ("developer_data", "false".to_string()),
                ],
            )
            .await?;
        parse::circulating_supply(&body)
    }

    async fn fetch_sentiment_index(&self) -> Result<SentimentReading> {
        let body = self
            .get_json("sentiment_index", &self.sentiment_url, &[("limit", "1".to_string())])
            .await?;
        parse::fear_greed(&body)
    }

    async fn fetch_secondary_index(&self) -> Result<SecondaryIndex> {
        let cfg = self
            .secondary
            .as_ref()
            .ok_or_else(|| Error::ConfigError("metrics.secondary_index is not configured".to_string()))?;
        let body = self.get_json("secondary_index", &cfg.url, &[]).await?;
        let value = parse::pointer_value(&body, &cfg.json_pointer)?;
        Ok(SecondaryIndex { label: cfg.label.clone(), value })
    }
}
