//! Response parsing for the HTTP data sources.
//!
//! Kept free of I/O so the expected response shapes can be tested offline.

use serde_json::Value;

use crate::utils::error::{Error, Result};
use crate::utils::types::{PricePoint, SentimentReading};

fn number(v: &Value) -> Option<f64> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite())
}

/// `/simple/price` → `{"tether": {"nzd": 1.63}}`
pub fn simple_price(body: &Value, coin_id: &str, vs_currency: &str) -> Result<f64> {
    body.get(coin_id)
        .and_then(|c| c.get(vs_currency.to_lowercase()))
        .and_then(number)
        .ok_or_else(|| Error::data_source("current_value", format!("no {}/{} price in response", coin_id, vs_currency)))
}

/// `/coins/{id}/market_chart` → `{"prices": [[ms, price], ...]}`
pub fn price_series(body: &Value) -> Result<Vec<PricePoint>> {
    let rows = body
        .get("prices")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::data_source("price_series", "missing prices array"))?;

    rows.iter()
        .map(|row| {
            let pair = row.as_array().filter(|a| a.len() >= 2);
            let ts = pair.and_then(|a| a[0].as_f64()).map(|t| t as i64);
            let price = pair.and_then(|a| number(&a[1]));
            match (ts, price) {
                (Some(ts), Some(price)) => Ok(PricePoint::new(ts, price)),
                _ => Err(Error::data_source("price_series", format!("malformed price row {}", row))),
            }
        })
        .collect()
}

/// `/coins/{id}` → `{"market_data": {"circulating_supply": 1.19e11}}`
pub fn circulating_supply(body: &Value) -> Result<f64> {
    let supply = body
        .pointer("/market_data/circulating_supply")
        .and_then(number)
        .ok_or_else(|| Error::data_source("circulating_supply", "missing market_data.circulating_supply"))?;
    if supply < 0.0 {
        return Err(Error::data_source("circulating_supply", format!("negative supply {}", supply)));
    }
    Ok(supply)
}

/// alternative.me `/fng/` → `{"data": [{"value": "72", "value_classification": "Greed"}]}`
pub fn fear_greed(body: &Value) -> Result<SentimentReading> {
    let entry = body
        .pointer("/data/0")
        .ok_or_else(|| Error::data_source("sentiment_index", "empty data array"))?;
    let index = entry
        .get("value")
        .and_then(number)
        .filter(|v| (0.0..=100.0).contains(v))
        .ok_or_else(|| Error::data_source("sentiment_index", "value missing or outside 0-100"))?;
    let label = entry
        .get("value_classification")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(SentimentReading { index: index.round() as u8, label })
}

/// Numeric value at a JSON pointer.
pub fn pointer_value(body: &Value, pointer: &str) -> Result<f64> {
    body.pointer(pointer)
        .and_then(number)
        .ok_or_else(|| Error::data_source("secondary_index", format!("no numeric value at {:?}", pointer)))
}
