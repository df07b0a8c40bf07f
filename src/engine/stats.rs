//! Percentage figures used by the report.

use crate::utils::error::{Error, Result};
use crate::utils::types::PricePoint;

/// Direction of a percentage change. Zero counts as a non-increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    pub fn of(pct: f64) -> Self {
        if pct > 0.0 {
            Direction::Increase
        } else {
            Direction::Decrease
        }
    }

    pub fn word(&self) -> &'static str {
        match self {
            Direction::Increase => "increase",
            Direction::Decrease => "decrease",
        }
    }
}

/// `(current - baseline) / baseline * 100`.
///
/// A zero or non-finite baseline is [`Error::InvalidBaseline`].
pub fn percentage_change(current: f64, baseline: f64) -> Result<f64> {
    if baseline == 0.0 || !baseline.is_finite() {
        return Err(Error::InvalidBaseline { baseline });
    }
    Ok((current - baseline) / baseline * 100.0)
}

/// Lowest price in the series, `None` when empty.
pub fn lowest_price(series: &[PricePoint]) -> Option<f64> {
    series
        .iter()
        .map(|p| p.price)
        .filter(|p| p.is_finite())
        .min_by(|a, b| a.total_cmp(b))
}
