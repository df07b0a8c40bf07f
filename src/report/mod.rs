//! Report composition.
//!
//! [`compose_report`] is a pure function of its inputs: no clock, no I/O, so
//! the same run always produces the same text.

pub mod format;

use std::fmt::Write as _;

use crate::engine::{percentage_change, Direction, GenerationRecord, RankedPeriod};
use crate::utils::types::{SecondaryIndex, SentimentReading};

use self::format::{abbreviated, grouped, money};

/// Sentiment bucket; the boundary at 50 belongs to `Greed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Fear,
    Greed,
}

impl Sentiment {
    pub fn classify(index: u8) -> Self {
        if index < 50 {
            Sentiment::Fear
        } else {
            Sentiment::Greed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Fear => "Fear",
            Sentiment::Greed => "Greed",
        }
    }
}

/// Everything the report needs for one run.
#[derive(Debug, Clone)]
pub struct ReportInputs<'a> {
    pub asset_name: &'a str,
    pub asset_symbol: &'a str,
    pub currency: &'a str,
    pub current_value: f64,
    pub thirty_day_low: Option<f64>,
    pub current_supply: f64,
    pub period_start_supply: Option<f64>,
    pub generation: &'a GenerationRecord,
    pub ranking: &'a [RankedPeriod],
    pub sentiment: Option<&'a SentimentReading>,
    pub secondary_index: Option<&'a SecondaryIndex>,
    /// Decimal places for grouped supply figures (0–2)
    pub supply_decimals: usize,
}

/// Build the status message.
pub fn compose_report(inputs: &ReportInputs<'_>) -> String {
    let currency = inputs.currency.to_uppercase();
    let symbol = inputs.asset_symbol;
    let period = inputs.generation.current();
    let mut out = String::new();

    let _ = writeln!(out, "*{} ({}) status for {}*", inputs.asset_name, symbol, period);

    let _ = write!(
        out,
        "Today's value of {} is: {} {}.",
        inputs.asset_name,
        money(inputs.current_value),
        currency
    );
    match inputs.thirty_day_low.map(|low| (low, percentage_change(inputs.current_value, low))) {
        Some((low, Ok(pct))) => {
            let _ = writeln!(
                out,
                " This is a {:.2}% {} in value compared with the lowest value over the past month ({} {}).",
                pct.abs(),
                Direction::of(pct).word(),
                money(low),
                currency
            );
        }
        _ => {
            let _ = writeln!(out, " No valid lowest value over the past month is available for comparison.");
        }
    }

    let _ = write!(
        out,
        "Circulating supply: {} {} ({}).",
        abbreviated(inputs.current_supply, inputs.supply_decimals),
        symbol,
        grouped(inputs.current_supply, inputs.supply_decimals)
    );
    match inputs.period_start_supply.map(|start| (start, percentage_change(inputs.current_supply, start))) {
        Some((start, Ok(pct))) => {
            let _ = writeln!(
                out,
                " This is a {:.2}% {} compared with the start of {} ({}).",
                pct.abs(),
                Direction::of(pct).word(),
                period,
                abbreviated(start, inputs.supply_decimals)
            );
        }
        _ => {
            let _ = writeln!(out, " No valid supply figure for the start of {} is available.", period);
        }
    }

    match inputs.generation.current_amount() {
        Some(amount) => {
            let _ = writeln!(
                out,
                "Tokens generated in {} so far: {} {}.",
                period,
                abbreviated(amount, inputs.supply_decimals),
                symbol
            );
        }
        None => {
            let _ = writeln!(out, "Tokens generated in {} so far: no data.", period);
        }
    }

    if !inputs.ranking.is_empty() {
        let _ = writeln!(out, "Tokens generated per month, ranked:");
        for row in inputs.ranking {
            let marker = if row.period == period { " (current)" } else { "" };
            let _ = writeln!(
                out,
                "{}. {}: {}{}",
                row.rank,
                row.period,
                abbreviated(row.amount, inputs.supply_decimals),
                marker
            );
        }
    }
    let missing: Vec<String> = inputs.generation.missing().map(|p| p.to_string()).collect();
    if !missing.is_empty() {
        let _ = writeln!(out, "No data: {}", missing.join(", "));
    }

    if let Some(reading) = inputs.sentiment {
        let bucket = Sentiment::classify(reading.index).as_str();
        let provider = reading.label.trim();
        if provider.is_empty() || provider.eq_ignore_ascii_case(bucket) {
            let _ = writeln!(out, "Fear & Greed Index: {} ({})", reading.index, bucket);
        } else {
            let _ = writeln!(out, "Fear & Greed Index: {} ({}, provider: {})", reading.index, bucket, provider);
        }
    }
    if let Some(index) = inputs.secondary_index {
        let _ = writeln!(out, "{}: {}", index.label, money(index.value));
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SupplyEngine;
    use crate::period::Period;
    use crate::persistence::SupplySnapshot;
    use rstest::rstest;

    fn p(y: i32, m: u32) -> Period {
        Period::new(y, m).unwrap()
    }

    fn fixture() -> (GenerationRecord, Vec<RankedPeriod>) {
        let engine = SupplyEngine::default();
        let snap: SupplySnapshot = [
            (p(2024, 1), 91_000_000_000.0),
            (p(2024, 2), 96_000_000_000.0),
            (p(2024, 3), 99_000_000_000.0),
            (p(2024, 4), 0.0),
        ]
        .into_iter()
        .collect();
        let record = engine.generation(&snap, p(2024, 3), 99_450_000_000.0);
        let ranking = engine.rank(&record);
        (record, ranking)
    }

    fn inputs<'a>(record: &'a GenerationRecord, ranking: &'a [RankedPeriod]) -> ReportInputs<'a> {
        ReportInputs {
            asset_name: "Tether",
            asset_symbol: "USDT",
            currency: "nzd",
            current_value: 1.00,
            thirty_day_low: Some(0.98),
            current_supply: 99_450_000_000.0,
            period_start_supply: Some(99_000_000_000.0),
            generation: record,
            ranking,
            sentiment: None,
            secondary_index: None,
            supply_decimals: 0,
        }
    }

    #[rstest]
    #[case(0, Sentiment::Fear)]
    #[case(49, Sentiment::Fear)]
    #[case(50, Sentiment::Greed)]
    #[case(100, Sentiment::Greed)]
    fn test_sentiment_boundary(#[case] index: u8, #[case] expected: Sentiment) {
        assert_eq!(Sentiment::classify(index), expected);
    }

    #[test]
    fn test_full_report() {
        let (record, ranking) = fixture();
        let sentiment = SentimentReading { index: 50, label: "Neutral".into() };
        let vix = SecondaryIndex { label: "Volatility Index".into(), value: 45.3 };
        let mut i = inputs(&record, &ranking);
        i.sentiment = Some(&sentiment);
        i.secondary_index = Some(&vix);

        let expected = "\
*Tether (USDT) status for March 2024*
Today's value of Tether is: 1.00 NZD. This is a 2.04% increase in value compared with the lowest value over the past month (0.98 NZD).
Circulating supply: 99.45B USDT (99,450,000,000). This is a 0.45% increase compared with the start of March 2024 (99.00B).
Tokens generated in March 2024 so far: 450.00M USDT.
Tokens generated per month, ranked:
1. January 2024: 5.00B
2. February 2024: 3.00B
3. March 2024: 450.00M (current)
No data: April 2024
Fear & Greed Index: 50 (Greed, provider: Neutral)
Volatility Index: 45.30";
        assert_eq!(compose_report(&i), expected);
    }

    #[test]
    fn test_report_is_deterministic() {
        let (record, ranking) = fixture();
        let i = inputs(&record, &ranking);
        assert_eq!(compose_report(&i), compose_report(&i));
    }

    #[test]
    fn test_zero_change_reads_as_decrease() {
        let (record, ranking) = fixture();
        let mut i = inputs(&record, &ranking);
        i.thirty_day_low = Some(1.00);
        let report = compose_report(&i);
        assert!(report.contains("This is a 0.00% decrease in value"));
    }

    #[test]
    fn test_invalid_baselines_are_reported_not_fatal() {
        let (record, ranking) = fixture();
        let mut i = inputs(&record, &ranking);
        i.thirty_day_low = Some(0.0);
        i.period_start_supply = None;
        let report = compose_report(&i);
        assert!(report.contains("No valid lowest value over the past month"));
        assert!(report.contains("No valid supply figure for the start of March 2024"));

        i.thirty_day_low = None;
        assert!(compose_report(&i).contains("No valid lowest value over the past month"));
    }

    #[test]
    fn test_decrease_uses_absolute_percentage() {
        let (record, ranking) = fixture();
        let mut i = inputs(&record, &ranking);
        i.current_supply = 98_010_000_000.0;
        let report = compose_report(&i);
        assert!(report.contains("This is a 1.00% decrease compared with the start of March 2024"));
    }
}
