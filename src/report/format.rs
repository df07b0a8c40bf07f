//! Number formatting helpers for reports.

const BILLION: f64 = 1_000_000_000.0;
const MILLION: f64 = 1_000_000.0;

/// Fixed two-decimal currency figure, e.g. `1.63`.
pub fn money(value: f64) -> String {
    format!("{:.2}", value)
}

/// Thousands-grouped figure with `decimals` places (clamped to 0–2).
pub fn grouped(value: f64, decimals: usize) -> String {
    let decimals = decimals.min(2);
    let digits = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits.as_str(), None),
    };

    let mut out = String::with_capacity(digits.len() + int_part.len() / 3 + 1);
    if value < 0.0 && digits.bytes().any(|b| (b'1'..=b'9').contains(&b)) {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Abbreviate large magnitudes: `B` from one billion, `M` from one million,
/// otherwise [`grouped`] with `decimals` places.
///
/// Buckets are chosen on the rounded figure, so `999_999_999` prints as
/// `1.00B` rather than `1000.00M`.
pub fn abbreviated(value: f64, decimals: usize) -> String {
    let magnitude = value.abs();
    let millions = (magnitude / MILLION * 100.0).round() / 100.0;
    let units = rounded(magnitude, decimals.min(2));
    if magnitude >= BILLION || millions >= 1_000.0 {
        format!("{:.2}B", value / BILLION)
    } else if magnitude >= MILLION || units >= MILLION {
        format!("{:.2}M", value / MILLION)
    } else {
        grouped(value, decimals)
    }
}

fn rounded(value: f64, decimals: usize) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0, "0")]
    #[case(999.0, 0, "999")]
    #[case(1_000.0, 0, "1,000")]
    #[case(1_234_567.891, 2, "1,234,567.89")]
    #[case(119_452_000_000.0, 0, "119,452,000,000")]
    #[case(12_345.6, 1, "12,345.6")]
    #[case(-1_500.25, 2, "-1,500.25")]
    #[case(-0.001, 2, "0.00")]
    #[case(5.0, 7, "5.00")]
    fn test_grouped(#[case] value: f64, #[case] decimals: usize, #[case] expected: &str) {
        assert_eq!(grouped(value, decimals), expected);
    }

    #[rstest]
    #[case(1_000_000_000.0, "1.00B")]
    #[case(119_452_000_000.0, "119.45B")]
    #[case(999_999_999.0, "1.00B")]
    #[case(-999_999_999.0, "-1.00B")]
    #[case(999_994_999.0, "999.99M")]
    #[case(999_999.6, "1.00M")]
    #[case(1_000_000.0, "1.00M")]
    #[case(4_960_000.0, "4.96M")]
    #[case(-2_500_000_000.0, "-2.50B")]
    #[case(999_999.0, "999,999")]
    fn test_abbreviated(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(abbreviated(value, 0), expected);
    }

    #[test]
    fn test_money() {
        assert_eq!(money(1.0), "1.00");
        assert_eq!(money(1.634), "1.63");
    }
}
