//! Number formatting for terminal tables

/// Abbreviate large magnitudes: `1.32T`, `48.00B`, `3.70M`, `1.50K`
///
/// Values below one thousand keep up to two decimals.
pub fn compact(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if abs >= 1e12 {
        format!("{}{:.2}T", sign, abs / 1e12)
    } else if abs >= 1e9 {
        format!("{}{:.2}B", sign, abs / 1e9)
    } else if abs >= 1e6 {
        format!("{}{:.2}M", sign, abs / 1e6)
    } else if abs >= 1e3 {
        format!("{}{:.2}K", sign, abs / 1e3)
    } else {
        grouped(value, 2)
    }
}

/// Dollar amount with thousands separators and at most two decimals
pub fn usd(value: f64) -> String {
    if value < 0.0 {
        format!("-${}", grouped(-value, 2))
    } else {
        format!("${}", grouped(value, 2))
    }
}

/// Prices keep more precision below one dollar so sub-cent coins stay readable
pub fn price(value: f64) -> String {
    if value.abs() >= 1.0 || value == 0.0 {
        usd(value)
    } else {
        format!("${}", grouped(value, 8))
    }
}

/// Signed percentage with two decimals: `+2.15%`, `-1.02%`
pub fn percent(value: f64) -> String {
    format!("{:+.2}%", value)
}

/// Wallet balance with at most four decimals
pub fn balance(value: f64) -> String {
    grouped(value, 4)
}

/// Round to `max_decimals`, drop trailing zeros, group the integer part by thousands
pub fn grouped(value: f64, max_decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = format!("{:.*}", max_decimals, value.abs());
    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (rounded.as_str(), ""),
    };

    let mut out = String::with_capacity(rounded.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }

    let is_zero = out.chars().all(|c| c == '0' || c == ',' || c == '.');
    if value < 0.0 && !is_zero {
        format!("-{}", out)
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact() {
        assert_eq!(compact(1.32e12), "1.32T");
        assert_eq!(compact(48.0e9), "48.00B");
        assert_eq!(compact(3.7e6), "3.70M");
        assert_eq!(compact(1500.0), "1.50K");
        assert_eq!(compact(999.5), "999.5");
        assert_eq!(compact(-2.5e9), "-2.50B");
    }

    #[test]
    fn test_usd() {
        assert_eq!(usd(67123.0), "$67,123");
        assert_eq!(usd(1234567.891), "$1,234,567.89");
        assert_eq!(usd(150.87), "$150.87");
        assert_eq!(usd(0.0), "$0");
        assert_eq!(usd(-42.5), "-$42.5");
    }

    #[test]
    fn test_price_keeps_small_values() {
        assert_eq!(price(0.000026), "$0.000026");
        assert_eq!(price(3470.0), "$3,470");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(2.15), "+2.15%");
        assert_eq!(percent(-1.02), "-1.02%");
        assert_eq!(percent(0.0), "+0.00%");
    }

    #[test]
    fn test_balance() {
        assert_eq!(balance(1.5), "1.5");
        assert_eq!(balance(12345.678912), "12,345.6789");
        assert_eq!(balance(0.0), "0");
    }

    #[test]
    fn test_grouped_edge_cases() {
        assert_eq!(grouped(100.0, 2), "100");
        assert_eq!(grouped(1000.0, 2), "1,000");
        assert_eq!(grouped(-0.001, 2), "0");
        assert_eq!(grouped(f64::NAN, 2), "NaN");
    }
}
