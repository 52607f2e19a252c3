//! Display formatting for metric cards, tables and chart labels.
//!
//! Formatting is a presentation concern: aggregation never rounds, these
//! helpers are only applied when values are shown.

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use dashboard_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by a relative epsilon so exact decimal midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();
    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        // `frac_str` starts with "0.", e.g. "0.50".
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && result.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a monetary amount as a USD string with two decimal places and
/// thousands separators.
///
/// ```
/// use dashboard_core::formatting::format_currency;
///
/// assert_eq!(format_currency(1234.56),  "$1,234.56");
/// assert_eq!(format_currency(-9.99),    "-$9.99");
/// ```
pub fn format_currency(amount: f64) -> String {
    let body = format_number(amount.abs(), 2);
    if amount < 0.0 && body != "0.00" {
        format!("-${}", body)
    } else {
        format!("${}", body)
    }
}

/// Metric-card format for monetary totals in millions: `$X.XXM`.
///
/// ```
/// use dashboard_core::formatting::format_millions;
///
/// assert_eq!(format_millions(899_902_125.0), "$899.90M");
/// ```
pub fn format_millions(amount: f64) -> String {
    let millions = amount / 1_000_000.0;
    if millions < 0.0 {
        format!("-${:.2}M", millions.abs())
    } else {
        format!("${:.2}M", millions)
    }
}

/// Metric-card format for unit totals in thousands: `X.XXK`.
///
/// ```
/// use dashboard_core::formatting::format_thousands;
///
/// assert_eq!(format_thousands(2_478_861), "2478.86K");
/// ```
pub fn format_thousands(units: u64) -> String {
    format!("{:.2}K", units as f64 / 1_000.0)
}

/// Integer count with thousands separators, e.g. `9,648`.
pub fn format_count(count: u64) -> String {
    group_thousands(&count.to_string())
}

/// Compact axis / bar label for a monetary amount: `$1.2M`, `$35.4K`, `$980`.
pub fn format_compact_currency(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let abs = amount.abs();
    if abs >= 1_000_000.0 {
        format!("{sign}${:.1}M", abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{sign}${:.1}K", abs / 1_000.0)
    } else {
        format!("{sign}${:.0}", abs)
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// ```
/// use dashboard_core::formatting::percentage;
///
/// assert!((percentage(50.0, 200.0, 1) - 25.0).abs() < 1e-9);
/// assert_eq!(percentage(0.0, 0.0, 2), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let raw = (part / whole) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_with_thousands() {
        assert_eq!(format_number(1_234.5, 1), "1,234.5");
        assert_eq!(format_number(1_234_567.0, 0), "1,234,567");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(-9_876.5, 1), "-9,876.5");
    }

    #[test]
    fn test_format_number_negative_rounding_to_zero_has_no_sign() {
        assert_eq!(format_number(-0.001, 2), "0.00");
    }

    #[test]
    fn test_format_number_rounds_up() {
        assert_eq!(format_number(1.005, 2), "1.01");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1_234.56), "$1,234.56");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(-9.99), "-$9.99");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
    }

    #[test]
    fn test_format_millions() {
        assert_eq!(format_millions(350.0), "$0.00M");
        assert_eq!(format_millions(1_500_000.0), "$1.50M");
        assert_eq!(format_millions(-2_250_000.0), "-$2.25M");
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0.00K");
        assert_eq!(format_thousands(40), "0.04K");
        assert_eq!(format_thousands(12_500), "12.50K");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(3), "3");
        assert_eq!(format_count(9_648), "9,648");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_compact_currency() {
        assert_eq!(format_compact_currency(980.0), "$980");
        assert_eq!(format_compact_currency(35_400.0), "$35.4K");
        assert_eq!(format_compact_currency(1_230_000.0), "$1.2M");
        assert_eq!(format_compact_currency(-4_500.0), "-$4.5K");
    }

    #[test]
    fn test_percentage() {
        assert!((percentage(50.0, 200.0, 1) - 25.0).abs() < 1e-9);
        assert_eq!(percentage(10.0, 0.0, 2), 0.0);
        assert!((percentage(1.0, 3.0, 2) - 33.33).abs() < 1e-2);
    }
}
