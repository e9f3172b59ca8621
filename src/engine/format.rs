//! Number formatting for alert text: `1,234.5` prices, `+15.0%` changes.

use num_format::{Locale, ToFormattedString};

/// Thousands separators, one decimal place.
pub fn price(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let tenths = (value.abs() * 10.0).round() as u64;
    let sign = if value < 0.0 && tenths > 0 { "-" } else { "" };
    format!(
        "{sign}{}.{}",
        (tenths / 10).to_formatted_string(&Locale::en),
        tenths % 10
    )
}

/// Signed percentage, one decimal place.
pub fn signed_pct(value: f64) -> String {
    format!("{value:+.1}%")
}

/// Unsigned percentage, one decimal place.
pub fn pct(value: f64) -> String {
    format!("{value:.1}%")
}
