//! Tolerant field readers for the hand-edited watchlist document.
//!
//! Cache fields were written by several generations of scripts, so a price
//! may show up as `1234.5`, `"1234.5"`, `"1,234.5"` or `"N/A"`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Number or numeric string → `Some`; null, missing or garbage → `None`.
pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

/// String as-is, numbers stringified, anything else → `None`.
pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn number_from_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "number")]
        n: Option<f64>,
        #[serde(default, deserialize_with = "text")]
        t: Option<String>,
    }

    fn fields(v: Value) -> Fields {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn numbers_and_numeric_strings() {
        assert_eq!(fields(json!({ "n": 12.5 })).n, Some(12.5));
        assert_eq!(fields(json!({ "n": "1,234.5" })).n, Some(1234.5));
        assert_eq!(fields(json!({ "n": " 42 " })).n, Some(42.0));
    }

    #[test]
    fn garbage_reads_as_absent() {
        assert_eq!(fields(json!({ "n": "N/A" })).n, None);
        assert_eq!(fields(json!({ "n": null })).n, None);
        assert_eq!(fields(json!({ "n": [1] })).n, None);
        assert_eq!(fields(json!({})).n, None);
    }

    #[test]
    fn text_accepts_numbers() {
        assert_eq!(fields(json!({ "t": "Technology" })).t.as_deref(), Some("Technology"));
        assert_eq!(fields(json!({ "t": 3 })).t.as_deref(), Some("3"));
        assert_eq!(fields(json!({ "t": "" })).t, None);
    }
}
