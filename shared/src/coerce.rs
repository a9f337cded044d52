//! Safe coercion for loosely-shaped source records.
//!
//! Purchase line items are stored as JSON documents and legacy ledger rows
//! carry free-text expiry dates, so every numeric or date value read from
//! them goes through these helpers. Malformed data degrades to a safe
//! default instead of failing the request: the stock views feed advisory
//! alerts and must never crash on a dirty row.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde_json::Value;

/// Read an integer quantity from a JSON value.
///
/// Accepts integers, floats (truncated) and numeric strings; anything else
/// coerces to `default`.
pub fn coerce_i64(value: Option<&Value>, default: i64) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                default
            } else {
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
                    .unwrap_or(default)
            }
        }
        _ => default,
    }
}

/// Read a decimal amount from a JSON value.
///
/// Accepts numbers and numeric strings; anything else coerces to zero.
pub fn coerce_decimal(value: Option<&Value>) -> Decimal {
    match value {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Decimal::from(i)
            } else {
                n.as_f64()
                    .and_then(Decimal::from_f64_retain)
                    .unwrap_or(Decimal::ZERO)
            }
        }
        Some(Value::String(s)) => s.trim().parse::<Decimal>().unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

/// Read a trimmed string from a JSON value; non-strings coerce to empty.
pub fn coerce_trimmed(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        _ => String::new(),
    }
}

/// Read an optional non-empty string from a JSON value.
pub fn coerce_non_empty(value: Option<&Value>) -> Option<String> {
    let s = coerce_trimmed(value);
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Parse an expiry date leniently.
///
/// Source records mix plain `YYYY-MM-DD` dates with full ISO timestamps
/// (sometimes `Z`-suffixed). Returns `None` for anything unparseable.
pub fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    let head = if trimmed.len() > 10 {
        &trimmed[..10]
    } else {
        trimmed
    };
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Expiry used for FEFO ordering: missing or unparseable dates sort last,
/// as "furthest from expiring".
pub fn expiry_or_far_future(raw: Option<&str>) -> NaiveDate {
    raw.and_then(parse_expiry).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_i64_accepts_numbers_and_strings() {
        assert_eq!(coerce_i64(Some(&json!(7)), 0), 7);
        assert_eq!(coerce_i64(Some(&json!(7.9)), 0), 7);
        assert_eq!(coerce_i64(Some(&json!("12")), 0), 12);
        assert_eq!(coerce_i64(Some(&json!("3.5")), 0), 3);
    }

    #[test]
    fn test_coerce_i64_defaults_on_garbage() {
        assert_eq!(coerce_i64(Some(&json!("")), 0), 0);
        assert_eq!(coerce_i64(Some(&json!("abc")), 0), 0);
        assert_eq!(coerce_i64(Some(&json!(null)), 0), 0);
        assert_eq!(coerce_i64(None, 5), 5);
    }

    #[test]
    fn test_coerce_decimal_parses_strings() {
        assert_eq!(coerce_decimal(Some(&json!("12.50"))), Decimal::new(1250, 2));
        assert_eq!(coerce_decimal(Some(&json!(null))), Decimal::ZERO);
        assert_eq!(coerce_decimal(Some(&json!("not a price"))), Decimal::ZERO);
    }

    #[test]
    fn test_parse_expiry_plain_date() {
        assert_eq!(
            parse_expiry("2024-06-01"),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
    }

    #[test]
    fn test_parse_expiry_iso_timestamp() {
        assert_eq!(
            parse_expiry("2024-06-01T00:00:00Z"),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert_eq!(
            parse_expiry("2024-06-01T10:30:00+05:30"),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
    }

    #[test]
    fn test_parse_expiry_garbage_is_none() {
        assert_eq!(parse_expiry(""), None);
        assert_eq!(parse_expiry("   "), None);
        assert_eq!(parse_expiry("next year"), None);
    }

    #[test]
    fn test_missing_expiry_sorts_last() {
        let dated = expiry_or_far_future(Some("2025-01-01"));
        let missing = expiry_or_far_future(None);
        let garbage = expiry_or_far_future(Some("??"));
        assert!(dated < missing);
        assert_eq!(missing, garbage);
    }
}
