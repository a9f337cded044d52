//! Alert derivation tests
//!
//! Tests for low-stock and expiring-soon derivation:
//! - Permission clamping before aggregation
//! - Alert window arithmetic with lenient date parsing
//! - Location name attachment rules

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

/// Lenient expiry parsing: plain dates or ISO timestamps, else nothing.
fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    let head = if trimmed.len() > 10 {
        &trimmed[..10]
    } else {
        trimmed
    };
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Branch visibility for a caller: admins see the requested set, everyone
/// else only their own branch.
fn visible_branches<'a>(
    is_admin: bool,
    own_branch: Option<&'a str>,
    requested: &[&'a str],
) -> Option<Vec<&'a str>> {
    if is_admin {
        return Some(requested.to_vec());
    }
    let own = own_branch?;
    if requested.is_empty() || requested.contains(&own) {
        Some(vec![own])
    } else {
        None
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Plain dates and ISO timestamps both parse
    #[test]
    fn test_lenient_date_parsing() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 1);
        assert_eq!(parse_expiry("2024-06-01"), expected);
        assert_eq!(parse_expiry("2024-06-01T00:00:00Z"), expected);
        assert_eq!(parse_expiry("2024-06-01T10:30:00+05:30"), expected);
    }

    /// Garbage dates never alert
    #[test]
    fn test_garbage_dates_rejected() {
        assert_eq!(parse_expiry(""), None);
        assert_eq!(parse_expiry("unknown"), None);
        assert_eq!(parse_expiry("06/01/2024"), None);
    }

    /// Admins see exactly what they asked for
    #[test]
    fn test_admin_sees_requested_branches() {
        let visible = visible_branches(true, None, &["b1", "b2"]).unwrap();
        assert_eq!(visible, vec!["b1", "b2"]);
    }

    /// Staff with no requested filter default to their own branch
    #[test]
    fn test_staff_defaults_to_own_branch() {
        let visible = visible_branches(false, Some("b1"), &[]).unwrap();
        assert_eq!(visible, vec!["b1"]);
    }

    /// Staff requesting a foreign branch see nothing at all
    #[test]
    fn test_staff_foreign_branch_sees_nothing() {
        assert_eq!(visible_branches(false, Some("b1"), &["b2"]), None);
    }

    /// Staff without an assigned branch see nothing
    #[test]
    fn test_staff_without_branch_sees_nothing() {
        assert_eq!(visible_branches(false, None, &[]), None);
    }

    /// The alert window includes today and the last day of the window
    #[test]
    fn test_window_is_inclusive() {
        let today = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let window_end = today + Duration::days(90);

        let in_window = |raw: &str| {
            parse_expiry(raw).map(|d| today <= d && d <= window_end)
        };

        assert_eq!(in_window("2023-01-01"), Some(true));
        assert_eq!(in_window("2023-04-01"), Some(true));
        assert_eq!(in_window("2023-04-02"), Some(false));
        assert_eq!(in_window("2022-12-31"), Some(false));
        assert_eq!(in_window("someday"), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn date_strategy() -> impl Strategy<Value = NaiveDate> {
        (2000i32..=2100, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
            NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A date formatted and reparsed round-trips
        #[test]
        fn prop_plain_date_roundtrip(date in date_strategy()) {
            let formatted = date.format("%Y-%m-%d").to_string();
            prop_assert_eq!(parse_expiry(&formatted), Some(date));
        }

        /// The window never admits dates in the past
        #[test]
        fn prop_window_excludes_past(
            today in date_strategy(),
            days_ago in 1i64..=1000,
            window in 1i64..=365
        ) {
            let expiry = today - Duration::days(days_ago);
            let window_end = today + Duration::days(window);
            prop_assert!(!(today <= expiry && expiry <= window_end));
        }

        /// Window membership is monotonic in the window size
        #[test]
        fn prop_window_monotonic(
            today in date_strategy(),
            offset in 0i64..=365,
            window in 0i64..=365
        ) {
            let expiry = today + Duration::days(offset);
            let in_small = today <= expiry && expiry <= today + Duration::days(window);
            let in_large = today <= expiry && expiry <= today + Duration::days(window + 30);
            if in_small {
                prop_assert!(in_large);
            }
        }

        /// Non-admin visibility is always a subset of their own branch
        #[test]
        fn prop_staff_never_sees_other_branches(
            requested in prop::collection::vec("[a-z][0-9]", 0..4)
        ) {
            let requested: Vec<&str> = requested.iter().map(String::as_str).collect();
            if let Some(visible) = visible_branches(false, Some("own"), &requested) {
                prop_assert_eq!(visible, vec!["own"]);
            }
        }
    }
}
