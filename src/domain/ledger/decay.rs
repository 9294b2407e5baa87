//! Credit decay calculator.
//!
//! Pure functions, no I/O. Credits are consumed one per interval; the interval
//! shrinks by 10% of a day for each workspace beyond the first, down to a
//! floor of half a day:
//!
//! | workspaces | interval |
//! |-----------:|---------:|
//! | 1          | 24.0 h   |
//! | 2          | 21.6 h   |
//! | 3          | 19.2 h   |
//! | 4          | 16.8 h   |
//! | 5          | 14.4 h   |
//! | 6+         | 12.0 h   |
//!
//! Intervals are computed in whole seconds (`864 * (100 - reduction%)`), so
//! every value above is exact.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Credits removed each time an interval elapses.
pub const CREDITS_PER_INTERVAL: i64 = 1;

/// Interval for a single-workspace owner.
pub const BASE_INTERVAL_HOURS: f64 = 24.0;

/// Shortest possible interval.
pub const MIN_INTERVAL_HOURS: f64 = 12.0;

const REDUCTION_PER_WORKSPACE_PCT: u32 = 10;
const MAX_REDUCTION_PCT: u32 = 50;
const SECONDS_PER_DAY_PERCENT: i64 = 864;

/// Percentage of the base interval that is retained for `workspace_count`.
///
/// A count of zero is treated as one.
fn retained_pct(workspace_count: u32) -> i64 {
    let extra = workspace_count.max(1) - 1;
    let reduction = extra
        .saturating_mul(REDUCTION_PER_WORKSPACE_PCT)
        .min(MAX_REDUCTION_PCT);
    i64::from(100 - reduction)
}

/// Seconds between consumptions.
pub fn interval_secs(workspace_count: u32) -> i64 {
    SECONDS_PER_DAY_PERCENT * retained_pct(workspace_count)
}

/// Time between consumptions as a chrono duration.
pub fn interval(workspace_count: u32) -> Duration {
    Duration::seconds(interval_secs(workspace_count))
}

/// `24 * (1 - min((n-1) * 0.10, 0.50))`.
pub fn interval_hours(workspace_count: u32) -> f64 {
    interval_secs(workspace_count) as f64 / 3600.0
}

/// True once a full interval has elapsed since `last_consumption` at `now`.
pub fn should_consume_at(last_consumption: Timestamp, workspace_count: u32, now: Timestamp) -> bool {
    now >= last_consumption.plus(interval(workspace_count))
}

/// [`should_consume_at`] against the wall clock.
pub fn should_consume(last_consumption: Timestamp, workspace_count: u32) -> bool {
    should_consume_at(last_consumption, workspace_count, Timestamp::now())
}

/// Whole days the balance lasts: `floor(balance / (24 / interval_hours))`.
///
/// Computed as `floor(balance * retained% / 100)`, which is the same quantity
/// without floating point.
pub fn days_remaining(balance: i64, workspace_count: u32) -> i64 {
    if balance <= 0 {
        return 0;
    }
    let days = i128::from(balance) * i128::from(retained_pct(workspace_count)) / 100;
    days as i64
}

/// Coarse balance health, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditStatusLevel {
    High,
    Medium,
    Low,
    Critical,
}

impl CreditStatusLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatusLevel::High => "high",
            CreditStatusLevel::Medium => "medium",
            CreditStatusLevel::Low => "low",
            CreditStatusLevel::Critical => "critical",
        }
    }
}

/// `high` (>30 days), `medium` (>7), `low` (>0), `critical` otherwise.
pub fn status_level(days_remaining: i64) -> CreditStatusLevel {
    match days_remaining {
        d if d > 30 => CreditStatusLevel::High,
        d if d > 7 => CreditStatusLevel::Medium,
        d if d > 0 => CreditStatusLevel::Low,
        _ => CreditStatusLevel::Critical,
    }
}

/// Everything the calculator can say about one balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecayProjection {
    pub interval_hours: f64,
    pub days_remaining: i64,
    pub status_level: CreditStatusLevel,
}

impl DecayProjection {
    pub fn for_balance(balance: i64, workspace_count: u32) -> Self {
        let days = days_remaining(balance, workspace_count);
        Self {
            interval_hours: interval_hours(workspace_count),
            days_remaining: days,
            status_level: status_level(days),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ══════════════════════════════════════════════════════════════
    // Interval Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn interval_hours_matches_published_table() {
        assert_eq!(interval_hours(1), 24.0);
        assert_eq!(interval_hours(2), 21.6);
        assert_eq!(interval_hours(3), 19.2);
        assert_eq!(interval_hours(4), 16.8);
        assert_eq!(interval_hours(5), 14.4);
        assert_eq!(interval_hours(6), 12.0);
        assert_eq!(interval_hours(10), 12.0);
    }

    #[test]
    fn zero_workspaces_is_treated_as_one() {
        assert_eq!(interval_hours(0), interval_hours(1));
    }

    #[test]
    fn huge_workspace_count_stays_at_floor() {
        assert_eq!(interval_hours(u32::MAX), MIN_INTERVAL_HOURS);
    }

    // ══════════════════════════════════════════════════════════════
    // Consumption Decision Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn should_consume_false_right_after_consumption() {
        let last = Timestamp::from_unix_secs(1_704_067_200).unwrap();
        assert!(!should_consume_at(last, 1, last));
    }

    #[test]
    fn two_workspaces_not_due_after_20_hours() {
        let last = Timestamp::from_unix_secs(1_704_067_200).unwrap();
        assert!(!should_consume_at(last, 2, last.plus_hours(20)));
    }

    #[test]
    fn two_workspaces_due_after_22_hours() {
        let last = Timestamp::from_unix_secs(1_704_067_200).unwrap();
        assert!(should_consume_at(last, 2, last.plus_hours(22)));
    }

    #[test]
    fn due_exactly_at_interval_boundary() {
        let last = Timestamp::from_unix_secs(1_704_067_200).unwrap();
        let boundary = last.plus_secs(interval_secs(3));
        assert!(should_consume_at(last, 3, boundary));
        assert!(!should_consume_at(last, 3, boundary.plus_secs(-1)));
    }

    #[test]
    fn should_consume_uses_wall_clock() {
        assert!(should_consume(Timestamp::now().minus_hours(25), 1));
        assert!(!should_consume(Timestamp::now(), 1));
    }

    // ══════════════════════════════════════════════════════════════
    // Days Remaining Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn days_remaining_examples() {
        assert_eq!(days_remaining(150, 1), 150);
        assert_eq!(days_remaining(150, 2), 135);
        assert_eq!(days_remaining(150, 6), 75);
        assert_eq!(days_remaining(1, 6), 0);
    }

    #[test]
    fn days_remaining_zero_balance_is_zero() {
        for n in 0..20 {
            assert_eq!(days_remaining(0, n), 0);
        }
    }

    #[test]
    fn days_remaining_negative_balance_is_zero() {
        assert_eq!(days_remaining(-10, 1), 0);
    }

    // ══════════════════════════════════════════════════════════════
    // Status Level Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn status_level_thresholds() {
        assert_eq!(status_level(31), CreditStatusLevel::High);
        assert_eq!(status_level(30), CreditStatusLevel::Medium);
        assert_eq!(status_level(8), CreditStatusLevel::Medium);
        assert_eq!(status_level(7), CreditStatusLevel::Low);
        assert_eq!(status_level(1), CreditStatusLevel::Low);
        assert_eq!(status_level(0), CreditStatusLevel::Critical);
    }

    #[test]
    fn projection_combines_calculations() {
        let projection = DecayProjection::for_balance(20, 6);
        assert_eq!(projection.interval_hours, 12.0);
        assert_eq!(projection.days_remaining, 10);
        assert_eq!(projection.status_level, CreditStatusLevel::Medium);
    }

    // ══════════════════════════════════════════════════════════════
    // Properties
    // ══════════════════════════════════════════════════════════════

    proptest! {
        #[test]
        fn interval_is_bounded(n in 0u32..10_000) {
            let hours = interval_hours(n);
            prop_assert!((MIN_INTERVAL_HOURS..=BASE_INTERVAL_HOURS).contains(&hours));
        }

        #[test]
        fn interval_is_non_increasing(n in 1u32..10_000) {
            prop_assert!(interval_hours(n + 1) <= interval_hours(n));
        }

        #[test]
        fn days_remaining_never_exceeds_balance(balance in 0i64..1_000_000, n in 1u32..50) {
            let days = days_remaining(balance, n);
            prop_assert!(days >= 0);
            prop_assert!(days <= balance);
        }

        #[test]
        fn days_remaining_grows_with_balance(balance in 0i64..1_000_000, n in 1u32..50) {
            prop_assert!(days_remaining(balance + 1, n) >= days_remaining(balance, n));
        }
    }
}
