//! Expiry evaluation: a pure function of (now, token, last activity, timeout).
//!
//! No I/O, no clock reads, no side effects. Both background timers and
//! every accessor funnel through [`evaluate`], so there is exactly one
//! definition of "valid" in the crate.

use std::time::Duration;

use examdesk_protocol::EpochMillis;

/// The outcome of evaluating a session at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    /// Whether the session may still be used.
    pub is_valid: bool,
    /// `timeout - (now - last_activity)` in milliseconds. Negative once
    /// the session has expired.
    pub time_until_expiry_ms: i64,
}

impl Expiry {
    /// Whole minutes left, rounded down (toward negative infinity, so
    /// half a minute overdue is `-1`, not `0`).
    pub fn minutes_remaining(&self) -> i64 {
        self.time_until_expiry_ms.div_euclid(60_000)
    }

    /// Time left as a `Duration`, or `None` once nothing is left.
    pub fn remaining(&self) -> Option<Duration> {
        u64::try_from(self.time_until_expiry_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

/// Decides whether a session is still valid.
///
/// - No token → invalid, however recent the activity.
/// - No recorded activity → invalid. The missing timestamp is treated as
///   the epoch itself, so `time_until_expiry_ms` is hugely negative.
/// - `now - last_activity > timeout` → invalid.
/// - Otherwise valid. Exactly `timeout` of inactivity is still valid.
pub fn evaluate(
    now: EpochMillis,
    has_token: bool,
    last_activity: Option<EpochMillis>,
    timeout: Duration,
) -> Expiry {
    let timeout_ms = i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX);
    let idle_ms = now.millis_since(last_activity.unwrap_or(EpochMillis::ZERO));
    let time_until_expiry_ms = timeout_ms.saturating_sub(idle_ms);

    Expiry {
        is_valid: has_token && last_activity.is_some() && idle_ms <= timeout_ms,
        time_until_expiry_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;
    const MIN: i64 = 60_000;
    const TIMEOUT: Duration = Duration::from_secs(30 * 60);

    fn at(offset_ms: i64) -> EpochMillis {
        EpochMillis(T0 + offset_ms)
    }

    #[test]
    fn test_evaluate_fresh_activity_is_valid_with_full_window() {
        let expiry = evaluate(at(0), true, Some(at(0)), TIMEOUT);
        assert!(expiry.is_valid);
        assert_eq!(expiry.time_until_expiry_ms, 30 * MIN);
    }

    #[test]
    fn test_evaluate_exactly_at_timeout_is_still_valid() {
        let expiry = evaluate(at(30 * MIN), true, Some(at(0)), TIMEOUT);
        assert!(expiry.is_valid);
        assert_eq!(expiry.time_until_expiry_ms, 0);
    }

    #[test]
    fn test_evaluate_one_ms_past_timeout_is_invalid() {
        let expiry = evaluate(at(30 * MIN + 1), true, Some(at(0)), TIMEOUT);
        assert!(!expiry.is_valid);
        assert_eq!(expiry.time_until_expiry_ms, -1);
    }

    #[test]
    fn test_evaluate_without_token_is_invalid_even_if_recent() {
        let expiry = evaluate(at(1), false, Some(at(0)), TIMEOUT);
        assert!(!expiry.is_valid);
        // The remaining-time math is still reported.
        assert_eq!(expiry.time_until_expiry_ms, 30 * MIN - 1);
    }

    #[test]
    fn test_evaluate_missing_activity_is_expired() {
        let expiry = evaluate(at(0), true, None, TIMEOUT);
        assert!(!expiry.is_valid);
        assert_eq!(expiry.time_until_expiry_ms, 30 * MIN - T0);
    }

    #[test]
    fn test_evaluate_clock_behind_last_activity_is_valid() {
        // The wall clock stepped backwards; the window only grows.
        let expiry = evaluate(at(0), true, Some(at(5 * MIN)), TIMEOUT);
        assert!(expiry.is_valid);
        assert_eq!(expiry.time_until_expiry_ms, 35 * MIN);
    }

    #[test]
    fn test_minutes_remaining_floors() {
        let minutes = |ms| Expiry { is_valid: true, time_until_expiry_ms: ms }.minutes_remaining();
        assert_eq!(minutes(5 * MIN), 5);
        assert_eq!(minutes(5 * MIN - 1), 4);
        assert_eq!(minutes(59_999), 0);
        assert_eq!(minutes(0), 0);
        assert_eq!(minutes(-1), -1);
    }

    #[test]
    fn test_remaining_is_none_when_exhausted() {
        let expiry = Expiry { is_valid: true, time_until_expiry_ms: 1_500 };
        assert_eq!(expiry.remaining(), Some(Duration::from_millis(1_500)));
        let expiry = Expiry { is_valid: false, time_until_expiry_ms: 0 };
        assert_eq!(expiry.remaining(), None);
    }
}
