//! Wall-clock source for timestamps written to the session record.
//!
//! Timers run on Tokio's monotonic clock, but the persisted record holds
//! epoch milliseconds so that it still means something after a reload.
//! [`Clock`] is the seam between the two.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use examdesk_protocol::EpochMillis;

/// Produces the current wall-clock time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> EpochMillis;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> EpochMillis {
        (**self).now()
    }
}

/// The operating system's wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> EpochMillis {
        // A clock set before 1970 reads as the epoch, which the evaluator
        // treats as "long ago" (expired): fail closed.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| EpochMillis(i64::try_from(d.as_millis()).unwrap_or(i64::MAX)))
            .unwrap_or(EpochMillis::ZERO)
    }
}

/// A wall clock derived from Tokio's clock: a fixed epoch anchor plus the
/// Tokio time elapsed since the clock was created.
///
/// Under `#[tokio::test(start_paused = true)]` this moves only when the
/// test advances time, so timestamps and timers stay in lockstep.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    anchor: EpochMillis,
    origin: tokio::time::Instant,
}

impl TokioClock {
    /// Anchored at the current system time.
    pub fn new() -> Self {
        Self::anchored_at(SystemClock.now())
    }

    /// Anchored at an explicit epoch timestamp.
    pub fn anchored_at(anchor: EpochMillis) -> Self {
        Self {
            anchor,
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> EpochMillis {
        self.anchor.saturating_add(self.origin.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now() > EpochMillis(1_577_836_800_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_follows_paused_time() {
        let clock = TokioClock::anchored_at(EpochMillis(1_000));
        assert_eq!(clock.now(), EpochMillis(1_000));

        tokio::time::advance(Duration::from_secs(90)).await;

        assert_eq!(clock.now(), EpochMillis(91_000));
    }
}
