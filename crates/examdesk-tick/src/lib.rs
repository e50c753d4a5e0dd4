//! Timers for the Examdesk session core.
//!
//! Two kinds of timer drive session expiry:
//!
//! - [`TickScheduler`]: a fixed-cadence periodic timer (the background
//!   validity check, the warning poll). A wake-up that arrives late
//!   restarts the cadence instead of firing a burst.
//! - [`Deadline`] / [`DeadlineTimer`]: a single-shot timer that can be
//!   re-armed synchronously from anywhere (the inactivity timer, pushed
//!   back by every activity event).
//!
//! # Integration
//!
//! Both are designed to sit inside one `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = shutdown.changed() => break,
//!         _ = inactivity.expired() => { expire(); break; }
//!         _ = check.wait_for_tick() => { if !still_valid() { expire(); break; } }
//!     }
//! }
//! ```
//!
//! Both `wait_for_tick` and `expired` are cancel-safe: losing a `select!`
//! race does not lose the schedule.

mod deadline;

pub use deadline::{Deadline, DeadlineTimer};

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Full configuration for a [`TickScheduler`].
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks.
    pub period: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(60),
        }
    }
}

impl TickConfig {
    /// Shortest period accepted. Anything faster is a busy loop.
    pub const MIN_PERIOD: Duration = Duration::from_millis(10);

    /// Create a config for a specific period.
    pub fn every(period: Duration) -> Self {
        Self { period }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.period < Self::MIN_PERIOD {
            warn!(
                period_ms = self.period.as_millis() as u64,
                min_ms = Self::MIN_PERIOD.as_millis() as u64,
                "tick period below minimum; clamping"
            );
            self.period = Self::MIN_PERIOD;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info (returned to caller each tick)
// ---------------------------------------------------------------------------

/// Information about a fired tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// How far past its scheduled instant this tick actually fired.
    pub late_by: Duration,
    /// Whole periods that elapsed without a tick (0 in normal operation).
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-cadence periodic timer.
///
/// Browsers throttle timers in background tabs and laptops sleep, so a
/// "every 60 seconds" timer can wake up minutes late. A late tick fires
/// once and the next one is scheduled a full period after it; the missed
/// ticks are reported in [`TickInfo::ticks_skipped`], never replayed.
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    /// When the next tick should fire.
    next_tick: Instant,
}

impl TickScheduler {
    /// Create a new scheduler. The first tick fires one period from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let next_tick = Instant::now() + config.period;

        debug!(period_ms = config.period.as_millis() as u64, "tick scheduler created");

        Self {
            config,
            tick_count: 0,
            next_tick,
        }
    }

    /// Create a scheduler for a specific period.
    pub fn every(period: Duration) -> Self {
        Self::new(TickConfig::every(period))
    }

    /// Wait until the next tick is due.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let scheduled = self.next_tick;
        let period = self.config.period;
        time::sleep_until(scheduled).await;

        let now = Instant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(scheduled);
        let ticks_skipped = (late_by.as_nanos() / period.as_nanos()) as u64;
        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped = ticks_skipped,
                late_ms = late_by.as_millis() as u64,
                "tick fired late; skipping ahead"
            );
        }
        self.next_tick = now + period;

        trace!(tick = self.tick_count, late_ms = late_by.as_millis() as u64, "tick fired");

        TickInfo {
            tick: self.tick_count,
            late_by,
            ticks_skipped,
        }
    }

    /// Number of ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The configured period.
    pub fn period(&self) -> Duration {
        self.config.period
    }

    /// When the next tick is scheduled.
    pub fn next_tick(&self) -> Instant {
        self.next_tick
    }
}
