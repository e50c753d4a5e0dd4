//! Integration tests for the periodic tick scheduler.
//!
//! `start_paused = true` makes time deterministic: the runtime jumps the
//! clock forward whenever every task is idle, so a one-minute background
//! check resolves instantly.

use std::time::Duration;

use examdesk_tick::{Deadline, TickConfig, TickScheduler};
use tokio::time::{Instant, advance};

const CHECK_INTERVAL: Duration = Duration::from_secs(60);
const WARNING_POLL: Duration = Duration::from_secs(30);

fn background_check() -> TickConfig {
    TickConfig::every(CHECK_INTERVAL)
}

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_matches_background_check() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.period, CHECK_INTERVAL);
}

#[test]
fn test_zero_period_is_clamped_to_minimum() {
    let cfg = TickConfig::every(Duration::ZERO).validated();
    assert_eq!(cfg.period, TickConfig::MIN_PERIOD);

    let ok = TickConfig::every(WARNING_POLL).validated();
    assert_eq!(ok.period, WARNING_POLL);
}

// =========================================================================
// Cadence
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_first_check_runs_one_interval_after_start() {
    let started = Instant::now();
    let mut check = TickScheduler::new(background_check());

    let info = check.wait_for_tick().await;

    assert_eq!((info.tick, info.ticks_skipped), (1, 0));
    assert_eq!(info.late_by, Duration::ZERO);
    assert_eq!(started.elapsed(), CHECK_INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn test_warning_poll_fires_twice_a_minute() {
    let started = Instant::now();
    let mut poll = TickScheduler::every(WARNING_POLL);

    let mut seen = Vec::new();
    while started.elapsed() < Duration::from_secs(150) {
        seen.push(poll.wait_for_tick().await.tick);
    }

    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    assert_eq!(poll.tick_count(), 5);
    assert_eq!(poll.period(), WARNING_POLL);
}

// =========================================================================
// Throttled timers
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_throttled_check_reports_skipped_ticks_and_restarts_cadence() {
    let mut check = TickScheduler::new(background_check());

    // A backgrounded tab: nothing polls the check for 4m20s.
    advance(Duration::from_secs(260)).await;
    let woke = Instant::now();

    let info = check.wait_for_tick().await;

    assert_eq!(info.late_by, Duration::from_secs(200));
    assert_eq!(info.ticks_skipped, 3);
    assert_eq!(check.next_tick(), woke + CHECK_INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn test_late_tick_is_followed_by_a_normal_one() {
    let mut check = TickScheduler::new(background_check());

    advance(Duration::from_secs(150)).await;
    let late = check.wait_for_tick().await;
    assert_eq!(late.ticks_skipped, 1);

    let woke = Instant::now();
    let next = check.wait_for_tick().await;
    assert_eq!((next.tick, next.ticks_skipped), (2, 0));
    assert_eq!(woke.elapsed(), CHECK_INTERVAL);
}

// =========================================================================
// Alongside a deadline in one select! loop
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_deadline_and_check_share_one_loop() {
    let started = Instant::now();
    let deadline = Deadline::new();
    deadline.arm_in(Duration::from_secs(5 * 60 + 30));
    let mut timer = deadline.timer();
    let mut check = TickScheduler::new(background_check());

    let mut checks = 0;
    loop {
        tokio::select! {
            biased;

            _ = timer.expired() => break,
            _ = check.wait_for_tick() => checks += 1,
        }
    }

    assert_eq!(checks, 5);
    assert_eq!(started.elapsed(), Duration::from_secs(330));
}
