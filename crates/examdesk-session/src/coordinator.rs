//! Lifecycle coordinator: the background task that detects expiry.
//!
//! Two independent triggers feed one idempotent transition:
//!
//! - the **single-shot inactivity timer** ([`DeadlineTimer`]), armed for
//!   the full timeout and pushed back by every activity event;
//! - the **periodic background check** ([`TickScheduler`]), which
//!   re-reads the *persisted* last-activity timestamp on a fixed cadence.
//!
//! The periodic check is what catches expiry across reloads, reopened
//! tabs, and throttled or suspended timers: the single-shot timer only
//! knows about activity this process has seen. Whichever trigger fires
//! first calls [`SessionManager::expire`]; the other one, if it fires at
//! all, finds the session already expired and does nothing.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use examdesk_tick::{DeadlineTimer, TickConfig, TickScheduler};

use crate::{ExpiryReason, SessionManager, WeakSessionManager};

/// Handle to a running coordinator task.
///
/// [`stop`](Self::stop) is idempotent and also runs on drop.
pub struct CoordinatorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl CoordinatorHandle {
    /// Asks the task to stop. Both timers are abandoned at the task's
    /// next wake-up, which is immediate.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    /// Returns `true` once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for CoordinatorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawns the coordinator for `manager`. Must be called inside a Tokio
/// runtime.
pub(crate) fn start(manager: &SessionManager, inactivity: DeadlineTimer) -> CoordinatorHandle {
    let check = TickScheduler::new(TickConfig::every(manager.config().activity_check_interval));
    let (shutdown, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(run(manager.downgrade(), inactivity, check, shutdown_rx));
    CoordinatorHandle { shutdown, task }
}

async fn run(
    manager: WeakSessionManager,
    mut inactivity: DeadlineTimer,
    mut check: TickScheduler,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::debug!("lifecycle coordinator started");

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        tokio::select! {
            // Shutdown wins ties so a stopped coordinator never expires.
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = inactivity.expired() => {
                if let Some(manager) = manager.upgrade() {
                    manager.expire(ExpiryReason::InactivityTimer);
                }
                break;
            }
            tick = check.wait_for_tick() => {
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                let expiry = manager.evaluate();
                if !expiry.is_valid {
                    manager.expire(ExpiryReason::PeriodicCheck);
                    break;
                }
                tracing::trace!(
                    tick = tick.tick,
                    skipped = tick.ticks_skipped,
                    remaining_ms = expiry.time_until_expiry_ms,
                    "background session check passed"
                );
            }
        }
    }

    tracing::debug!("lifecycle coordinator stopped");
}
