//! Session-expiry warning: tells the UI when the end is near.
//!
//! The presenter polls the manager on `warning_poll_interval` and
//! publishes a [`WarningState`] over a `watch` channel. The UI renders
//! whatever the latest state is; it never computes remaining time itself.
//!
//! Rules, with `t` = time remaining and `m` = `t` in whole minutes
//! (rounded down, display only):
//!
//! | condition                             | result                       |
//! |---------------------------------------|------------------------------|
//! | `t <= 0`                              | hide, expire the session     |
//! | valid and `0 < t < warning_threshold` | show "`m` minutes remaining" |
//! | otherwise                             | hide                         |
//!
//! The decision is made on milliseconds, so sub-minute timeouts and
//! thresholds behave the same way as the default 30/5 minutes. In the
//! final minute the warning shows `m = 0`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use examdesk_tick::TickScheduler;

use crate::{Expiry, ExpiryReason, SessionError, SessionManager, WeakSessionManager};

/// What the warning UI should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WarningState {
    #[default]
    Hidden,
    Visible { minutes_remaining: i64 },
}

impl WarningState {
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Visible { .. })
    }
}

/// One poll's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningDecision {
    Show(i64),
    Hide,
    Logout,
}

/// Spawns and configures the warning poller.
pub struct WarningPresenter;

impl WarningPresenter {
    /// Starts polling `manager`. The first poll happens one
    /// `warning_poll_interval` from now.
    ///
    /// # Errors
    /// [`SessionError::NoRuntime`] outside a Tokio runtime.
    pub fn spawn(manager: &SessionManager) -> Result<WarningHandle, SessionError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(SessionError::NoRuntime);
        }

        let config = manager.config();
        let threshold = config.warning_threshold;
        let poll = TickScheduler::every(config.warning_poll_interval);
        let (state, _) = watch::channel(WarningState::Hidden);
        let state = Arc::new(state);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(run(
            manager.downgrade(),
            poll,
            threshold,
            Arc::clone(&state),
            shutdown_rx,
        ));

        Ok(WarningHandle {
            manager: manager.downgrade(),
            state,
            shutdown,
            task,
        })
    }

    /// Applies the warning rules to one evaluation.
    pub fn assess(expiry: &Expiry, threshold: Duration) -> WarningDecision {
        let remaining_ms = expiry.time_until_expiry_ms;
        let threshold_ms = i64::try_from(threshold.as_millis()).unwrap_or(i64::MAX);
        if remaining_ms <= 0 {
            WarningDecision::Logout
        } else if expiry.is_valid && remaining_ms < threshold_ms {
            WarningDecision::Show(expiry.minutes_remaining())
        } else {
            WarningDecision::Hide
        }
    }
}

async fn run(
    manager: WeakSessionManager,
    mut poll: TickScheduler,
    threshold: Duration,
    state: Arc<watch::Sender<WarningState>>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = poll.wait_for_tick() => {
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                let expiry = manager.evaluate();
                match WarningPresenter::assess(&expiry, threshold) {
                    WarningDecision::Show(minutes_remaining) => {
                        let next = WarningState::Visible { minutes_remaining };
                        let changed = state.send_if_modified(|current| {
                            let changed = *current != next;
                            *current = next;
                            changed
                        });
                        if changed {
                            tracing::info!(minutes_remaining, "session expiry warning shown");
                        }
                    }
                    WarningDecision::Hide => {
                        state.send_if_modified(|current| {
                            std::mem::replace(current, WarningState::Hidden).is_visible()
                        });
                    }
                    WarningDecision::Logout => {
                        state.send_replace(WarningState::Hidden);
                        manager.expire(ExpiryReason::WarningCountdown);
                        break;
                    }
                }
            }
        }
    }

    tracing::debug!("warning presenter stopped");
}

/// Handle to a running warning presenter.
///
/// Dropping it stops the poller.
pub struct WarningHandle {
    manager: WeakSessionManager,
    state: Arc<watch::Sender<WarningState>>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WarningHandle {
    /// The state the UI should currently show.
    pub fn state(&self) -> WarningState {
        *self.state.borrow()
    }

    /// A receiver that wakes on every state change.
    pub fn subscribe(&self) -> watch::Receiver<WarningState> {
        self.state.subscribe()
    }

    /// "Stay logged in": hides the warning. Only real activity extends the
    /// session, so if nothing else happens the next poll shows it again.
    pub fn stay_logged_in(&self) {
        self.state.send_replace(WarningState::Hidden);
    }

    /// "Log out now": hides the warning and expires the session.
    ///
    /// Returns `true` if this call ended the session.
    pub fn logout_now(&self) -> bool {
        self.state.send_replace(WarningState::Hidden);
        self.stop();
        self.manager
            .upgrade()
            .is_some_and(|manager| manager.expire(ExpiryReason::UserRequested))
    }

    /// Stops polling. Idempotent.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    /// Returns `true` once the poller has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for WarningHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
