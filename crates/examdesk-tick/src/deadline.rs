//! Rearmable single-shot timer.
//!
//! The arm side ([`Deadline`]) is synchronous and cheap to clone, so an
//! event listener can push the deadline back without awaiting anything.
//! The wait side ([`DeadlineTimer`]) lives in the task that reacts when
//! the deadline passes.
//!
//! Under the hood this is a `tokio::sync::watch` channel holding
//! `Option<Instant>`: `Some(at)` is armed, `None` is disarmed. A watch
//! channel only keeps the latest value, which is exactly the semantics
//! of re-arming: older deadlines are simply overwritten.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant};

/// The arm/disarm side of a single-shot timer.
#[derive(Debug, Clone)]
pub struct Deadline {
    tx: Arc<watch::Sender<Option<Instant>>>,
}

impl Deadline {
    /// Creates a disarmed deadline.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Arms (or re-arms) the timer to fire `after` from now.
    pub fn arm_in(&self, after: Duration) -> Instant {
        let at = Instant::now() + after;
        self.arm_at(at);
        at
    }

    /// Arms (or re-arms) the timer to fire at `at`.
    pub fn arm_at(&self, at: Instant) {
        // `send_replace` succeeds even when no timer is listening yet.
        self.tx.send_replace(Some(at));
    }

    /// Disarms the timer. A waiting [`DeadlineTimer`] pends until re-armed.
    pub fn disarm(&self) {
        self.tx.send_replace(None);
    }

    /// The currently armed instant, if any.
    pub fn armed_at(&self) -> Option<Instant> {
        *self.tx.borrow()
    }

    /// Creates a waiting side observing this deadline.
    pub fn timer(&self) -> DeadlineTimer {
        DeadlineTimer {
            rx: self.tx.subscribe(),
            fired: None,
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::new()
    }
}

/// The waiting side of a single-shot timer.
pub struct DeadlineTimer {
    rx: watch::Receiver<Option<Instant>>,
    /// The arming this timer already reported, so it is not reported twice.
    fired: Option<Instant>,
}

impl DeadlineTimer {
    /// Resolves once the armed deadline passes without being re-armed.
    ///
    /// Returns the instant that fired. Re-arming while this future is
    /// pending moves the wake-up; disarming makes it pend. Each arming
    /// is reported at most once. If every [`Deadline`] handle is dropped
    /// the timer pends forever.
    pub async fn expired(&mut self) -> Instant {
        loop {
            let armed = (*self.rx.borrow_and_update()).filter(|at| Some(*at) != self.fired);

            match armed {
                Some(at) => {
                    tokio::select! {
                        _ = time::sleep_until(at) => {
                            // A re-arm may have landed in the same instant.
                            if *self.rx.borrow() == Some(at) {
                                self.fired = Some(at);
                                return at;
                            }
                        }
                        changed = self.rx.changed() => {
                            if changed.is_err() {
                                std::future::pending::<()>().await;
                            }
                        }
                    }
                }
                None => {
                    if self.rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
            }
        }
    }
}
