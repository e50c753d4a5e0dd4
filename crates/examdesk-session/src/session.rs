//! Session types: configuration, lifecycle phases, and the info snapshot.
//!
//! A "session" is the period during which a previously issued token is
//! treated as usable, bounded by an inactivity timeout that slides
//! forward with every user interaction.

use std::fmt;
use std::time::Duration;

use examdesk_protocol::EpochMillis;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Inactivity allowed before a session expires (30 minutes).
pub const SESSION_TIMEOUT: Duration = Duration::from_millis(1_800_000);

/// Cadence of the background validity check.
pub const ACTIVITY_CHECK_INTERVAL: Duration = Duration::from_millis(60_000);

/// The warning appears once less than this much time remains.
pub const WARNING_THRESHOLD: Duration = Duration::from_secs(5 * 60);

/// Cadence of the warning poll.
pub const WARNING_POLL_INTERVAL: Duration = Duration::from_millis(30_000);

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Timeouts and cadences for the session lifecycle.
///
/// `Default` gives the values the web client ships with. Every duration
/// is independently configurable; in particular the warning poll is not
/// tied to the background check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sliding inactivity window.
    pub session_timeout: Duration,

    /// How often the background check re-reads the persisted
    /// last-activity timestamp.
    pub activity_check_interval: Duration,

    /// Remaining time below which the warning is shown.
    pub warning_threshold: Duration,

    /// How often the warning presenter recomputes the remaining time.
    pub warning_poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_timeout: SESSION_TIMEOUT,
            activity_check_interval: ACTIVITY_CHECK_INTERVAL,
            warning_threshold: WARNING_THRESHOLD,
            warning_poll_interval: WARNING_POLL_INTERVAL,
        }
    }
}

impl SessionConfig {
    /// Fix any out-of-range values so the config is safe to use.
    ///
    /// Rules:
    /// - zero durations fall back to their defaults;
    /// - `warning_threshold` is capped at `session_timeout`.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        for (name, value, default) in [
            (
                "session_timeout",
                &mut self.session_timeout,
                defaults.session_timeout,
            ),
            (
                "activity_check_interval",
                &mut self.activity_check_interval,
                defaults.activity_check_interval,
            ),
            (
                "warning_poll_interval",
                &mut self.warning_poll_interval,
                defaults.warning_poll_interval,
            ),
        ] {
            if value.is_zero() {
                tracing::warn!(field = name, "zero duration in session config; using default");
                *value = default;
            }
        }
        if self.warning_threshold > self.session_timeout {
            tracing::warn!(
                threshold_ms = self.warning_threshold.as_millis() as u64,
                timeout_ms = self.session_timeout.as_millis() as u64,
                "warning threshold exceeds session timeout; capping"
            );
            self.warning_threshold = self.session_timeout;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// LifecyclePhase
// ---------------------------------------------------------------------------

/// Where a [`SessionManager`](crate::SessionManager) is in its lifecycle.
///
/// ```text
///            establish()          init_activity_tracking()
///  (start) ──────────────→ Idle ───────────────────────────→ Active
///                           ↑  ←──────── teardown ─────────    │
///                           │                                  │ expire()
///                           │                                  ▼
///                           │                              Expiring
///                           │                                  │
///                           │          establish()             ▼
///                           └──────────────────────────────  Expired
///
///  logout() from any phase ──→ LoggedOut ──(establish)──→ Idle
/// ```
///
/// Only `Idle` and `Active` can expire. Every later call to `expire()`
/// sees `Expiring`/`Expired`/`LoggedOut` and does nothing, which is what
/// makes two racing timers safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// A session may exist but nothing is tracking it.
    Idle,
    /// Timers and activity listeners are running.
    Active,
    /// Expiry is in progress (timers stopping, record being cleared).
    Expiring,
    /// Expiry finished; the callback has been invoked.
    Expired,
    /// Explicit logout.
    LoggedOut,
}

impl LifecyclePhase {
    /// Returns `true` if `expire()` would perform the transition.
    pub fn can_expire(self) -> bool {
        matches!(self, Self::Idle | Self::Active)
    }

    /// Returns `true` if activity events should be recorded.
    pub fn accepts_activity(self) -> bool {
        matches!(self, Self::Idle | Self::Active)
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Active => write!(f, "Active"),
            Self::Expiring => write!(f, "Expiring"),
            Self::Expired => write!(f, "Expired"),
            Self::LoggedOut => write!(f, "LoggedOut"),
        }
    }
}

// ---------------------------------------------------------------------------
// ExpiryReason
// ---------------------------------------------------------------------------

/// Which trigger ended the session. Passed to the expiry callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// The single-shot inactivity timer fired.
    InactivityTimer,
    /// The periodic background check found the persisted timestamp stale.
    PeriodicCheck,
    /// The warning countdown reached zero.
    WarningCountdown,
    /// The user chose "log out now" from the warning.
    UserRequested,
}

impl fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InactivityTimer => write!(f, "inactivity timer"),
            Self::PeriodicCheck => write!(f, "periodic check"),
            Self::WarningCountdown => write!(f, "warning countdown"),
            Self::UserRequested => write!(f, "user requested"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionInfo
// ---------------------------------------------------------------------------

/// A snapshot of the session for display and diagnostics.
///
/// Serializes in camelCase (`isValid`, `timeUntilExpiry`, ...) so it can
/// be handed to a JavaScript front end as-is. Durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub is_valid: bool,
    pub login_time: Option<EpochMillis>,
    pub last_activity: Option<EpochMillis>,
    /// May be negative once expired.
    pub time_until_expiry: i64,
    pub session_timeout: u64,
}
