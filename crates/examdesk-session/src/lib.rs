//! Session lifecycle management for Examdesk.
//!
//! This crate decides when an authenticated session has gone stale:
//!
//! 1. **Expiry evaluation**: a pure function of (now, last activity,
//!    timeout) ([`evaluate`])
//! 2. **Activity tracking**: every qualifying user interaction stamps
//!    "last activity now" ([`ActivityMonitor`])
//! 3. **Lifecycle coordination**: a single-shot inactivity timer and a
//!    periodic background check racing to one idempotent expiry
//!    ([`SessionManager::init_activity_tracking`])
//! 4. **Warnings**: a poller that tells the UI when fewer than five
//!    minutes remain ([`WarningPresenter`])
//!
//! # How it fits in the stack
//!
//! ```text
//! UI layer (above)  ← dispatches events, shows warnings, reacts to expiry
//!     ↕
//! Session layer (this crate)  ← owns timers and the lifecycle state machine
//!     ↕
//! Store + Protocol (below)  ← persisted record and its string encoding
//! ```

mod activity;
mod auth;
mod clock;
mod coordinator;
mod error;
mod evaluator;
mod manager;
mod session;
mod warning;

pub use activity::{
    ActivityMonitor, EventDispatcher, EventKind, EventTarget, Listener, ListenerGuard,
    ListenerId, ListenerOptions, UiEvent,
};
pub use auth::{AuthGrant, Authenticator, Credentials, Registration};
pub use clock::{Clock, SystemClock, TokioClock};
pub use coordinator::CoordinatorHandle;
pub use error::SessionError;
pub use evaluator::{Expiry, evaluate};
pub use manager::{SessionManager, SessionManagerBuilder, TrackingHandle, WeakSessionManager};
pub use session::{
    ACTIVITY_CHECK_INTERVAL, ExpiryReason, LifecyclePhase, SESSION_TIMEOUT, SessionConfig,
    SessionInfo, WARNING_POLL_INTERVAL, WARNING_THRESHOLD,
};
pub use warning::{WarningDecision, WarningHandle, WarningPresenter, WarningState};
