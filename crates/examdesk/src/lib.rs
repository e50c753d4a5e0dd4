//! # Examdesk
//!
//! Session lifecycle for the Examdesk exam-paper builder.
//!
//! A logged-in user keeps their session for as long as they keep
//! interacting with the application. Thirty minutes without a click,
//! key press, scroll or touch ends it. Examdesk tracks that activity,
//! persists it so it survives reloads, warns the user shortly before the
//! end, and clears the session when the time is up.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use examdesk::prelude::*;
//!
//! # async fn run(auth: impl Authenticator) -> Result<(), ExamdeskError> {
//! let client = SessionClient::builder(auth)
//!     .file_store("session.json")
//!     .build();
//!
//! client.login("+254700000001", "secret").await?;
//!
//! let page = Arc::new(EventDispatcher::new());
//! let tracking = client.start_tracking(page.clone(), |reason| {
//!     println!("session ended: {reason}");
//! })?;
//!
//! // Forward UI events to `page`; render `tracking.warning().state()`.
//! # drop(tracking);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::{ClientTracking, SessionClient, SessionClientBuilder};
pub use error::ExamdeskError;

pub use examdesk_protocol as protocol;
pub use examdesk_session as session;
pub use examdesk_store as store;
pub use examdesk_tick as tick;

/// The types most applications need.
pub mod prelude {
    pub use crate::{ClientTracking, ExamdeskError, SessionClient, SessionClientBuilder};
    pub use examdesk_protocol::{EpochMillis, Role, StorageKey, UserProfile};
    pub use examdesk_session::{
        AuthGrant, Authenticator, Clock, Credentials, EventDispatcher, EventKind, EventTarget,
        ExpiryReason, LifecyclePhase, Registration, SessionConfig, SessionError, SessionInfo,
        SessionManager, SystemClock, TokioClock, UiEvent, WarningHandle, WarningState,
    };
    pub use examdesk_store::{FileStore, MemoryStore, SessionStore, StoreError};
}
