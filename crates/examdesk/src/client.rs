//! `SessionClient` builder: the one object an application wires up.
//!
//! It ties the layers together: store → session manager → warning
//! presenter, with the application's [`Authenticator`] plugged in for
//! login and registration.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use examdesk_protocol::UserProfile;
use examdesk_session::{
    Authenticator, Clock, Credentials, EventTarget, ExpiryReason, Registration, SessionConfig,
    SessionManager, SystemClock, TrackingHandle, WarningHandle, WarningPresenter,
};
use examdesk_store::{FileStore, MemoryStore, SessionStore};

use crate::ExamdeskError;

/// Builder for configuring a [`SessionClient`].
///
/// # Example
///
/// ```rust,ignore
/// use examdesk::prelude::*;
///
/// let client = SessionClient::builder(my_auth)
///     .file_store("/var/lib/examdesk/session.json")
///     .config(SessionConfig::default())
///     .build();
/// ```
pub struct SessionClientBuilder<A: Authenticator> {
    auth: A,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl<A: Authenticator> SessionClientBuilder<A> {
    /// Creates a builder with an in-memory store, the system clock and
    /// the default timeouts.
    pub fn new(auth: A) -> Self {
        Self {
            auth,
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(SystemClock),
            config: SessionConfig::default(),
        }
    }

    /// Sets the session timeouts and cadences.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the wall clock used for persisted timestamps.
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Persists the session record in `store`.
    pub fn store(mut self, store: impl SessionStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    /// Persists the session record in a JSON file at `path`, so it
    /// survives restarts.
    pub fn file_store(self, path: impl Into<PathBuf>) -> Self {
        self.store(FileStore::new(path))
    }

    pub fn build(self) -> SessionClient<A> {
        let manager = SessionManager::builder(self.store)
            .clock(self.clock)
            .config(self.config)
            .build();
        SessionClient {
            manager,
            auth: self.auth,
            warning: Mutex::new(Weak::new()),
        }
    }
}

/// Session lifecycle for one application instance.
pub struct SessionClient<A: Authenticator> {
    manager: SessionManager,
    auth: A,
    /// The warning poller of the latest tracking, so logout can stop it.
    /// Owned by the returned [`ClientTracking`].
    warning: Mutex<Weak<WarningHandle>>,
}

impl<A: Authenticator> SessionClient<A> {
    /// Creates a new builder around `auth`.
    pub fn builder(auth: A) -> SessionClientBuilder<A> {
        SessionClientBuilder::new(auth)
    }

    /// Logs in with phone and password and stores the new session.
    pub async fn login(&self, phone: &str, password: &str) -> Result<UserProfile, ExamdeskError> {
        let credentials = Credentials {
            phone: phone.to_string(),
            password: password.to_string(),
        };
        Ok(self.manager.login(&self.auth, &credentials).await?)
    }

    /// Registers a new account and stores the resulting session.
    pub async fn register(&self, registration: &Registration) -> Result<UserProfile, ExamdeskError> {
        Ok(self.manager.register(&self.auth, registration).await?)
    }

    /// The underlying manager, for queries like
    /// [`is_session_valid`](SessionManager::is_session_valid).
    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    /// Starts activity tracking on `target` together with the expiry
    /// warning. `on_expired` runs once if the session times out.
    pub fn start_tracking<F>(
        &self,
        target: Arc<dyn EventTarget>,
        on_expired: F,
    ) -> Result<ClientTracking, ExamdeskError>
    where
        F: FnOnce(ExpiryReason) + Send + 'static,
    {
        let tracking = self.manager.init_activity_tracking(target, on_expired)?;
        let warning = Arc::new(WarningPresenter::spawn(&self.manager)?);
        *self.lock_warning() = Arc::downgrade(&warning);
        tracing::debug!("session client tracking started");
        Ok(ClientTracking { tracking, warning })
    }

    /// Ends the session. Running tracking and the warning poll stop
    /// without invoking the expiry callback.
    pub fn logout(&self) {
        if let Some(warning) = self.lock_warning().upgrade() {
            warning.stop();
        }
        self.manager.logout();
    }

    fn lock_warning(&self) -> MutexGuard<'_, Weak<WarningHandle>> {
        self.warning.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Activity tracking plus the warning presenter, started together by
/// [`SessionClient::start_tracking`].
///
/// Dropping it stops both; the stored session is kept.
#[must_use = "dropping the tracking stops it immediately"]
pub struct ClientTracking {
    tracking: TrackingHandle,
    warning: Arc<WarningHandle>,
}

impl ClientTracking {
    /// The expiry warning to render.
    pub fn warning(&self) -> &WarningHandle {
        &self.warning
    }

    /// Stops the timers, listeners and warning poll.
    pub fn stop(self) {
        self.warning.stop();
        self.tracking.teardown();
    }
}
