//! The session manager: one explicit object owning the session lifecycle.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Establishing a session after login or registration
//! - Recording activity and sliding the inactivity window
//! - Starting and stopping activity tracking (listeners + timers)
//! - Expiring the session exactly once, whichever trigger notices first
//! - Answering "is the session valid?" for the rest of the application
//!
//! # State
//!
//! There are no globals. Everything lives behind one `Arc`, and the UI
//! layer is handed a [`SessionManager`] (cheap to clone) instead of
//! importing module-level singletons. Two things are shared:
//!
//! - the **persisted record**, which only the store holds: the manager
//!   never caches `lastActivity` in memory, so every check sees what a
//!   reload would see;
//! - the **lifecycle state** (phase, expiry callback, running tracking),
//!   behind a `std::sync::Mutex` that is never held while calling out.
//!
//! Only activity writes `lastActivity`; only establish/logout/expire
//! touch the rest. Those writes are serialized by a second mutex, so an
//! activity stamp can never land after the record has been cleared.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use examdesk_protocol::{Codec, EpochMillis, JsonCodec, SessionRecord, StorageKey, UserProfile};
use examdesk_store::{SessionStore, StoreError};
use examdesk_tick::Deadline;

use crate::activity::{ActivityMonitor, EventTarget, ListenerGuard};
use crate::coordinator::{self, CoordinatorHandle};
use crate::{
    AuthGrant, Authenticator, Clock, Credentials, Expiry, ExpiryReason, LifecyclePhase,
    Registration, SessionConfig, SessionError, SessionInfo, SystemClock, evaluate,
};

/// Called once when the session expires. Receives the trigger.
type ExpiryCallback = Box<dyn FnOnce(ExpiryReason) + Send>;

/// Listeners and timers of one `init_activity_tracking` call.
struct Tracking {
    generation: u64,
    listeners: ListenerGuard,
    coordinator: CoordinatorHandle,
}

impl Tracking {
    fn teardown(mut self) {
        self.coordinator.stop();
        self.listeners.detach();
    }
}

struct LifecycleState {
    phase: LifecyclePhase,
    on_expired: Option<ExpiryCallback>,
    tracking: Option<Tracking>,
    next_generation: u64,
}

struct Inner {
    store: Arc<dyn SessionStore>,
    codec: Box<dyn Codec>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    /// The single-shot inactivity timer's arm side.
    inactivity: Deadline,
    state: Mutex<LifecycleState>,
    /// Held across every write to the persisted record. Taken before
    /// `state` when both are needed, never the other way round.
    record_writes: Mutex<()>,
}

/// Owns the session lifecycle for one user of one application instance.
///
/// ## Lifecycle
///
/// ```text
/// login()/register() ──→ establish() ──→ init_activity_tracking()
///                                               │
///                      record_activity() ◀──────┤ (every qualifying event)
///                                               │
///          ┌────────────────────┬───────────────┴─────────────┐
///          ▼                    ▼                             ▼
///   inactivity timer     periodic check               logout() / teardown
///          └──────┬─────────────┘
///                 ▼
///             expire() ──→ stop timers ──→ clear record ──→ on_expired(reason)
/// ```
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

/// A non-owning reference to a [`SessionManager`], held by listeners and
/// background tasks so they never keep a dropped manager alive.
#[derive(Clone)]
pub struct WeakSessionManager {
    inner: Weak<Inner>,
}

impl WeakSessionManager {
    /// Returns the manager if it is still alive.
    pub fn upgrade(&self) -> Option<SessionManager> {
        self.inner.upgrade().map(|inner| SessionManager { inner })
    }
}

impl SessionManager {
    /// A manager over `store` with the default codec, system clock and
    /// the given config.
    pub fn new(store: impl SessionStore, config: SessionConfig) -> Self {
        Self::builder(store).config(config).build()
    }

    /// Starts building a manager over `store`.
    pub fn builder(store: impl SessionStore) -> SessionManagerBuilder {
        SessionManagerBuilder {
            store: Arc::new(store),
            codec: Box::new(JsonCodec),
            clock: Arc::new(SystemClock),
            config: SessionConfig::default(),
        }
    }

    /// The (validated) configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> LifecyclePhase {
        self.lock_state().phase
    }

    /// Returns `true` while activity tracking is running.
    pub fn is_tracking(&self) -> bool {
        self.lock_state().tracking.is_some()
    }

    /// A weak reference to this manager.
    pub fn downgrade(&self) -> WeakSessionManager {
        WeakSessionManager {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // -- Establishing ------------------------------------------------------

    /// Logs in through `auth` and establishes the resulting session.
    pub async fn login(
        &self,
        auth: &impl Authenticator,
        credentials: &Credentials,
    ) -> Result<UserProfile, SessionError> {
        let grant = auth.login(credentials).await?;
        self.establish(grant)
    }

    /// Registers through `auth` and establishes the resulting session.
    pub async fn register(
        &self,
        auth: &impl Authenticator,
        registration: &Registration,
    ) -> Result<UserProfile, SessionError> {
        let grant = auth.register(registration).await?;
        self.establish(grant)
    }

    /// Persists a new session: token, profile, and both timestamps set to
    /// now, written in one batch.
    ///
    /// Any tracking left over from a previous session is torn down first
    /// (without invoking its expiry callback). The phase becomes `Idle`;
    /// call [`init_activity_tracking`](Self::init_activity_tracking) next.
    pub fn establish(&self, grant: AuthGrant) -> Result<UserProfile, SessionError> {
        let codec = &self.inner.codec;
        let now = self.inner.clock.now();
        let stamp = codec.encode_timestamp(now);
        let entries = [
            (StorageKey::Token, grant.token),
            (StorageKey::User, codec.encode_profile(&grant.user)?),
            (StorageKey::LoginTime, stamp.clone()),
            (StorageKey::LastActivity, stamp),
        ];

        let previous = {
            let mut state = self.lock_state();
            state.on_expired = None;
            state.phase = LifecyclePhase::Idle;
            state.tracking.take()
        };
        self.inner.inactivity.disarm();
        if let Some(tracking) = previous {
            tracing::debug!(generation = tracking.generation, "replacing tracked session");
            tracking.teardown();
        }

        {
            let _writes = self.lock_record_writes();
            self.inner.store.set_many(&entries)?;
        }
        tracing::info!(user = %grant.user, role = ?grant.user.role, login_time = %now, "session established");
        Ok(grant.user)
    }

    // -- Tracking ----------------------------------------------------------

    /// Starts activity tracking for the stored session.
    ///
    /// Attaches the activity listeners to `target`, arms the inactivity
    /// timer for the full timeout, and starts the periodic background
    /// check. `on_expired` runs once, after the record has been cleared,
    /// if either trigger expires the session.
    ///
    /// Starting does not count as activity: after a reload the persisted
    /// `lastActivity` keeps its old value, so the background check still
    /// expires a session that went idle before the reload.
    ///
    /// # Errors
    /// - [`SessionError::NoSession`]: no token is stored
    /// - [`SessionError::AlreadyTracking`]: tear down the previous tracking first
    /// - [`SessionError::NoRuntime`]: not called inside a Tokio runtime
    /// - [`SessionError::Store`]: the store is unreadable
    pub fn init_activity_tracking<F>(
        &self,
        target: Arc<dyn EventTarget>,
        on_expired: F,
    ) -> Result<TrackingHandle, SessionError>
    where
        F: FnOnce(ExpiryReason) + Send + 'static,
    {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(SessionError::NoRuntime);
        }
        if !self.load_record()?.has_token() {
            return Err(SessionError::NoSession);
        }

        let generation = {
            let mut state = self.lock_state();
            if state.tracking.is_some() {
                return Err(SessionError::AlreadyTracking);
            }
            state.next_generation += 1;
            state.next_generation
        };

        self.inner.inactivity.arm_in(self.inner.config.session_timeout);
        let listeners = ActivityMonitor::attach(target, self);
        let coordinator = coordinator::start(self, self.inner.inactivity.timer());
        let tracking = Tracking {
            generation,
            listeners,
            coordinator,
        };

        {
            let mut state = self.lock_state();
            // Another caller won the race while the listeners were attached.
            if state.tracking.is_some() || state.next_generation != generation {
                drop(state);
                tracking.teardown();
                return Err(SessionError::AlreadyTracking);
            }
            state.tracking = Some(tracking);
            state.on_expired = Some(Box::new(on_expired));
            state.phase = LifecyclePhase::Active;
        }

        tracing::debug!(
            generation,
            timeout_ms = self.inner.config.session_timeout.as_millis() as u64,
            "activity tracking started"
        );
        Ok(TrackingHandle {
            manager: self.downgrade(),
            generation,
        })
    }

    /// Stops the tracking started as `generation`, if it is still the
    /// running one. The session itself is left untouched.
    fn stop_tracking(&self, generation: u64) {
        let tracking = {
            let mut state = self.lock_state();
            match &state.tracking {
                Some(t) if t.generation == generation => {}
                _ => return,
            }
            state.on_expired = None;
            if state.phase == LifecyclePhase::Active {
                state.phase = LifecyclePhase::Idle;
            }
            state.tracking.take()
        };
        self.inner.inactivity.disarm();
        if let Some(tracking) = tracking {
            tracking.teardown();
            tracing::debug!(generation, "activity tracking stopped");
        }
    }

    /// Stamps "last activity now" and slides the inactivity window.
    ///
    /// The stored timestamp never moves backwards: if the wall clock is
    /// behind the stored value, the stored value is kept.
    ///
    /// # Errors
    /// - [`SessionError::NoSession`]: no token, or the session already ended
    /// - [`SessionError::Store`]: the write failed; the timer is not re-armed
    pub fn record_activity(&self) -> Result<EpochMillis, SessionError> {
        // An expire or logout that starts after this point waits for the
        // write below and then clears it along with the rest.
        let _writes = self.lock_record_writes();
        let phase = self.phase();
        if !phase.accepts_activity() {
            return Err(SessionError::NoSession);
        }
        let record = self.load_record()?;
        if !record.has_token() {
            return Err(SessionError::NoSession);
        }

        let now = self.inner.clock.now();
        let stamp = record.last_activity.map_or(now, |prev| prev.max(now));
        self.inner
            .store
            .set(StorageKey::LastActivity, &self.inner.codec.encode_timestamp(stamp))?;

        if phase == LifecyclePhase::Active {
            self.inner.inactivity.arm_in(self.inner.config.session_timeout);
        }
        tracing::trace!(at = %stamp, "activity recorded");
        Ok(stamp)
    }

    // -- Ending ------------------------------------------------------------

    /// Expires the session. Idempotent.
    ///
    /// Order: stop timers and listeners → clear the record → invoke the
    /// expiry callback. The record is gone before the callback runs, so
    /// anything the callback re-renders sees a logged-out state.
    ///
    /// Returns `true` if this call performed the transition, `false` if
    /// the session had already expired or been logged out.
    pub fn expire(&self, reason: ExpiryReason) -> bool {
        let (tracking, callback) = {
            let mut state = self.lock_state();
            if !state.phase.can_expire() {
                tracing::debug!(%reason, phase = %state.phase, "expiry already handled");
                return false;
            }
            state.phase = LifecyclePhase::Expiring;
            (state.tracking.take(), state.on_expired.take())
        };

        if let Some(tracking) = tracking {
            tracking.teardown();
        }
        self.clear_record("failed to clear expired session record");
        self.lock_state().phase = LifecyclePhase::Expired;

        tracing::info!(%reason, "session expired");
        if let Some(callback) = callback {
            callback(reason);
        }
        true
    }

    /// Ends the session on the user's request: stops tracking, removes
    /// the listeners, clears the record. The expiry callback is not
    /// invoked. Safe to call repeatedly.
    pub fn logout(&self) {
        let tracking = {
            let mut state = self.lock_state();
            state.on_expired = None;
            state.phase = LifecyclePhase::LoggedOut;
            state.tracking.take()
        };
        if let Some(tracking) = tracking {
            tracking.teardown();
        }
        self.clear_record("failed to clear session record on logout");
        tracing::info!("logged out");
    }

    // -- Queries -----------------------------------------------------------

    /// Evaluates the persisted session now. A store failure evaluates as
    /// invalid (fail closed).
    pub fn evaluate(&self) -> Expiry {
        let now = self.inner.clock.now();
        let timeout = self.inner.config.session_timeout;
        match self.load_record() {
            Ok(record) => evaluate(now, record.has_token(), record.last_activity, timeout),
            Err(e) => {
                tracing::warn!(error = %e, "session store unreadable; treating session as invalid");
                evaluate(now, false, None, timeout)
            }
        }
    }

    /// Returns `true` if a token is stored and the inactivity window has
    /// not elapsed.
    pub fn is_session_valid(&self) -> bool {
        self.evaluate().is_valid
    }

    /// Snapshot for display: validity, timestamps, time left.
    pub fn session_info(&self) -> SessionInfo {
        let now = self.inner.clock.now();
        let timeout = self.inner.config.session_timeout;
        let record = self.load_record().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "session store unreadable; reporting no session");
            SessionRecord::default()
        });
        let expiry = evaluate(now, record.has_token(), record.last_activity, timeout);

        SessionInfo {
            is_valid: expiry.is_valid,
            login_time: record.login_time,
            last_activity: record.last_activity,
            time_until_expiry: expiry.time_until_expiry_ms,
            session_timeout: timeout.as_millis() as u64,
        }
    }

    /// The cached profile, or `None` if absent, malformed, or unreadable.
    pub fn current_user(&self) -> Option<UserProfile> {
        match self.load_record() {
            Ok(record) => record.user,
            Err(e) => {
                tracing::warn!(error = %e, "session store unreadable; no current user");
                None
            }
        }
    }

    /// The stored token, or `None` if absent or unreadable.
    pub fn auth_token(&self) -> Option<String> {
        match self.inner.store.get(StorageKey::Token) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "session store unreadable; no token");
                None
            }
        }
    }

    // -- Internals ---------------------------------------------------------

    /// Reads and decodes all four entries. Undecodable values are logged
    /// and read as absent; only store failures are errors.
    fn load_record(&self) -> Result<SessionRecord, StoreError> {
        let store = &self.inner.store;
        let codec = &self.inner.codec;

        let user = store
            .get(StorageKey::User)?
            .and_then(|raw| match codec.decode_profile(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "stored user profile is malformed; ignoring");
                    None
                }
            });
        let timestamp = |key: StorageKey| -> Result<Option<EpochMillis>, StoreError> {
            Ok(store.get(key)?.and_then(|raw| match codec.decode_timestamp(&raw) {
                Ok(at) => Some(at),
                Err(e) => {
                    tracing::warn!(%key, error = %e, "stored timestamp is malformed; ignoring");
                    None
                }
            }))
        };

        Ok(SessionRecord {
            token: store.get(StorageKey::Token)?,
            user,
            login_time: timestamp(StorageKey::LoginTime)?,
            last_activity: timestamp(StorageKey::LastActivity)?,
        })
    }

    /// Removes all four entries and disarms the inactivity timer. Any
    /// `record_activity` already past its phase check finishes first, so
    /// nothing it wrote or armed survives.
    fn clear_record(&self, failure: &str) {
        let _writes = self.lock_record_writes();
        if let Err(e) = self.inner.store.clear() {
            tracing::warn!(error = %e, "{failure}");
        }
        self.inner.inactivity.disarm();
    }

    fn lock_record_writes(&self) -> MutexGuard<'_, ()> {
        self.inner
            .record_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_state(&self) -> MutexGuard<'_, LifecycleState> {
        // The state is a handful of plain fields; a panic elsewhere cannot
        // leave it half-updated in a way that matters.
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for [`SessionManager`].
pub struct SessionManagerBuilder {
    store: Arc<dyn SessionStore>,
    codec: Box<dyn Codec>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionManagerBuilder {
    /// Sets the session configuration (validated on build).
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the wall clock used for persisted timestamps.
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Sets the codec for persisted values.
    pub fn codec(mut self, codec: impl Codec) -> Self {
        self.codec = Box::new(codec);
        self
    }

    pub fn build(self) -> SessionManager {
        SessionManager {
            inner: Arc::new(Inner {
                store: self.store,
                codec: self.codec,
                clock: self.clock,
                config: self.config.validated(),
                inactivity: Deadline::new(),
                state: Mutex::new(LifecycleState {
                    phase: LifecyclePhase::Idle,
                    on_expired: None,
                    tracking: None,
                    next_generation: 0,
                }),
                record_writes: Mutex::new(()),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// TrackingHandle
// ---------------------------------------------------------------------------

/// Returned by [`SessionManager::init_activity_tracking`].
///
/// Dropping the handle (or calling [`teardown`](Self::teardown)) stops
/// both timers and removes the activity listeners in one step. The
/// session itself stays stored.
#[must_use = "dropping the handle stops activity tracking immediately"]
pub struct TrackingHandle {
    manager: WeakSessionManager,
    generation: u64,
}

impl TrackingHandle {
    /// Stops this tracking. Does nothing if the tracking already ended
    /// (expiry, logout, or a newer session replaced it).
    pub fn teardown(self) {
        // Drop does the work.
    }
}

impl Drop for TrackingHandle {
    fn drop(&mut self) {
        if let Some(manager) = self.manager.upgrade() {
            manager.stop_tracking(self.generation);
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
