//! Error types for the session layer.

use examdesk_protocol::ProtocolError;
use examdesk_store::StoreError;

/// Errors that can occur during session management.
///
/// Note what is NOT here: an expired session is not an error. Expiry is
/// a normal transition reported through the expiry callback, and the
/// accessors simply answer "invalid" or `None`.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The [`Authenticator`](crate::Authenticator) rejected the login or
    /// registration.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The operation needs a session token and none is stored.
    #[error("no active session")]
    NoSession,

    /// Activity tracking is already running for this manager.
    /// Tear the previous tracking down before starting again.
    #[error("activity tracking already started")]
    AlreadyTracking,

    /// Timers need a Tokio runtime and none is running on this thread.
    #[error("no tokio runtime available to run session timers")]
    NoRuntime,

    /// The persistent store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A persisted value could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
