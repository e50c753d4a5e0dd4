//! Unified error type for Examdesk.

use examdesk_protocol::ProtocolError;
use examdesk_session::SessionError;
use examdesk_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ExamdeskError {
    /// The session record could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored value could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Login, tracking, or another lifecycle operation failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ExamdeskError {
    /// Returns `true` if the backend rejected the credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Session(SessionError::AuthFailed(_)))
    }
}
