//! Authentication hook for establishing a session.
//!
//! Examdesk doesn't talk to the backend itself. Logging in (phone and
//! password) and registering (phone verified by OTP) are REST calls owned
//! by the surrounding application. This module only defines the
//! [`Authenticator`] trait those calls are plugged in through, and the
//! [`AuthGrant`] they must produce.
//!
//! # Why a trait?
//!
//! - Use the real REST client in the browser or desktop shell
//! - Use a canned authenticator in tests and demos
//!
//! The session core stays the same either way.

use std::fmt;

use examdesk_protocol::UserProfile;

use crate::SessionError;

/// What a successful login or registration hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    /// Opaque credential to attach to later API calls.
    pub token: String,
    /// Profile snapshot to cache alongside the token.
    pub user: UserProfile,
}

/// Phone-and-password login.
#[derive(Clone)]
pub struct Credentials {
    pub phone: String,
    pub password: String,
}

// Hand-written so the password never ends up in a log line.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("phone", &self.phone)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account creation after the phone number has received an OTP.
#[derive(Clone)]
pub struct Registration {
    pub name: String,
    pub phone: String,
    pub password: String,
    /// One-time code delivered to `phone`.
    pub otp: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("phone", &self.phone)
            .field("password", &"<redacted>")
            .field("otp", &"<redacted>")
            .finish()
    }
}

/// Exchanges credentials for an [`AuthGrant`].
///
/// # Trait bounds
///
/// - `Send + Sync` → the authenticator can be shared across async tasks.
/// - `'static` → it doesn't borrow temporary data.
///
/// # Example
///
/// ```rust
/// use examdesk_protocol::{Role, UserProfile};
/// use examdesk_session::{AuthGrant, Authenticator, Credentials, Registration, SessionError};
///
/// /// Accepts one hard-coded account. Only for demos!
/// struct FixedAccount;
///
/// impl Authenticator for FixedAccount {
///     async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, SessionError> {
///         if credentials.password != "letmein" {
///             return Err(SessionError::AuthFailed("wrong password".into()));
///         }
///         Ok(AuthGrant {
///             token: "demo-token".into(),
///             user: UserProfile {
///                 id: "1".into(),
///                 name: "Demo Editor".into(),
///                 phone: credentials.phone.clone(),
///                 role: Role::Editor,
///             },
///         })
///     }
///
///     async fn register(&self, _registration: &Registration) -> Result<AuthGrant, SessionError> {
///         Err(SessionError::AuthFailed("registration closed".into()))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Logs in an existing account.
    ///
    /// # Returns
    /// - `Ok(AuthGrant)`: the backend accepted the credentials
    /// - `Err(SessionError::AuthFailed)`: rejected
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<AuthGrant, SessionError>> + Send;

    /// Creates an account and logs it in.
    fn register(
        &self,
        registration: &Registration,
    ) -> impl std::future::Future<Output = Result<AuthGrant, SessionError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials {
            phone: "+254700000001".into(),
            password: "hunter2".into(),
        };
        let printed = format!("{creds:?}");
        assert!(printed.contains("+254700000001"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_registration_debug_redacts_secrets() {
        let reg = Registration {
            name: "Wanjiru".into(),
            phone: "+254700000002".into(),
            password: "hunter2".into(),
            otp: "918273".into(),
        };
        let printed = format!("{reg:?}");
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("918273"));
    }
}
