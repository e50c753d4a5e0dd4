//! Core types for a persisted Examdesk session.
//!
//! A session is stored as four separate string entries (see
//! [`StorageKey`]). This module defines the typed view of those entries
//! and the identity types carried inside them.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EpochMillis
// ---------------------------------------------------------------------------

/// A wall-clock timestamp in milliseconds since the Unix epoch.
///
/// This is a "newtype wrapper" around `i64`. Signed, because differences
/// between two timestamps can be negative (a clock that stepped
/// backwards, or a deadline already in the past), and we want that
/// arithmetic to stay in one type.
///
/// `#[serde(transparent)]` makes it serialize as the bare integer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EpochMillis(pub i64);

impl EpochMillis {
    /// The epoch itself. Used as the stand-in for "never recorded".
    pub const ZERO: Self = Self(0);

    /// Milliseconds elapsed from `earlier` to `self`. Negative if
    /// `earlier` is actually later.
    pub fn millis_since(self, earlier: EpochMillis) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Returns `self + duration`, saturating at `i64::MAX`.
    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(millis))
    }
}

impl fmt::Display for EpochMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

// ---------------------------------------------------------------------------
// User profile
// ---------------------------------------------------------------------------

/// What a user is allowed to do in the exam-authoring app.
///
/// Editors build the question bank; users generate papers from it.
/// Roles the backend invents later decode as [`Role::Other`] instead of
/// failing the whole profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    #[default]
    User,
    #[serde(other)]
    Other,
}

/// Denormalized profile snapshot, cached from the last login or
/// register response.
///
/// It is a cache, not the source of truth: nothing in the session core
/// reads it to make a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend identifier of the user.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Phone number the account was registered (and OTP-verified) with.
    pub phone: String,
    #[serde(default)]
    pub role: Role,
}

impl fmt::Display for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.id)
    }
}

// ---------------------------------------------------------------------------
// StorageKey
// ---------------------------------------------------------------------------

/// The four persisted entries that together form a session.
///
/// | Key | Encoding |
/// |---|---|
/// | `token` | opaque string |
/// | `user` | JSON-encoded [`UserProfile`] |
/// | `loginTime` | stringified epoch-millisecond integer |
/// | `lastActivity` | stringified epoch-millisecond integer |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Token,
    User,
    LoginTime,
    LastActivity,
}

impl StorageKey {
    /// Every key, in the order they are written at login.
    pub const ALL: [StorageKey; 4] = [
        StorageKey::Token,
        StorageKey::User,
        StorageKey::LoginTime,
        StorageKey::LastActivity,
    ];

    /// The exact key name used in the backing store.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::User => "user",
            Self::LoginTime => "loginTime",
            Self::LastActivity => "lastActivity",
        }
    }

    /// Inverse of [`as_str`](Self::as_str).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// The typed view of one process-wide session.
///
/// Every field is optional because the store may hold any subset of
/// the entries (a fresh install holds none). The rules that give the
/// fields meaning live in the session crate:
/// - no `token` → no session, whatever the other fields say;
/// - `login_time` is informational only;
/// - `last_activity` is the sole input to expiry besides the timeout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRecord {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    pub login_time: Option<EpochMillis>,
    pub last_activity: Option<EpochMillis>,
}

impl SessionRecord {
    /// Returns `true` if a token is present.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_names_match_persisted_layout() {
        let names: Vec<_> = StorageKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, ["token", "user", "loginTime", "lastActivity"]);
    }

    #[test]
    fn test_storage_key_from_name_rejects_unknown() {
        assert_eq!(StorageKey::from_name("loginTime"), Some(StorageKey::LoginTime));
        assert_eq!(StorageKey::from_name("sessionId"), None);
    }

    #[test]
    fn test_epoch_millis_arithmetic() {
        let t = EpochMillis(10_000);
        assert_eq!(t.millis_since(EpochMillis(4_000)), 6_000);
        assert_eq!(EpochMillis(4_000).millis_since(t), -6_000);
        assert_eq!(
            t.saturating_add(Duration::from_secs(2)),
            EpochMillis(12_000)
        );
        assert_eq!(
            EpochMillis(i64::MAX - 1).saturating_add(Duration::from_secs(1)),
            EpochMillis(i64::MAX)
        );
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_role_unknown_value_decodes_as_other() {
        let role: Role = serde_json::from_str("\"superuser\"").unwrap();
        assert_eq!(role, Role::Other);
        let role: Role = serde_json::from_str("\"editor\"").unwrap();
        assert_eq!(role, Role::Editor);
    }

    #[test]
    fn test_session_record_default_has_no_token() {
        assert!(!SessionRecord::default().has_token());
    }
}
