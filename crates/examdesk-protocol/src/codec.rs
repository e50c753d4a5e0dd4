//! Codec trait and implementations for persisted session values.
//!
//! Key-value storage only holds strings. A "codec" decides how the typed
//! values in a [`SessionRecord`](crate::SessionRecord) become those
//! strings and back. The session core only talks to the [`Codec`]
//! trait, so the encoding can change without touching timer logic.
//!
//! [`JsonCodec`] is the layout the web client has always used: the
//! profile as a JSON object, timestamps as plain decimal integers.

use crate::{EpochMillis, ProtocolError, UserProfile};

/// Converts persisted session values to and from strings.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → the codec is shared between the activity listeners
///   and the background timer task.
/// - `'static` → it owns everything it needs.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a profile snapshot.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode_profile(&self, profile: &UserProfile) -> Result<String, ProtocolError>;

    /// Parses a stored profile snapshot.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the string is malformed.
    fn decode_profile(&self, raw: &str) -> Result<UserProfile, ProtocolError>;

    /// Formats a timestamp for storage.
    fn encode_timestamp(&self, at: EpochMillis) -> String {
        at.0.to_string()
    }

    /// Parses a stored timestamp.
    ///
    /// # Errors
    /// Returns `ProtocolError::InvalidTimestamp` if the string is not an
    /// integer.
    fn decode_timestamp(&self, raw: &str) -> Result<EpochMillis, ProtocolError> {
        raw.trim()
            .parse::<i64>()
            .map(EpochMillis)
            .map_err(|_| ProtocolError::InvalidTimestamp(raw.to_string()))
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that stores the profile as JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use examdesk_protocol::{Codec, EpochMillis, JsonCodec, Role, UserProfile};
///
/// let codec = JsonCodec;
/// let user = UserProfile {
///     id: "42".into(),
///     name: "Asha".into(),
///     phone: "+254700000000".into(),
///     role: Role::Editor,
/// };
///
/// let raw = codec.encode_profile(&user).unwrap();
/// assert_eq!(codec.decode_profile(&raw).unwrap(), user);
///
/// assert_eq!(codec.encode_timestamp(EpochMillis(1_700_000_000_000)), "1700000000000");
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode_profile(&self, profile: &UserProfile) -> Result<String, ProtocolError> {
        serde_json::to_string(profile).map_err(ProtocolError::Encode)
    }

    fn decode_profile(&self, raw: &str) -> Result<UserProfile, ProtocolError> {
        serde_json::from_str(raw).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn test_decode_profile_missing_role_defaults_to_user() {
        let raw = r#"{"id":"7","name":"Kip","phone":"+254711111111"}"#;
        let user = JsonCodec.decode_profile(raw).unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.name, "Kip");
    }

    #[test]
    fn test_decode_profile_malformed_returns_decode_error() {
        let result = JsonCodec.decode_profile("{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_timestamp_accepts_padded_integer() {
        assert_eq!(
            JsonCodec.decode_timestamp(" 1800000 ").unwrap(),
            EpochMillis(1_800_000)
        );
    }

    #[test]
    fn test_decode_timestamp_rejects_garbage() {
        let result = JsonCodec.decode_timestamp("yesterday");
        assert!(
            matches!(result, Err(ProtocolError::InvalidTimestamp(ref s)) if s == "yesterday")
        );
    }
}
