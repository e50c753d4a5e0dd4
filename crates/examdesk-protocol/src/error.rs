//! Error types for the protocol layer.
//!
//! Each crate in Examdesk defines its own error enum. A `ProtocolError`
//! always means a persisted value could not be turned into (or out of)
//! its string form; it never means storage itself failed.

/// Errors that can occur while encoding or decoding persisted values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing the user profile to JSON failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The stored user profile is not valid JSON, or is missing fields.
    ///
    /// This is the "malformed stored profile" case: accessors turn it
    /// into `None` and log, they never hand it to UI code.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A stored timestamp is not a stringified epoch-millisecond integer.
    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
}
