/// Errors that can occur in the storage layer.
///
/// Callers in the session core treat every variant the same way: the
/// session is invalid until a later read succeeds (fail closed).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Storage is disabled or otherwise refusing access.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing the backing file failed.
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but is not a JSON object of strings.
    #[cfg(feature = "file")]
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
}
