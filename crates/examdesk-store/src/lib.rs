//! Persistent session storage for Examdesk.
//!
//! Provides the [`SessionStore`] trait, the durable key-value storage a
//! session lives in between page loads (or process restarts), plus two
//! backends:
//!
//! - [`MemoryStore`]: shared in-process map, with an availability switch
//!   for exercising the fail-closed paths.
//! - [`FileStore`]: a JSON file on disk (feature `file`, default).
//!
//! # Feature Flags
//!
//! - `file` (default): [`FileStore`] via `serde_json`

mod error;
#[cfg(feature = "file")]
mod file;
mod memory;

pub use error::StoreError;
#[cfg(feature = "file")]
pub use file::FileStore;
pub use memory::MemoryStore;

use examdesk_protocol::StorageKey;

/// Durable key-value storage for the four session entries.
///
/// Implementations decide where the strings live; they do not interpret
/// them. Every method takes `&self` because the store is shared between
/// the activity listeners, the background timer task and the UI-facing
/// accessors, so backends use interior mutability.
pub trait SessionStore: Send + Sync + 'static {
    /// Reads one entry. `Ok(None)` means the entry is absent.
    fn get(&self, key: StorageKey) -> Result<Option<String>, StoreError>;

    /// Writes several entries so that they become visible together.
    ///
    /// Login relies on this: token, user, login time and last activity
    /// must never be observed half-written.
    fn set_many(&self, entries: &[(StorageKey, String)]) -> Result<(), StoreError>;

    /// Removes several entries. Removing an absent entry is not an error.
    fn remove_many(&self, keys: &[StorageKey]) -> Result<(), StoreError>;

    /// Writes a single entry.
    fn set(&self, key: StorageKey, value: &str) -> Result<(), StoreError> {
        self.set_many(&[(key, value.to_string())])
    }

    /// Removes a single entry.
    fn remove(&self, key: StorageKey) -> Result<(), StoreError> {
        self.remove_many(&[key])
    }

    /// Removes every session entry.
    fn clear(&self) -> Result<(), StoreError> {
        self.remove_many(&StorageKey::ALL)
    }
}

impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set_many(&self, entries: &[(StorageKey, String)]) -> Result<(), StoreError> {
        (**self).set_many(entries)
    }

    fn remove_many(&self, keys: &[StorageKey]) -> Result<(), StoreError> {
        (**self).remove_many(keys)
    }
}
