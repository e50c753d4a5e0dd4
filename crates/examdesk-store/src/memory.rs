//! In-memory [`SessionStore`] backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use examdesk_protocol::StorageKey;

use crate::{SessionStore, StoreError};

#[derive(Debug)]
struct Inner {
    entries: HashMap<StorageKey, String>,
    available: bool,
}

/// A [`SessionStore`] kept in process memory.
///
/// Cloning is cheap and clones share the same entries, which is how
/// tests model a page reload: build a second session manager over a
/// clone and it sees exactly what the first one persisted.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates an empty, available store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                available: true,
            })),
        }
    }

    /// Turns the store on or off. While off, every operation returns
    /// [`StoreError::Unavailable`], like browser storage that has been
    /// disabled by the user.
    pub fn set_available(&self, available: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.available = available;
        }
    }

    /// Number of entries currently held, ignoring availability.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.entries.len()).unwrap_or(0)
    }

    /// Returns `true` if no entries are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        if !inner.available {
            return Err(StoreError::Unavailable("memory store disabled".into()));
        }
        Ok(inner)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.entries.get(&key).cloned())
    }

    fn set_many(&self, entries: &[(StorageKey, String)]) -> Result<(), StoreError> {
        // One lock for the whole batch, so no reader sees a partial write.
        let mut inner = self.lock()?;
        for (key, value) in entries {
            inner.entries.insert(*key, value.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[StorageKey]) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        for key in keys {
            inner.entries.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_entries() {
        let a = MemoryStore::new();
        let b = a.clone();

        a.set(StorageKey::Token, "abc").unwrap();

        assert_eq!(b.get(StorageKey::Token).unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_disabled_store_rejects_every_operation() {
        let store = MemoryStore::new();
        store.set(StorageKey::Token, "abc").unwrap();
        store.set_available(false);

        assert!(matches!(
            store.get(StorageKey::Token),
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.set(StorageKey::User, "{}"),
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(store.clear(), Err(StoreError::Unavailable(_))));

        // Nothing was lost while disabled.
        store.set_available(true);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_on_empty_store_is_ok() {
        let store = MemoryStore::new();
        store.clear().expect("clearing nothing is not an error");
        store.clear().expect("and neither is clearing it twice");
        assert!(store.is_empty());
    }
}
