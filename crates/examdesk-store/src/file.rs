//! File-backed [`SessionStore`]: one JSON object on disk.
//!
//! The file looks exactly like the browser's storage would if you dumped
//! it: `{"token": "...", "user": "{...}", "loginTime": "...", ...}`.
//! Values stay strings; decoding them is the codec's job.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use examdesk_protocol::StorageKey;

use crate::{SessionStore, StoreError};

type Entries = BTreeMap<String, String>;

/// A [`SessionStore`] persisted to a JSON file.
///
/// Every [`get`](SessionStore::get) re-reads the file, so a value written
/// by another process (another "tab") is seen on the next read. Writes
/// go to a sibling temp file which is then renamed over the original, so
/// a crash never leaves a half-written session behind.
///
/// Entries under keys this crate does not know about are preserved.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens (lazily) the store at `path`. The file is created on the
    /// first write; a missing file reads as an empty store.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Entries, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(StoreError::Io(e)),
        };
        if raw.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&raw).map_err(StoreError::Corrupt)
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries).map_err(StoreError::Corrupt)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::trace!(path = %self.path.display(), entries = entries.len(), "session file written");
        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut Entries)) -> Result<(), StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("file store lock poisoned".into()))?;
        let mut entries = self.read_entries()?;
        f(&mut entries);
        self.write_entries(&entries)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StoreError> {
        Ok(self.read_entries()?.remove(key.as_str()))
    }

    fn set_many(&self, entries: &[(StorageKey, String)]) -> Result<(), StoreError> {
        self.modify(|stored| {
            for (key, value) in entries {
                stored.insert(key.as_str().to_string(), value.clone());
            }
        })
    }

    fn remove_many(&self, keys: &[StorageKey]) -> Result<(), StoreError> {
        self.modify(|stored| {
            for key in keys {
                stored.remove(key.as_str());
            }
        })
    }
}
