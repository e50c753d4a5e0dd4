//! Integration tests for the store backends.

use std::sync::Arc;

use examdesk_protocol::StorageKey;
use examdesk_store::{FileStore, MemoryStore, SessionStore, StoreError};

fn login_entries() -> Vec<(StorageKey, String)> {
    vec![
        (StorageKey::Token, "tok-1".to_string()),
        (StorageKey::User, r#"{"id":"1","name":"A","phone":"+1"}"#.to_string()),
        (StorageKey::LoginTime, "1000".to_string()),
        (StorageKey::LastActivity, "1000".to_string()),
    ]
}

// =========================================================================
// FileStore
// =========================================================================

#[test]
fn test_file_store_missing_file_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("session.json"));

    assert_eq!(store.get(StorageKey::Token).unwrap(), None);
}

#[test]
fn test_file_store_survives_reopen() {
    // A second FileStore over the same path is a process restart.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    FileStore::new(&path).set_many(&login_entries()).unwrap();

    let reopened = FileStore::new(&path);
    assert_eq!(
        reopened.get(StorageKey::Token).unwrap().as_deref(),
        Some("tok-1")
    );
    assert_eq!(
        reopened.get(StorageKey::LastActivity).unwrap().as_deref(),
        Some("1000")
    );
}

#[test]
fn test_file_store_uses_persisted_key_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    FileStore::new(&path).set_many(&login_entries()).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(json["token"], "tok-1");
    assert_eq!(json["loginTime"], "1000");
    assert_eq!(json["lastActivity"], "1000");
    assert!(json["user"].is_string(), "profile stays a JSON-encoded string");
}

#[test]
fn test_file_store_sees_writes_from_other_instance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let tab_a = FileStore::new(&path);
    let tab_b = FileStore::new(&path);
    tab_a.set_many(&login_entries()).unwrap();

    tab_b.set(StorageKey::LastActivity, "5000").unwrap();

    assert_eq!(
        tab_a.get(StorageKey::LastActivity).unwrap().as_deref(),
        Some("5000")
    );
}

#[test]
fn test_file_store_clear_keeps_unrelated_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, r#"{"theme":"dark","token":"old"}"#).unwrap();
    let store = FileStore::new(&path);

    store.clear().unwrap();

    assert_eq!(store.get(StorageKey::Token).unwrap(), None);
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("theme"), "foreign keys must survive: {raw}");
}

#[test]
fn test_file_store_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("session.json"));
    store.set_many(&login_entries()).unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["session.json".to_string()]);
}

#[test]
fn test_file_store_corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();

    let result = FileStore::new(&path).get(StorageKey::Token);

    assert!(matches!(result, Err(StoreError::Corrupt(_))));
}

// =========================================================================
// Trait plumbing
// =========================================================================

#[test]
fn test_arc_dyn_store_delegates() {
    let memory = MemoryStore::new();
    let shared: Arc<dyn SessionStore> = Arc::new(memory.clone());

    shared.set_many(&login_entries()).unwrap();
    shared.remove(StorageKey::User).unwrap();

    assert_eq!(memory.len(), 3);
    assert_eq!(memory.get(StorageKey::User).unwrap(), None);
}
