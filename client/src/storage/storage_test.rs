use super::*;

// =============================================================
// MemoryStorage
// =============================================================

#[test]
fn memory_get_missing_is_none() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get("user").unwrap(), None);
}

#[test]
fn memory_set_then_get() {
    let storage = MemoryStorage::new();
    storage.set("authToken", "tok").unwrap();
    assert_eq!(storage.get("authToken").unwrap().as_deref(), Some("tok"));
}

#[test]
fn memory_set_overwrites() {
    let storage = MemoryStorage::new();
    storage.set("authToken", "a").unwrap();
    storage.set("authToken", "b").unwrap();
    assert_eq!(storage.get("authToken").unwrap().as_deref(), Some("b"));
}

#[test]
fn memory_remove_missing_is_ok() {
    let storage = MemoryStorage::new();
    storage.remove("nope").unwrap();
    storage.set("k", "v").unwrap();
    storage.remove("k").unwrap();
    assert_eq!(storage.get("k").unwrap(), None);
}

// =============================================================
// FileStorage
// =============================================================

#[test]
fn file_get_before_dir_exists_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("missing"));
    assert_eq!(storage.get("user").unwrap(), None);
    assert!(!storage.dir().exists());
}

#[test]
fn file_values_survive_new_instance() {
    let dir = tempfile::tempdir().unwrap();
    FileStorage::new(dir.path()).set("authToken", "tok-abc").unwrap();

    let reopened = FileStorage::new(dir.path());
    assert_eq!(reopened.get("authToken").unwrap().as_deref(), Some("tok-abc"));
}

#[test]
fn file_remove_deletes_key() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    storage.set("user", "{}").unwrap();
    storage.remove("user").unwrap();
    storage.remove("user").unwrap();
    assert_eq!(storage.get("user").unwrap(), None);
}

#[test]
fn file_rejects_path_like_keys() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    assert!(matches!(storage.set("../escape", "x"), Err(StorageError::InvalidKey(_))));
    assert!(matches!(storage.get(""), Err(StorageError::InvalidKey(_))));
}
