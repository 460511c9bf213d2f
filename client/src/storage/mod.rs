//! Durable key-value storage behind the session store.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store only needs string get/set/remove. Backends isolate the
//! environment: `MemoryStorage` for tests and ephemeral runs, `FileStorage`
//! for native processes, and `LocalStorage` for the browser (`hydrate`).
//!
//! Each call is one key operation. No backend offers multi-key transactions.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

pub mod file;
#[cfg(feature = "hydrate")]
pub mod local;
pub mod memory;

pub use file::FileStorage;
#[cfg(feature = "hydrate")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Failure reported by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend cannot be reached at all (disabled storage, poisoned lock).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// Reading or writing the backing medium failed.
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// A value could not be serialized before writing.
    #[error("storage serialize failed: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The key cannot be mapped onto the backend.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// String key-value storage with synchronous, per-key durable writes.
pub trait Storage: Send + Sync {
    /// Read `key`, returning `None` when it was never written or was removed.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
