//! Durable session: the signed-in user and their bearer token.
//!
//! SYSTEM CONTEXT
//! ==============
//! Login, OTP verification and profile refresh write here; every outbound
//! request reads the token here. `SessionStore` is a cheap handle over a shared
//! `Storage`, created once by the composition root and cloned to consumers.
//!
//! ERROR HANDLING
//! ==============
//! Reads never fail. A storage error or a corrupt `user` value reads as "no
//! session"; nothing is repaired or cleared on read.


use std::sync::Arc;

use serde_json::Value;

use crate::net::types::User;
use crate::storage::{MemoryStorage, Storage, StorageError};

/// Storage key holding the JSON-serialized user object.
pub const USER_KEY: &str = "user";
/// Storage key holding the raw bearer token.
pub const TOKEN_KEY: &str = "authToken";

#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// A store that forgets everything when the process exits.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Current bearer token, or `None` when absent, empty, or unreadable.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::debug!(error = %e, "token lookup failed; treating as signed out");
                None
            }
        }
    }

    /// `Authorization` header value for the current token.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.token().map(|t| format!("Bearer {t}"))
    }

    /// Persisted user, or `None` when absent, unreadable, or not a JSON object.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        let raw = match self.storage.get(USER_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(error = %e, "user lookup failed; treating as signed out");
                return None;
            }
        };
        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "stored user is not valid JSON; ignoring session");
                return None;
            }
        };
        if !value.is_object() {
            tracing::warn!("stored user is not a JSON object; ignoring session");
            return None;
        }
        match serde_json::from_value(value) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "stored user has unexpected field types; ignoring session");
                None
            }
        }
    }

    /// Write the user (when given) and the token (when given and non-empty).
    ///
    /// Omitting the token leaves any stored token in place.
    ///
    /// # Errors
    ///
    /// Returns the first storage write failure.
    pub fn persist(&self, user: Option<&User>, token: Option<&str>) -> Result<(), StorageError> {
        if let Some(user) = user {
            let raw = serde_json::to_string(user)?;
            self.storage.set(USER_KEY, &raw)?;
        }
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.storage.set(TOKEN_KEY, token)?;
        }
        Ok(())
    }

    /// Remove both the user and the token.
    ///
    /// Both removals are attempted even if the first fails.
    ///
    /// # Errors
    ///
    /// Returns the first removal failure.
    pub fn clear(&self) -> Result<(), StorageError> {
        let user = self.storage.remove(USER_KEY);
        let token = self.storage.remove(TOKEN_KEY);
        user.and(token)
    }
}
