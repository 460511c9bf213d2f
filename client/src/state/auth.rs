//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route guards read this to decide between the login page, account setup,
//! and the dashboard. The durable copy lives in `SessionStore`; this struct is
//! the in-memory view of it.
//!
//! DESIGN
//! ======
//! On startup the stored user is only a hint: if it carries an `_id`, the user
//! is re-fetched from the server and shown only once that succeeds. A failed
//! refresh keeps whatever user is already shown and never clears storage, so
//! a failed startup refresh leaves the state signed out.
//!
//! `refresh` can run any number of times (the dashboard re-runs it on every
//! route change into it). Each call reads the target id from the session, so
//! it follows logins and logouts made since startup.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::net::api::{self, ApiError};
use crate::net::fetch::ApiClient;
use crate::net::types::User;
use crate::session::SessionStore;
use crate::storage::StorageError;

#[derive(Clone, Debug, Default)]
pub struct AuthState {
    pub user: Option<User>,
    /// A startup refresh is outstanding; guards should wait.
    pub fetching: bool,
}

impl AuthState {
    /// Initial state from the durable session.
    #[must_use]
    pub fn restore(session: &SessionStore) -> Self {
        Self { user: None, fetching: Self::refresh_target(session).is_some() }
    }

    /// Id of the stored user a refresh would fetch.
    #[must_use]
    pub fn refresh_target(session: &SessionStore) -> Option<String> {
        session.user().and_then(|u| u.id).filter(|id| !id.is_empty())
    }

    /// Re-fetch the stored user. Always ends the `fetching` phase; sends
    /// nothing when the session holds no user id.
    ///
    /// # Errors
    ///
    /// Returns the API error when the refresh failed; the current user is
    /// kept in that case.
    pub async fn refresh(&mut self, client: &ApiClient) -> Result<(), ApiError> {
        let Some(id) = Self::refresh_target(client.session()) else {
            self.fetching = false;
            return Ok(());
        };
        let result = api::fetch_user(client, &id).await;
        self.fetching = false;
        match result {
            Ok(user) => {
                self.user = Some(user);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, user_id = %id, "session refresh failed");
                Err(e)
            }
        }
    }

    /// Adopt `user` (and `token`, when given) as the session.
    ///
    /// # Errors
    ///
    /// Returns the storage error when the session could not be persisted; the
    /// in-memory state is updated regardless.
    pub fn login(&mut self, session: &SessionStore, user: User, token: Option<&str>) -> Result<(), StorageError> {
        let result = session.persist(Some(&user), token);
        self.user = Some(user);
        self.fetching = false;
        result
    }

    /// # Errors
    ///
    /// Returns the storage error when a key could not be removed; the
    /// in-memory state is signed out regardless.
    pub fn logout(&mut self, session: &SessionStore) -> Result<(), StorageError> {
        self.user = None;
        self.fetching = false;
        session.clear()
    }

    /// No user once loading has settled.
    #[must_use]
    pub fn should_redirect_unauth(&self) -> bool {
        !self.fetching && self.user.is_none()
    }

    /// Signed in, but the profile step has not been completed.
    #[must_use]
    pub fn needs_account_setup(&self) -> bool {
        self.user.as_ref().and_then(|u| u.full_name.as_deref()) == Some("")
    }

    /// Deposit plus accrued interest.
    #[must_use]
    pub fn total_balance(&self) -> f64 {
        self.user
            .as_ref()
            .map_or(0.0, |u| u.deposit.unwrap_or(0.0) + u.interest.unwrap_or(0.0))
    }
}
