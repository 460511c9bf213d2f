//! Maintenance-mode banner state.
//!
//! The probe is public and polled; any failure reads as "operational" so a
//! flaky check never locks users out.

#[cfg(test)]
#[path = "maintenance_test.rs"]
mod maintenance_test;

use std::time::Duration;

use crate::net::api::{self, ApiError};
use crate::net::fetch::ApiClient;
use crate::net::types::MaintenanceStatus;

pub const DEFAULT_MAINTENANCE_MESSAGE: &str = "We're currently performing maintenance. Please check back soon.";
pub const POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaintenanceState {
    pub enabled: bool,
    pub message: String,
}

impl Default for MaintenanceState {
    fn default() -> Self {
        Self { enabled: false, message: DEFAULT_MAINTENANCE_MESSAGE.to_owned() }
    }
}

fn message_or_default(message: Option<&str>) -> String {
    match message {
        Some(m) if !m.is_empty() => m.to_owned(),
        _ => DEFAULT_MAINTENANCE_MESSAGE.to_owned(),
    }
}

impl MaintenanceState {
    /// Fold one probe result into the state. Errors keep the message but
    /// switch maintenance off.
    pub fn apply_status(&mut self, result: Result<MaintenanceStatus, ApiError>) {
        match result {
            Ok(status) => {
                self.enabled = status.enabled.unwrap_or(false);
                self.message = message_or_default(status.message.as_deref());
            }
            Err(e) => {
                tracing::warn!(error = %e, "maintenance check failed; assuming operational");
                self.enabled = false;
            }
        }
    }

    /// Probe `GET /utils/maintenance-status`.
    pub async fn check(&mut self, client: &ApiClient) {
        let result = api::maintenance_status(client).await;
        self.apply_status(result);
    }

    /// Switch maintenance mode (admin). Returns whether the server accepted it;
    /// state only changes on success.
    pub async fn toggle(&mut self, client: &ApiClient, enabled: bool, message: Option<&str>) -> bool {
        let message = message_or_default(message);
        match api::set_maintenance_mode(client, enabled, &message).await {
            Ok(mode) => {
                self.enabled = mode.enabled;
                self.message = mode.message;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, enabled, "maintenance toggle failed");
                false
            }
        }
    }
}
