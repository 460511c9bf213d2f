//! Filtering for the admin audit-log view.

#[cfg(test)]
#[path = "activity_test.rs"]
mod activity_test;

use std::collections::BTreeSet;

use crate::net::types::ActivityLog;

/// Action filter value matching every entry.
pub const ALL_ACTIONS: &str = "all";

const ACTION_LABELS: &[(&str, &str)] = &[
    ("admin_login", "Admin Login"),
    ("admin_create_trader", "Trader Created"),
    ("admin_update_trader", "Trader Updated"),
    ("admin_delete_trader", "Trader Deleted"),
    ("admin_update_profile", "User Profile Edited"),
    ("admin_update_user_trader", "User Trader Mapping Edited"),
    ("admin_bulk_delete_users", "Bulk User Delete"),
    ("admin_approve_kyc", "KYC Approved"),
    ("admin_create_trade", "Trade Created"),
    ("admin_update_trade", "Trade Updated"),
    ("admin_delete_trade", "Trade Deleted"),
    ("admin_update_util", "Settings Updated"),
    ("admin_update_maintenance_mode", "Maintenance Updated"),
    ("admin_send_mail", "Bulk Mail Sent"),
    ("update_deposit_status", "Deposit Status Updated"),
    ("update_withdrawal_status", "Withdrawal Status Updated"),
    ("update_transaction", "Transaction Updated"),
    ("delete_transaction", "Transaction Deleted"),
];

/// Human label for an action code; unknown codes are shown raw.
#[must_use]
pub fn action_label(action: &str) -> &str {
    ACTION_LABELS
        .iter()
        .find(|(code, _)| *code == action)
        .map_or(action, |(_, label)| label)
}

/// Distinct non-empty actions, sorted.
#[must_use]
pub fn unique_actions(logs: &[ActivityLog]) -> Vec<String> {
    logs.iter()
        .map(|log| log.action.as_str())
        .filter(|a| !a.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityFilter {
    /// `ALL_ACTIONS` or an exact action code.
    pub action: String,
    /// Case-insensitive substring.
    pub search: String,
}

impl Default for ActivityFilter {
    fn default() -> Self {
        Self { action: ALL_ACTIONS.to_owned(), search: String::new() }
    }
}

impl ActivityFilter {
    #[must_use]
    pub fn matches(&self, log: &ActivityLog) -> bool {
        if self.action != ALL_ACTIONS && log.action != self.action {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }
        let location = log.location.as_ref();
        let haystack = [
            log.actor_email.as_deref(),
            log.target_collection.as_deref(),
            log.target_id.as_deref(),
            log.ip_address.as_deref(),
            location.and_then(|l| l.city.as_deref()),
            location.and_then(|l| l.country.as_deref()),
            Some(action_label(&log.action)),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
        haystack.contains(&self.search.to_lowercase())
    }

    #[must_use]
    pub fn apply<'a>(&self, logs: &'a [ActivityLog]) -> Vec<&'a ActivityLog> {
        logs.iter().filter(|log| self.matches(log)).collect()
    }
}
