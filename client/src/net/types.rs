//! Wire DTOs for the platform's REST API.
//!
//! DESIGN
//! ======
//! The server owns every schema here. Fields the client reads are typed and
//! optional. `User` is decoded leniently from the raw object and keeps
//! everything it does not understand in `extra`, so a persisted session
//! round-trips the server's object unchanged.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The authenticated principal, as returned by login/OTP/profile endpoints.
///
/// Decoding never fails for a JSON object. A known field holding a value of
/// an unexpected type reads as `None` and is left untouched in `extra`, so
/// the object still persists exactly as the server sent it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct User {
    /// Server-side document id (`_id`).
    pub id: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    /// Empty until the account-setup step has been completed.
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub rank: Option<String>,
    pub trader_id: Option<String>,
    pub deposit: Option<f64>,
    pub interest: Option<f64>,
    pub bonus: Option<f64>,
    pub withdraw: Option<f64>,
    /// Every other field the server sent.
    pub extra: Map<String, Value>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

impl From<Map<String, Value>> for User {
    fn from(mut raw: Map<String, Value>) -> Self {
        Self {
            id: take_str(&mut raw, "_id"),
            email: take_str(&mut raw, "email"),
            username: take_str(&mut raw, "username"),
            full_name: take_str(&mut raw, "fullName"),
            role: take_str(&mut raw, "role"),
            rank: take_str(&mut raw, "rank"),
            trader_id: take_str(&mut raw, "traderId"),
            deposit: take_f64(&mut raw, "deposit"),
            interest: take_f64(&mut raw, "interest"),
            bonus: take_f64(&mut raw, "bonus"),
            withdraw: take_f64(&mut raw, "withdraw"),
            extra: raw,
        }
    }
}

impl From<User> for Map<String, Value> {
    fn from(user: User) -> Self {
        let mut out = user.extra;
        let strings = [
            ("_id", user.id),
            ("email", user.email),
            ("username", user.username),
            ("fullName", user.full_name),
            ("role", user.role),
            ("rank", user.rank),
            ("traderId", user.trader_id),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                out.insert(key.to_owned(), Value::String(value));
            }
        }
        let numbers = [
            ("deposit", user.deposit),
            ("interest", user.interest),
            ("bonus", user.bonus),
            ("withdraw", user.withdraw),
        ];
        for (key, value) in numbers {
            if let Some(value) = value {
                out.insert(key.to_owned(), Value::from(value));
            }
        }
        out
    }
}

/// Move `key` out of `raw` only when it holds a string.
fn take_str(raw: &mut Map<String, Value>, key: &str) -> Option<String> {
    if !raw.get(key).is_some_and(Value::is_string) {
        return None;
    }
    match raw.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

/// Move `key` out of `raw` only when it holds a finite number or a numeric
/// string. Balances arrive as either.
fn take_f64(raw: &mut Map<String, Value>, key: &str) -> Option<f64> {
    let parsed = match raw.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())?;
    raw.remove(key);
    Some(parsed)
}

/// Body shape the server uses for plain acknowledgements and errors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response carrying a (possibly updated) user and an optional token.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of endpoints that return only an updated user.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct UserResponse {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// TRANSACTIONS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositMethod {
    Crypto,
    Wire,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_amount: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTransfer {
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub routing_number: String,
    #[serde(default)]
    pub swift_code: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// A deposit, withdrawal, or trade record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub user: TransactionUser,
    pub status: TransactionStatus,
    pub amount: f64,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_data: Option<WalletData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wire_transfer_data: Option<WireTransfer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit_method: Option<DepositMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_data: Option<Value>,
}

impl Transaction {
    /// A deposit still awaiting admin review.
    #[must_use]
    pub fn is_pending_deposit(&self) -> bool {
        self.status == TransactionStatus::Pending && self.kind == "deposit"
    }
}

// =============================================================================
// RANKINGS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub level: u32,
    pub name: String,
    pub minimum_deposit: f64,
    pub direct_referral: u32,
    pub referral_deposits: f64,
    pub bonus: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingsResponse {
    #[serde(default)]
    pub rankings: Vec<Ranking>,
    #[serde(default)]
    pub is_custom: bool,
}

// =============================================================================
// PLATFORM SETTINGS ("utils")
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coin {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_price_update: Option<String>,
    #[serde(default, rename = "change24h", skip_serializing_if = "Option::is_none")]
    pub change_24h: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceMode {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// The singleton settings document: deposit coins, wire details, maintenance.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utils {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub coins: Vec<Coin>,
    #[serde(default)]
    pub wire_transfer: Option<WireTransfer>,
    #[serde(default)]
    pub maintenance_mode: Option<MaintenanceMode>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CoinsResponse {
    #[serde(default)]
    pub coins: Vec<Coin>,
}

/// Body of `GET /utils/maintenance-status`; both fields may be missing.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MaintenanceStatus {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceToggleResponse {
    pub maintenance_mode: MaintenanceMode,
}

// =============================================================================
// ACTIVITY LOGS
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// One admin-audit entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_role: Option<String>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LogLocation>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ActivityLogsResponse {
    #[serde(default)]
    pub logs: Vec<ActivityLog>,
}
