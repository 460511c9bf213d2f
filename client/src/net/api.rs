//! Typed helpers for the platform's REST endpoints.
//!
//! SYSTEM CONTEXT
//! ==============
//! Everything here goes through `ApiClient`, so the bearer contract is applied
//! in one place. Public endpoints (login, signup, OTP, password reset, the
//! settings read and the maintenance probe) opt out of auth explicitly.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses become `ApiError::Status` carrying the server's `message`
//! (or `error`) field when the body has one. Bodies that do not match the
//! expected shape become `ApiError::Decode`. Endpoints that establish or
//! refresh a session persist it before returning; a storage failure there is
//! reported as `ApiError::Storage`.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Value, json};

use super::fetch::ApiClient;
use super::http::HttpResponse;
use super::transport::FetchError;
use super::types::{
    ActivityLog, ActivityLogsResponse, ApiMessage, AuthResponse, Coin, CoinsResponse, DepositMethod, MaintenanceMode,
    MaintenanceStatus, MaintenanceToggleResponse, RankingsResponse, Transaction, TransactionStatus, User,
    UserResponse, Utils, WireTransfer,
};
use crate::storage::StorageError;
use crate::util::validate::{Identifier, round_amount};

/// Session refresh gives up after this long.
pub const FETCH_USER_TIMEOUT: Duration = Duration::from_secs(20);
/// Page size the audit view asks for.
pub const DEFAULT_LOG_LIMIT: u32 = 200;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// HTTP status for `Status` errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn failure_message(resp: &HttpResponse) -> String {
    resp.json::<ApiMessage>()
        .ok()
        .and_then(|m| m.message.or(m.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("request failed: {}", resp.status))
}

fn check(resp: HttpResponse) -> Result<HttpResponse, ApiError> {
    if resp.ok() {
        Ok(resp)
    } else {
        Err(ApiError::Status { status: resp.status, message: failure_message(&resp) })
    }
}

fn decode<T: DeserializeOwned>(resp: HttpResponse) -> Result<T, ApiError> {
    let resp = check(resp)?;
    resp.json().map_err(|e| ApiError::Decode(e.to_string()))
}

/// Like `decode`, but an empty or undecodable 2xx body yields the default.
fn decode_or_default<T: DeserializeOwned + Default>(resp: HttpResponse) -> Result<T, ApiError> {
    let resp = check(resp)?;
    Ok(resp.json().unwrap_or_default())
}

/// Persist whatever user/token an auth response carried.
fn persist_auth(client: &ApiClient, auth: &AuthResponse) -> Result<(), ApiError> {
    if auth.user.is_some() || auth.token.is_some() {
        client.session().persist(auth.user.as_ref(), auth.token.as_deref())?;
        tracing::info!(token = auth.token.is_some(), "session established");
    }
    Ok(())
}

// =============================================================================
// AUTH
// =============================================================================

#[derive(Serialize)]
struct LoginBody<'a> {
    password: &'a str,
    email: &'a str,
    username: &'a str,
}

/// `POST /users/login`. `identifier` is an email when it looks like one,
/// otherwise a username; the unused field is sent empty.
///
/// # Errors
///
/// Returns `ApiError` on transport failure, non-2xx status, or when the
/// returned session cannot be stored.
pub async fn login(client: &ApiClient, identifier: &str, password: &str) -> Result<AuthResponse, ApiError> {
    let id = Identifier::parse(identifier);
    let body = LoginBody {
        password,
        email: id.email().unwrap_or_default(),
        username: id.username().unwrap_or_default(),
    };
    let resp = client.post("/users/login").json(&body).without_auth().send().await?;
    let auth: AuthResponse = decode(resp)?;
    persist_auth(client, &auth)?;
    Ok(auth)
}

/// Fields of the registration form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signup {
    pub email: String,
    pub username: String,
    pub password: String,
    pub referred_by: String,
}

/// `POST /users/signup`. The server answers by sending a verification code.
///
/// # Errors
///
/// Returns `ApiError` on transport failure or non-2xx status.
pub async fn signup(client: &ApiClient, form: &Signup) -> Result<ApiMessage, ApiError> {
    let resp = client.post("/users/signup").json(form).without_auth().send().await?;
    decode_or_default(resp)
}

/// Which flow a one-time code confirms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OtpPurpose {
    RegisterVerification,
    LoginVerification,
    ResetPassword,
    WithdrawVerification,
}

impl OtpPurpose {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RegisterVerification => "register-verification",
            Self::LoginVerification => "login-verification",
            Self::ResetPassword => "reset-password",
            Self::WithdrawVerification => "withdraw-verification",
        }
    }
}

/// Data carried over from the step that triggered the code.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OtpContext {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub amount: Option<f64>,
    pub address: Option<String>,
}

fn otp_body(otp: &str, purpose: OtpPurpose, ctx: &OtpContext) -> Value {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let mut body = json!({ "otp": otp, "type": purpose });
    let extra = match purpose {
        OtpPurpose::RegisterVerification | OtpPurpose::ResetPassword | OtpPurpose::LoginVerification => json!({
            "email": text(&ctx.email),
            "username": text(&ctx.username),
            "password": text(&ctx.password),
        }),
        OtpPurpose::WithdrawVerification => json!({
            "email": text(&ctx.email),
            "username": text(&ctx.username),
            "amount": ctx.amount,
            "address": text(&ctx.address),
        }),
    };
    if let (Some(map), Value::Object(extra)) = (body.as_object_mut(), extra) {
        map.extend(extra);
    }
    body
}

/// `POST /users/verify-otp`. A returned user (and token) becomes the session.
///
/// # Errors
///
/// Returns `ApiError` on transport failure, non-2xx status, or when the
/// returned session cannot be stored.
pub async fn verify_otp(
    client: &ApiClient,
    otp: &str,
    purpose: OtpPurpose,
    ctx: &OtpContext,
) -> Result<AuthResponse, ApiError> {
    let resp = client
        .post("/users/verify-otp")
        .json(&otp_body(otp, purpose, ctx))
        .without_auth()
        .send()
        .await?;
    let auth: AuthResponse = decode(resp)?;
    persist_auth(client, &auth)?;
    Ok(auth)
}

/// `POST /users/resend-otp`.
///
/// # Errors
///
/// Returns `ApiError` on transport failure or non-2xx status.
pub async fn resend_otp(client: &ApiClient, purpose: OtpPurpose, ctx: &OtpContext) -> Result<(), ApiError> {
    let body = json!({
        "type": purpose,
        "email": ctx.email,
        "username": ctx.username,
        "phoneNumber": ctx.phone_number,
    });
    let resp = client.post("/users/resend-otp").json(&body).without_auth().send().await?;
    check(resp).map(drop)
}

/// `PUT /users/reset-password`. `identifier` is sent as `email` when it
/// contains `@`, otherwise as `username`.
///
/// # Errors
///
/// Returns `ApiError` on transport failure or non-2xx status.
pub async fn reset_password(client: &ApiClient, identifier: &str, password: &str) -> Result<ApiMessage, ApiError> {
    let body = match Identifier::parse_loose(identifier) {
        Identifier::Email(email) => json!({ "email": email, "password": password }),
        Identifier::Username(username) => json!({ "username": username, "password": password }),
    };
    let resp = client.put("/users/reset-password").json(&body).without_auth().send().await?;
    decode_or_default(resp)
}

// =============================================================================
// USERS
// =============================================================================

/// `GET /users/{id}`: refresh the stored user. The token is left as is.
///
/// # Errors
///
/// Returns `ApiError` on transport failure (including the 20 second timeout),
/// non-2xx status, a response without a user, or a storage failure.
pub async fn fetch_user(client: &ApiClient, user_id: &str) -> Result<User, ApiError> {
    let resp = client
        .get(&format!("/users/{user_id}"))
        .timeout(FETCH_USER_TIMEOUT)
        .send()
        .await?;
    let body: UserResponse = decode(resp)?;
    let user = body.user.ok_or_else(|| ApiError::Decode("response has no user".to_owned()))?;
    client.session().persist(Some(&user), None)?;
    Ok(user)
}

/// `PUT /users/update-profile` (admin). `profile` is the partial user object
/// to apply, keyed by the server's field names.
///
/// # Errors
///
/// Returns `ApiError` on transport failure or non-2xx status.
pub async fn update_profile(client: &ApiClient, profile: &Value) -> Result<UserResponse, ApiError> {
    let resp = client.put("/users/update-profile").json(profile).send().await?;
    decode_or_default(resp)
}

/// `PUT /users/reset-rank-to-auto` (admin). Returns the recomputed rank.
///
/// # Errors
///
/// Returns `ApiError` on transport failure or non-2xx status.
pub async fn reset_rank_to_auto(client: &ApiClient, email: &str) -> Result<Option<String>, ApiError> {
    let resp = client
        .put("/users/reset-rank-to-auto")
        .json(&json!({ "email": email }))
        .send()
        .await?;
    let body: UserResponse = decode_or_default(resp)?;
    Ok(body.user.and_then(|u| u.rank))
}

/// `GET /users/rankings/{email}`.
///
/// # Errors
///
/// Returns `ApiError` on transport failure, non-2xx status, or an unexpected
/// body. Callers fall back to `state::rankings::default_rankings`.
pub async fn rankings(client: &ApiClient, email: &str) -> Result<RankingsResponse, ApiError> {
    let resp = client.get(&format!("/users/rankings/{email}")).send().await?;
    decode(resp)
}

/// `GET /users` (admin).
///
/// # Errors
///
/// Returns `ApiError` on transport failure, non-2xx status, or an unexpected
/// body.
pub async fn list_users(client: &ApiClient) -> Result<Vec<User>, ApiError> {
    let resp = client.get("/users").send().await?;
    decode(resp)
}

/// `DELETE /users` (admin).
///
/// # Errors
///
/// Returns `ApiError` on transport failure or non-2xx status.
pub async fn delete_users(client: &ApiClient, user_ids: &[&str]) -> Result<ApiMessage, ApiError> {
    let resp = client.delete("/users").json(&json!({ "userIds": user_ids })).send().await?;
    decode_or_default(resp)
}

/// `GET /activity-logs?limit=N` (admin).
///
/// # Errors
///
/// Returns `ApiError` on transport failure, non-2xx status, or an unexpected
/// body.
pub async fn activity_logs(client: &ApiClient, limit: u32) -> Result<Vec<ActivityLog>, ApiError> {
    let resp = client.get(&format!("/activity-logs?limit={limit}")).send().await?;
    let body: ActivityLogsResponse = decode(resp)?;
    Ok(body.logs)
}

// =============================================================================
// SETTINGS
// =============================================================================

/// `GET /utils`: the public settings document.
///
/// # Errors
///
/// Returns `ApiError` on transport failure, non-2xx status, or an unexpected
/// body.
pub async fn utils(client: &ApiClient) -> Result<Utils, ApiError> {
    let resp = client.get("/utils").without_auth().send().await?;
    decode(resp)
}

/// `GET /utils/coins-with-prices`.
///
/// # Errors
///
/// Returns `ApiError` on transport failure, non-2xx status, or an unexpected
/// body.
pub async fn coins_with_prices(client: &ApiClient) -> Result<Vec<Coin>, ApiError> {
    let resp = client.get("/utils/coins-with-prices").send().await?;
    let body: CoinsResponse = decode(resp)?;
    Ok(body.coins)
}

/// Coins offered for deposit: the priced list when it is non-empty,
/// otherwise the unpriced coins from the settings document.
///
/// # Errors
///
/// Returns `ApiError` only when the settings fallback also fails.
pub async fn deposit_coins(client: &ApiClient) -> Result<Vec<Coin>, ApiError> {
    match coins_with_prices(client).await {
        Ok(coins) if !coins.is_empty() => return Ok(coins),
        Ok(_) => tracing::debug!("priced coin list empty; using settings coins"),
        Err(e) => tracing::warn!(error = %e, "priced coin list unavailable; using settings coins"),
    }
    Ok(utils(client).await?.coins)
}

/// Partial update of the settings document, sent as `{"coins": [...]}` or
/// `{"wireTransfer": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UtilsUpdate {
    Coins(Vec<Coin>),
    WireTransfer(WireTransfer),
}

/// `PUT /utils/update/{id}` (admin).
///
/// # Errors
///
/// Returns `ApiError` on transport failure or non-2xx status.
pub async fn update_utils(client: &ApiClient, utils_id: &str, update: &UtilsUpdate) -> Result<ApiMessage, ApiError> {
    let resp = client
        .put(&format!("/utils/update/{utils_id}"))
        .json(update)
        .send()
        .await?;
    decode_or_default(resp)
}

/// `GET /utils/maintenance-status`. Sent without auth so it works while
/// signed out.
///
/// # Errors
///
/// Returns `ApiError` on transport failure or non-2xx status.
pub async fn maintenance_status(client: &ApiClient) -> Result<MaintenanceStatus, ApiError> {
    let resp = client.get("/utils/maintenance-status").without_auth().send().await?;
    decode_or_default(resp)
}

/// `PUT /utils/maintenance-mode` (admin).
///
/// # Errors
///
/// Returns `ApiError` on transport failure, non-2xx status, or an unexpected
/// body.
pub async fn set_maintenance_mode(client: &ApiClient, enabled: bool, message: &str) -> Result<MaintenanceMode, ApiError> {
    let resp = client
        .put("/utils/maintenance-mode")
        .json(&json!({ "enabled": enabled, "message": message }))
        .send()
        .await?;
    let body: MaintenanceToggleResponse = decode(resp)?;
    Ok(body.maintenance_mode)
}

// =============================================================================
// DEPOSITS & TRADES
// =============================================================================

/// Body of `POST /deposits`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    /// The depositing user's id.
    pub id: String,
    pub amount: f64,
    pub deposit_method: DepositMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coin_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wire_transfer_data: Option<WireTransfer>,
}

impl DepositRequest {
    /// A crypto deposit of `amount` (fiat) paid in `coin` at its listed price.
    #[must_use]
    pub fn crypto(user_id: &str, amount: f64, coin: &Coin) -> Self {
        let converted = if coin.price > 0.0 { round_amount(amount / coin.price) } else { 0.0 };
        Self {
            id: user_id.to_owned(),
            amount,
            deposit_method: DepositMethod::Crypto,
            converted_amount: Some(converted),
            coin_name: Some(coin.name.clone()),
            wire_transfer_data: None,
        }
    }

    #[must_use]
    pub fn wire(user_id: &str, amount: f64, wire: WireTransfer) -> Self {
        Self {
            id: user_id.to_owned(),
            amount,
            deposit_method: DepositMethod::Wire,
            converted_amount: None,
            coin_name: None,
            wire_transfer_data: Some(wire),
        }
    }
}

/// `POST /deposits`.
///
/// # Errors
///
/// Returns `ApiError` on transport failure or non-2xx status.
pub async fn create_deposit(client: &ApiClient, deposit: &DepositRequest) -> Result<ApiMessage, ApiError> {
    let resp = client.post("/deposits").json(deposit).send().await?;
    decode_or_default(resp)
}

/// `GET /deposits/user/{email}`.
///
/// # Errors
///
/// Returns `ApiError` on transport failure, non-2xx status, or an unexpected
/// body.
pub async fn user_deposits(client: &ApiClient, email: &str) -> Result<Vec<Transaction>, ApiError> {
    let resp = client.get(&format!("/deposits/user/{email}")).send().await?;
    decode(resp)
}

/// The user's deposit still awaiting review, if any.
///
/// # Errors
///
/// Same as `user_deposits`.
pub async fn pending_deposit(client: &ApiClient, email: &str) -> Result<Option<Transaction>, ApiError> {
    Ok(user_deposits(client, email)
        .await?
        .into_iter()
        .find(Transaction::is_pending_deposit))
}

/// `PUT /deposits/{id}` (admin): approve or reject.
///
/// # Errors
///
/// Returns `ApiError` on transport failure or non-2xx status.
pub async fn update_deposit_status(
    client: &ApiClient,
    deposit: &Transaction,
    status: TransactionStatus,
) -> Result<ApiMessage, ApiError> {
    let body = json!({ "status": status, "email": deposit.user.email, "amount": deposit.amount });
    let resp = client.put(&format!("/deposits/{}", deposit.id)).json(&body).send().await?;
    decode_or_default(resp)
}

/// `DELETE /deposits/{id}`.
///
/// # Errors
///
/// Returns `ApiError` on transport failure or non-2xx status.
pub async fn cancel_deposit(client: &ApiClient, deposit_id: &str) -> Result<ApiMessage, ApiError> {
    let resp = client.delete(&format!("/deposits/{deposit_id}")).send().await?;
    decode_or_default(resp)
}

/// `GET /trades/user/{userId}/trader/{traderId}`: trades copied from a trader.
///
/// # Errors
///
/// Returns `ApiError` on transport failure, non-2xx status, or an unexpected
/// body.
pub async fn user_trades(client: &ApiClient, user_id: &str, trader_id: &str) -> Result<Vec<Transaction>, ApiError> {
    let resp = client
        .get(&format!("/trades/user/{user_id}/trader/{trader_id}"))
        .send()
        .await?;
    decode(resp)
}
