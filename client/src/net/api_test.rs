use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::net::http::{AUTHORIZATION, Method};
use crate::net::testing::RecordingTransport;
use crate::session::SessionStore;

const BASE: &str = "https://api.example.test";

fn client() -> (ApiClient, Arc<RecordingTransport>) {
    let transport = RecordingTransport::new();
    let client = ApiClient::new(BASE, SessionStore::in_memory(), transport.clone());
    (client, transport)
}

fn signed_in() -> (ApiClient, Arc<RecordingTransport>) {
    let (client, transport) = client();
    client.session().persist(None, Some("tok-abc")).unwrap();
    (client, transport)
}

fn sent_json(transport: &RecordingTransport) -> serde_json::Value {
    serde_json::from_str(transport.last().body.as_text().unwrap()).unwrap()
}

fn deposit_json(id: &str, status: &str, kind: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "type": kind,
        "user": { "id": "u1", "email": "ada@example.test", "name": "Ada" },
        "status": status,
        "amount": 500,
        "date": "2024-05-01T00:00:00Z"
    })
}

// =============================================================
// Error mapping
// =============================================================

#[tokio::test]
async fn non_2xx_uses_server_message() {
    let (client, transport) = signed_in();
    transport.respond(404, r#"{"message":"User not found"}"#);

    let err = fetch_user(&client, "zz").await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(matches!(err, ApiError::Status { ref message, .. } if message == "User not found"));
}

#[tokio::test]
async fn non_2xx_falls_back_to_error_field_then_status() {
    let (client, transport) = signed_in();
    transport.respond(500, r#"{"error":"boom"}"#);
    transport.respond(502, "<html>bad gateway</html>");

    let first = list_users(&client).await.unwrap_err();
    let second = list_users(&client).await.unwrap_err();

    assert_eq!(first.to_string(), "boom (status 500)");
    assert!(matches!(second, ApiError::Status { status: 502, ref message } if message == "request failed: 502"));
}

#[tokio::test]
async fn malformed_success_body_is_decode_error() {
    let (client, transport) = signed_in();
    transport.respond(200, r#"{"rankings": "nope"}"#);

    let err = rankings(&client, "ada@example.test").await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn transport_failure_is_fetch_error() {
    let (client, transport) = signed_in();
    transport.fail(FetchError::Timeout);

    let err = utils(&client).await.unwrap_err();

    assert!(matches!(err, ApiError::Fetch(FetchError::Timeout)));
    assert_eq!(err.status(), None);
}

// =============================================================
// Auth flows
// =============================================================

#[tokio::test]
async fn login_with_email_persists_session() {
    let (client, transport) = client();
    transport.respond(200, r#"{"user":{"_id":"u1","email":"ada@example.test"},"token":"tok-new"}"#);

    let auth = login(&client, "ada@example.test", "hunter22").await.unwrap();

    assert_eq!(auth.user.and_then(|u| u.id).as_deref(), Some("u1"));
    let sent = transport.last();
    assert_eq!(sent.method, Method::Post);
    assert_eq!(sent.url, format!("{BASE}/users/login"));
    assert!(!sent.headers.has(AUTHORIZATION));
    assert_eq!(
        sent_json(&transport),
        json!({ "password": "hunter22", "email": "ada@example.test", "username": "" })
    );
    assert_eq!(client.session().token().as_deref(), Some("tok-new"));
    assert_eq!(client.session().user().and_then(|u| u.id).as_deref(), Some("u1"));
}

#[tokio::test]
async fn login_persists_session_despite_odd_user_fields() {
    let (client, transport) = client();
    transport.respond(200, r#"{"user":{"_id":"u1","deposit":"N/A"},"token":"tok-abc"}"#);

    let auth = login(&client, "ada@example.test", "pw").await.unwrap();

    assert_eq!(auth.user.as_ref().and_then(|u| u.deposit), None);
    assert_eq!(client.session().token().as_deref(), Some("tok-abc"));
    let stored = client.session().user().unwrap();
    assert_eq!(stored.id.as_deref(), Some("u1"));
    assert_eq!(stored.extra.get("deposit"), Some(&json!("N/A")));
}

#[tokio::test]
async fn login_with_username_sends_empty_email() {
    let (client, transport) = client();
    transport.respond(200, r#"{"user":{"_id":"u1"}}"#);

    login(&client, "ada", "pw").await.unwrap();

    assert_eq!(sent_json(&transport), json!({ "password": "pw", "email": "", "username": "ada" }));
    // No token in the response: requests keep going out anonymously.
    assert_eq!(client.session().token(), None);
}

#[tokio::test]
async fn login_failure_leaves_session_untouched() {
    let (client, transport) = signed_in();
    transport.respond(401, r#"{"message":"Invalid credentials"}"#);

    let err = login(&client, "ada", "wrong").await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(client.session().token().as_deref(), Some("tok-abc"));
}

#[tokio::test]
async fn signup_skips_auth_and_sends_referral() {
    let (client, transport) = signed_in();
    let form = Signup {
        email: "ada@example.test".to_owned(),
        username: "ada".to_owned(),
        password: "longenough".to_owned(),
        referred_by: "grace".to_owned(),
    };

    signup(&client, &form).await.unwrap();

    assert!(!transport.last().headers.has(AUTHORIZATION));
    assert_eq!(sent_json(&transport)["referredBy"], "grace");
}

#[tokio::test]
async fn verify_otp_register_sends_credentials_and_persists() {
    let (client, transport) = client();
    transport.respond(200, r#"{"user":{"_id":"u9","email":"ada@example.test"},"token":"tok-otp"}"#);
    let ctx = OtpContext {
        email: Some("ada@example.test".to_owned()),
        username: Some("ada".to_owned()),
        password: Some("longenough".to_owned()),
        ..OtpContext::default()
    };

    verify_otp(&client, "123456", OtpPurpose::RegisterVerification, &ctx).await.unwrap();

    let body = sent_json(&transport);
    assert_eq!(body["otp"], "123456");
    assert_eq!(body["type"], "register-verification");
    assert_eq!(body["username"], "ada");
    assert_eq!(client.session().token().as_deref(), Some("tok-otp"));
}

#[tokio::test]
async fn verify_otp_withdraw_sends_amount_and_address() {
    let (client, transport) = client();
    let ctx = OtpContext {
        email: Some("ada@example.test".to_owned()),
        amount: Some(250.0),
        address: Some("bc1qxyz".to_owned()),
        ..OtpContext::default()
    };

    verify_otp(&client, "654321", OtpPurpose::WithdrawVerification, &ctx).await.unwrap();

    let body = sent_json(&transport);
    assert_eq!(body["type"], "withdraw-verification");
    assert_eq!(body["amount"], 250.0);
    assert_eq!(body["address"], "bc1qxyz");
    assert_eq!(body["username"], "");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn resend_otp_posts_contact_details() {
    let (client, transport) = client();
    let ctx = OtpContext { phone_number: Some("+15550100".to_owned()), ..OtpContext::default() };

    resend_otp(&client, OtpPurpose::LoginVerification, &ctx).await.unwrap();

    let body = sent_json(&transport);
    assert_eq!(transport.last().url, format!("{BASE}/users/resend-otp"));
    assert_eq!(body["type"], "login-verification");
    assert_eq!(body["phoneNumber"], "+15550100");
}

#[tokio::test]
async fn reset_password_picks_field_by_at_sign() {
    let (client, transport) = client();

    reset_password(&client, "ada@local", "secret1").await.unwrap();
    assert_eq!(sent_json(&transport), json!({ "email": "ada@local", "password": "secret1" }));

    reset_password(&client, "ada", "secret1").await.unwrap();
    assert_eq!(sent_json(&transport), json!({ "username": "ada", "password": "secret1" }));
    assert_eq!(transport.last().method, Method::Put);
}

// =============================================================
// Users
// =============================================================

#[tokio::test]
async fn fetch_user_refreshes_user_but_not_token() {
    let (client, transport) = signed_in();
    transport.respond(200, r#"{"user":{"_id":"u1","fullName":"Ada Lovelace"}}"#);

    let user = fetch_user(&client, "u1").await.unwrap();

    assert_eq!(user.full_name.as_deref(), Some("Ada Lovelace"));
    let sent = transport.last();
    assert_eq!(sent.timeout, Some(FETCH_USER_TIMEOUT));
    assert_eq!(sent.headers.get(AUTHORIZATION), Some("Bearer tok-abc"));
    assert_eq!(client.session().token().as_deref(), Some("tok-abc"));
    assert_eq!(client.session().user().unwrap().full_name.as_deref(), Some("Ada Lovelace"));
}

#[tokio::test]
async fn fetch_user_without_user_is_decode_error() {
    let (client, transport) = signed_in();
    transport.respond(200, r#"{"message":"ok"}"#);

    assert!(matches!(fetch_user(&client, "u1").await, Err(ApiError::Decode(_))));
}

#[tokio::test]
async fn delete_users_sends_ids_with_auth() {
    let (client, transport) = signed_in();

    delete_users(&client, &["u1", "u2"]).await.unwrap();

    let sent = transport.last();
    assert_eq!(sent.method, Method::Delete);
    assert_eq!(sent.headers.get(AUTHORIZATION), Some("Bearer tok-abc"));
    assert_eq!(sent_json(&transport), json!({ "userIds": ["u1", "u2"] }));
}

#[tokio::test]
async fn reset_rank_returns_new_rank() {
    let (client, transport) = signed_in();
    transport.respond(200, r#"{"user":{"_id":"u1","rank":"gold"}}"#);

    let rank = reset_rank_to_auto(&client, "ada@example.test").await.unwrap();

    assert_eq!(rank.as_deref(), Some("gold"));
    assert_eq!(sent_json(&transport), json!({ "email": "ada@example.test" }));
}

#[tokio::test]
async fn activity_logs_passes_limit() {
    let (client, transport) = signed_in();
    transport.respond(
        200,
        r#"{"logs":[{"_id":"l1","action":"admin_login","createdAt":"2024-05-01T00:00:00Z"}]}"#,
    );

    let logs = activity_logs(&client, DEFAULT_LOG_LIMIT).await.unwrap();

    assert_eq!(logs.len(), 1);
    assert_eq!(transport.last().url, format!("{BASE}/activity-logs?limit=200"));
}

// =============================================================
// Settings
// =============================================================

#[tokio::test]
async fn maintenance_status_skips_auth_and_tolerates_empty_body() {
    let (client, transport) = signed_in();
    transport.respond(200, "");

    let status = maintenance_status(&client).await.unwrap();

    assert_eq!(status, MaintenanceStatus::default());
    assert!(!transport.last().headers.has(AUTHORIZATION));
}

#[tokio::test]
async fn set_maintenance_mode_returns_server_state() {
    let (client, transport) = signed_in();
    transport.respond(200, r#"{"maintenanceMode":{"enabled":true,"message":"Back at 5"}}"#);

    let mode = set_maintenance_mode(&client, true, "Back at 5").await.unwrap();

    assert!(mode.enabled);
    assert_eq!(sent_json(&transport), json!({ "enabled": true, "message": "Back at 5" }));
}

#[tokio::test]
async fn deposit_coins_falls_back_when_priced_list_empty() {
    let (client, transport) = signed_in();
    transport.respond(200, r#"{"coins":[]}"#);
    transport.respond(200, r#"{"coins":[{"name":"USDT","address":"T1","network":"TRC20"}]}"#);

    let coins = deposit_coins(&client).await.unwrap();

    assert_eq!(coins.len(), 1);
    assert_eq!(coins[0].name, "USDT");
    let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(urls, [format!("{BASE}/utils/coins-with-prices"), format!("{BASE}/utils")]);
}

#[tokio::test]
async fn deposit_coins_prefers_priced_list() {
    let (client, transport) = signed_in();
    transport.respond(200, r#"{"coins":[{"name":"BTC","price":60000}]}"#);

    let coins = deposit_coins(&client).await.unwrap();

    assert_eq!(coins[0].name, "BTC");
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn update_utils_wraps_field_name() {
    let (client, transport) = signed_in();
    let wire = WireTransfer { bank_name: "First Bank".to_owned(), ..WireTransfer::default() };

    update_utils(&client, "s1", &UtilsUpdate::WireTransfer(wire)).await.unwrap();

    assert_eq!(transport.last().url, format!("{BASE}/utils/update/s1"));
    assert_eq!(sent_json(&transport)["wireTransfer"]["bankName"], "First Bank");
}

// =============================================================
// Deposits
// =============================================================

#[test]
fn crypto_deposit_converts_at_coin_price() {
    let coin: Coin = serde_json::from_value(json!({ "name": "BTC", "price": 60000 })).unwrap();

    let req = DepositRequest::crypto("u1", 3000.0, &coin);
    let body = serde_json::to_value(&req).unwrap();

    assert_eq!(body["depositMethod"], "crypto");
    assert_eq!(body["coinName"], "BTC");
    assert_eq!(body["convertedAmount"], 0.05);
    assert!(body.get("wireTransferData").is_none());
}

#[test]
fn wire_deposit_carries_transfer_details() {
    let req = DepositRequest::wire("u1", 1000.0, WireTransfer::default());
    let body = serde_json::to_value(&req).unwrap();

    assert_eq!(body["depositMethod"], "wire");
    assert!(body.get("coinName").is_none());
    assert!(body["wireTransferData"].is_object());
}

#[tokio::test]
async fn pending_deposit_finds_pending_deposit_only() {
    let (client, transport) = signed_in();
    let list = json!([
        deposit_json("t1", "success", "deposit"),
        deposit_json("t2", "pending", "withdrawal"),
        deposit_json("t3", "pending", "deposit"),
    ]);
    transport.respond(200, &list.to_string());

    let pending = pending_deposit(&client, "ada@example.test").await.unwrap();

    assert_eq!(pending.map(|t| t.id).as_deref(), Some("t3"));
    assert_eq!(transport.last().url, format!("{BASE}/deposits/user/ada@example.test"));
}

#[tokio::test]
async fn update_deposit_status_sends_status_email_amount() {
    let (client, transport) = signed_in();
    let deposit: Transaction = serde_json::from_value(deposit_json("t3", "pending", "deposit")).unwrap();

    update_deposit_status(&client, &deposit, TransactionStatus::Success).await.unwrap();

    assert_eq!(transport.last().url, format!("{BASE}/deposits/t3"));
    assert_eq!(
        sent_json(&transport),
        json!({ "status": "success", "email": "ada@example.test", "amount": 500.0 })
    );
}

#[tokio::test]
async fn cancel_deposit_deletes_by_id() {
    let (client, transport) = signed_in();

    cancel_deposit(&client, "t3").await.unwrap();

    let sent = transport.last();
    assert_eq!(sent.method, Method::Delete);
    assert_eq!(sent.url, format!("{BASE}/deposits/t3"));
}

#[tokio::test]
async fn user_trades_path_includes_trader() {
    let (client, transport) = signed_in();
    transport.respond(200, "[]");

    let trades = user_trades(&client, "u1", "tr7").await.unwrap();

    assert!(trades.is_empty());
    assert_eq!(transport.last().url, format!("{BASE}/trades/user/u1/trader/tr7"));
}
