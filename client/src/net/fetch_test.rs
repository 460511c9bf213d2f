use std::collections::HashMap;

use serde_json::json;

use super::*;
use crate::net::testing::RecordingTransport;
use crate::net::types::User;

const BASE: &str = "https://api.example.test";

fn client() -> (ApiClient, Arc<RecordingTransport>) {
    let transport = RecordingTransport::new();
    let client = ApiClient::new(BASE, SessionStore::in_memory(), transport.clone());
    (client, transport)
}

fn u1() -> User {
    serde_json::from_value(json!({ "_id": "u1" })).unwrap()
}

// =============================================================
// URL resolution
// =============================================================

#[test]
fn url_joins_relative_paths() {
    let (client, _) = client();
    assert_eq!(client.url("/users/login"), "https://api.example.test/users/login");
    assert_eq!(client.url("utils"), "https://api.example.test/utils");
    assert_eq!(client.url("http://other.test/x"), "http://other.test/x");
}

#[test]
fn base_url_trailing_slash_is_trimmed() {
    let client = ApiClient::new("https://api.example.test/", SessionStore::in_memory(), RecordingTransport::new());
    assert_eq!(client.base_url(), BASE);
}

// =============================================================
// Bearer attachment
// =============================================================

#[tokio::test]
async fn get_with_token_attaches_bearer() {
    let (client, transport) = client();
    client.session().persist(Some(&u1()), Some("tok-abc")).unwrap();

    client.get("/users/u1").send().await.unwrap();

    let sent = transport.last();
    assert_eq!(sent.method, Method::Get);
    assert_eq!(sent.headers.get(AUTHORIZATION), Some("Bearer tok-abc"));
}

#[tokio::test]
async fn get_without_token_has_no_authorization() {
    let (client, transport) = client();

    client.get("/users/u1").send().await.unwrap();

    assert!(!transport.last().headers.has(AUTHORIZATION));
}

#[tokio::test]
async fn get_after_clear_has_no_authorization() {
    let (client, transport) = client();
    client.session().persist(Some(&u1()), Some("tok-abc")).unwrap();
    client.session().clear().unwrap();

    client.get("/users/u1").send().await.unwrap();

    assert!(!transport.last().headers.has(AUTHORIZATION));
}

#[tokio::test]
async fn skip_auth_never_attaches_token() {
    let (client, transport) = client();
    client.session().persist(None, Some("tok-abc")).unwrap();

    client.get("/utils").without_auth().send().await.unwrap();
    client
        .fetch(HttpRequest::get(client.url("/utils")), Auth::Skip)
        .await
        .unwrap();
    client.post("/users/signup").json(&json!({"email": "a@b.co"})).without_auth().send().await.unwrap();

    for sent in transport.requests() {
        assert!(!sent.headers.has(AUTHORIZATION), "unexpected auth on {}", sent.url);
    }
}

#[tokio::test]
async fn caller_authorization_wins() {
    let (client, transport) = client();
    client.session().persist(None, Some("tok-abc")).unwrap();

    client.get("/users").header("authorization", "Bearer admin-override").send().await.unwrap();

    let sent = transport.last();
    assert_eq!(sent.headers.count(AUTHORIZATION), 1);
    assert_eq!(sent.headers.get(AUTHORIZATION), Some("Bearer admin-override"));
}

#[tokio::test]
async fn token_is_read_at_dispatch() {
    let (client, transport) = client();
    let pending = client.get("/users/u1");
    client.session().persist(None, Some("late-token")).unwrap();

    pending.send().await.unwrap();

    assert_eq!(transport.last().headers.get(AUTHORIZATION), Some("Bearer late-token"));
}

// =============================================================
// Bodies
// =============================================================

#[tokio::test]
async fn post_json_sets_content_type_and_body() {
    let (client, transport) = client();
    let payload = json!({ "email": "a@b.co", "amount": 250, "nested": { "k": [1, 2] } });

    client.post("/deposits").json(&payload).send().await.unwrap();

    let sent = transport.last();
    assert_eq!(sent.method, Method::Post);
    assert_eq!(sent.headers.get(CONTENT_TYPE), Some(APPLICATION_JSON));
    let echoed: serde_json::Value = serde_json::from_str(sent.body.as_text().unwrap()).unwrap();
    assert_eq!(echoed, payload);
}

#[tokio::test]
async fn put_and_delete_serialize_json_too() {
    let (client, transport) = client();
    let mut body = HashMap::new();
    body.insert("userIds", vec!["u1", "u2"]);

    client.put("/utils/maintenance-mode").json(&json!({"enabled": true})).send().await.unwrap();
    client.delete("/users").json(&body).send().await.unwrap();

    let sent = transport.requests();
    assert_eq!(sent[0].method, Method::Put);
    assert_eq!(sent[1].method, Method::Delete);
    assert_eq!(sent[1].headers.get(CONTENT_TYPE), Some(APPLICATION_JSON));
    assert_eq!(sent[1].body.as_text(), Some(r#"{"userIds":["u1","u2"]}"#));
}

#[tokio::test]
async fn form_body_is_not_given_content_type() {
    let (client, transport) = client();
    let form = FormData::new().text("amount", "100").file("proof", "r.png", Some("image/png"), vec![9]);

    client.post("/deposits").form(form.clone()).send().await.unwrap();

    let sent = transport.last();
    assert!(!sent.headers.has(CONTENT_TYPE));
    assert_eq!(sent.body, Body::Form(form));
}

#[tokio::test]
async fn delete_without_body_sends_nothing() {
    let (client, transport) = client();

    client.delete("/deposits/t1").send().await.unwrap();

    let sent = transport.last();
    assert!(sent.body.is_empty());
    assert!(!sent.headers.has(CONTENT_TYPE));
}

#[tokio::test]
async fn unserializable_json_fails_before_dispatch() {
    let (client, transport) = client();
    let mut bad = HashMap::new();
    bad.insert(vec![1u8], "non-string key");

    let result = client.post("/x").json(&bad).send().await;

    assert!(matches!(result, Err(FetchError::Body(_))));
    assert!(transport.requests().is_empty());
}

// =============================================================
// Passthrough
// =============================================================

#[tokio::test]
async fn response_is_returned_unmodified() {
    let (client, transport) = client();
    transport.respond(404, r#"{"message":"User not found"}"#);

    let resp = client.get("/users/zz").send().await.unwrap();

    assert_eq!(resp.status, 404);
    assert_eq!(resp.text(), r#"{"message":"User not found"}"#);
}

#[tokio::test]
async fn transport_error_propagates() {
    let (client, transport) = client();
    transport.fail(FetchError::Timeout);

    let result = client.get("/users/u1").send().await;

    assert!(matches!(result, Err(FetchError::Timeout)));
}

#[tokio::test]
async fn timeout_and_credentials_pass_through() {
    let (client, transport) = client();

    client
        .get("/users/u1")
        .timeout(Duration::from_secs(20))
        .credentials(Credentials::Include)
        .send()
        .await
        .unwrap();

    let sent = transport.last();
    assert_eq!(sent.timeout, Some(Duration::from_secs(20)));
    assert_eq!(sent.credentials, Credentials::Include);
}
