//! Authenticated fetch wrapper: the entry point for application requests.
//!
//! DESIGN
//! ======
//! `ApiClient` owns an injected transport and a `SessionStore` handle. Every
//! verb defaults to attaching the bearer token; callers opt out per request
//! with `without_auth()` (public endpoints such as signup or the maintenance
//! probe). A caller-supplied `Authorization` header always wins.
//!
//! The token is read when the request is dispatched, not when the builder is
//! created. Responses come back untouched: status handling belongs to callers.

#[cfg(test)]
#[path = "fetch_test.rs"]
mod fetch_test;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::http::{
    APPLICATION_JSON, AUTHORIZATION, Body, CONTENT_TYPE, Credentials, FormData, Headers, HttpRequest, HttpResponse,
    Method,
};
use super::transport::{Fetch, FetchError};
use crate::session::SessionStore;

/// Whether a request should carry the session's bearer token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Auth {
    #[default]
    Attach,
    Skip,
}

/// Set `Authorization: Bearer <token>` unless absent or already present.
/// Returns whether the header was added.
pub(crate) fn attach_bearer(headers: &mut Headers, session: &SessionStore) -> bool {
    if headers.has(AUTHORIZATION) {
        return false;
    }
    match session.bearer() {
        Some(bearer) => {
            headers.set(AUTHORIZATION, bearer);
            true
        }
        None => false,
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    session: SessionStore,
    transport: Arc<dyn Fetch>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: SessionStore, transport: Arc<dyn Fetch>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { base_url, session, transport }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Resolve `path` against the base URL; absolute URLs pass through.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_owned()
        } else if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Dispatch a fully built request, attaching the bearer token per `auth`.
    ///
    /// # Errors
    ///
    /// Returns the transport error when no response was received.
    pub async fn fetch(&self, mut request: HttpRequest, auth: Auth) -> Result<HttpResponse, FetchError> {
        let attached = auth == Auth::Attach && attach_bearer(&mut request.headers, &self.session);
        tracing::debug!(method = request.method.as_str(), url = %request.url, auth = attached, "api request");
        self.transport.fetch(request).await
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder<'_> {
        RequestBuilder {
            client: self,
            request: HttpRequest::new(method, self.url(path)),
            auth: Auth::Attach,
            error: None,
        }
    }

    pub fn get(&self, path: &str) -> RequestBuilder<'_> {
        self.request(Method::Get, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder<'_> {
        self.request(Method::Post, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder<'_> {
        self.request(Method::Put, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder<'_> {
        self.request(Method::Delete, path)
    }
}

/// One request under construction. Nothing is sent until `send` is awaited.
#[must_use = "requests do nothing until `send` is awaited"]
pub struct RequestBuilder<'a> {
    client: &'a ApiClient,
    request: HttpRequest,
    auth: Auth,
    error: Option<FetchError>,
}

impl RequestBuilder<'_> {
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.request.headers.set(name, value);
        self
    }

    /// Never attach the bearer token, even when one is stored.
    pub fn without_auth(mut self) -> Self {
        self.auth = Auth::Skip;
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    /// Serialize `body` as JSON and set `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(text) => {
                self.request.headers.set(CONTENT_TYPE, APPLICATION_JSON);
                self.request.body = Body::Text(text);
            }
            Err(e) => self.error = Some(e.into()),
        }
        self
    }

    /// Send a multipart form. No `Content-Type` is set here; the transport
    /// adds it with the boundary.
    pub fn form(mut self, form: FormData) -> Self {
        self.request.body = Body::Form(form);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = Some(timeout);
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.request.credentials = credentials;
        self
    }

    /// # Errors
    ///
    /// Returns a body encoding error recorded by `json`, or the transport
    /// error when no response was received.
    pub async fn send(self) -> Result<HttpResponse, FetchError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        self.client.fetch(self.request, self.auth).await
    }
}
