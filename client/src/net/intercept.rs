//! Process-wide bearer interception for requests that bypass `ApiClient`.
//!
//! SYSTEM CONTEXT
//! ==============
//! Ad-hoc call sites dispatch through `global_fetch` instead of an injected
//! client. Once `install` has run, those requests get the same
//! `Authorization: Bearer <token>` treatment, unless they already carry an
//! `Authorization` header. The interceptor cannot tell "no auth wanted" from
//! "forgot to opt out", so it always attaches when a token exists; requests
//! that must stay anonymous go through `ApiClient` with `Auth::Skip`.
//!
//! `ApiClient` should be given the raw transport, not the intercepted one, or
//! its opt-out would be undone here.
//!
//! Installation happens at most once per process and is never reverted.

#[cfg(test)]
#[path = "intercept_test.rs"]
mod intercept_test;

use std::sync::{Arc, OnceLock};

use super::fetch::attach_bearer;
use super::http::{HttpRequest, HttpResponse};
use super::transport::{Fetch, FetchError, default_transport};
use crate::session::SessionStore;

static GLOBAL_FETCH: OnceLock<Arc<dyn Fetch>> = OnceLock::new();

/// `Fetch` decorator that adds the session's bearer token.
///
/// Only headers are touched; method, URL, body, credentials mode and timeout
/// reach the inner transport as given.
pub struct BearerInterceptor<F> {
    inner: F,
    session: SessionStore,
}

impl<F: Fetch> BearerInterceptor<F> {
    pub fn new(inner: F, session: SessionStore) -> Self {
        Self { inner, session }
    }
}

#[cfg_attr(feature = "hydrate", async_trait::async_trait(?Send))]
#[cfg_attr(not(feature = "hydrate"), async_trait::async_trait)]
impl<F: Fetch> Fetch for BearerInterceptor<F> {
    async fn fetch(&self, mut request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let attached = attach_bearer(&mut request.headers, &self.session);
        tracing::trace!(url = %request.url, auth = attached, "intercepted fetch");
        self.inner.fetch(request).await
    }
}

/// Replace the global primitive with `base` wrapped in a `BearerInterceptor`.
///
/// Returns `true` for the call that installed it; every later call is a no-op
/// returning `false`, so the primitive is never wrapped twice.
pub fn install(base: Arc<dyn Fetch>, session: SessionStore) -> bool {
    let mut installed = false;
    GLOBAL_FETCH.get_or_init(|| {
        installed = true;
        Arc::new(BearerInterceptor::new(base, session))
    });
    if installed {
        tracing::info!("global fetch interception installed");
    } else {
        tracing::debug!("global fetch interception already installed");
    }
    installed
}

#[must_use]
pub fn is_installed() -> bool {
    GLOBAL_FETCH.get().is_some()
}

/// The global HTTP primitive for call sites without an injected client.
///
/// Before `install`, requests go straight to the default transport.
///
/// # Errors
///
/// Returns the transport error when no response was received.
pub async fn global_fetch(request: HttpRequest) -> Result<HttpResponse, FetchError> {
    if let Some(fetch) = GLOBAL_FETCH.get() {
        return fetch.fetch(request).await;
    }
    default_transport()?.fetch(request).await
}
