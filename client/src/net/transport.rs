//! The raw HTTP primitive: the `Fetch` trait and transport selection.
//!
//! SYSTEM CONTEXT
//! ==============
//! Everything that leaves the process goes through a `Fetch` implementation.
//! `ApiClient` and the global interceptor both decorate one; concrete
//! transports (`reqwest` natively, `gloo-net` in the browser) sit underneath.

use std::sync::Arc;

use super::http::{HttpRequest, HttpResponse};

/// Failure to get any response at all. HTTP error statuses are not failures
/// at this layer.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network request failed: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("request body encode failed: {0}")]
    Body(#[from] serde_json::Error),
    #[error("no HTTP transport available: {0}")]
    Unavailable(&'static str),
}

/// Dispatch one request and return the response unmodified.
#[cfg_attr(feature = "hydrate", async_trait::async_trait(?Send))]
#[cfg_attr(not(feature = "hydrate"), async_trait::async_trait)]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError>;
}

#[cfg_attr(feature = "hydrate", async_trait::async_trait(?Send))]
#[cfg_attr(not(feature = "hydrate"), async_trait::async_trait)]
impl<F: Fetch + ?Sized> Fetch for Arc<F> {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        (**self).fetch(request).await
    }
}

/// Build the transport for the enabled target feature.
///
/// # Errors
///
/// Returns an error when no transport feature is enabled or the native client
/// cannot be built.
pub fn default_transport() -> Result<Arc<dyn Fetch>, FetchError> {
    #[cfg(feature = "hydrate")]
    {
        Ok(Arc::new(super::browser::BrowserTransport))
    }
    #[cfg(all(feature = "native", not(feature = "hydrate")))]
    {
        let transport = super::native::ReqwestTransport::new(crate::config::TransportTimeouts::default())?;
        Ok(Arc::new(transport))
    }
    #[cfg(not(any(feature = "native", feature = "hydrate")))]
    {
        Err(FetchError::Unavailable("enable the `native` or `hydrate` feature"))
    }
}
