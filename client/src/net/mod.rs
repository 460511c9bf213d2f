//! Networking: request model, transports, the authenticated wrapper, global
//! interception, and typed endpoints.
//!
//! SYSTEM CONTEXT
//! ==============
//! `http` defines plain request/response data, `transport` the `Fetch` seam
//! the concrete backends implement (`native` via reqwest, `browser` via
//! gloo-net). `fetch` layers the bearer contract on top, `intercept` offers the
//! same contract process-wide, and `api` + `types` speak the server's schema.

pub mod api;
#[cfg(feature = "hydrate")]
pub mod browser;
pub mod fetch;
pub mod http;
pub mod intercept;
#[cfg(feature = "native")]
pub mod native;
#[cfg(test)]
pub(crate) mod testing;
pub mod transport;
pub mod types;
