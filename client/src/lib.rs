//! Client library for the copy-trading platform's REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! The server owns every business rule. This crate keeps the signed-in
//! session in durable storage, attaches it to outbound requests as a bearer
//! token, and speaks the server's JSON schema. The same code runs natively
//! (reqwest, file storage) and in the browser (`hydrate`: gloo-net,
//! `localStorage`).
//!
//! LAYOUT
//! ======
//! `storage` -> `session` -> `net` (`fetch`, `intercept`, `api`) -> `state`.
//! The composition root builds one `SessionStore`, one transport, and one
//! `ApiClient`, and installs global interception at most once.

pub mod config;
pub mod net;
pub mod session;
pub mod state;
pub mod storage;
pub mod util;

pub use config::ClientConfig;
pub use net::api::ApiError;
pub use net::fetch::{ApiClient, Auth};
pub use net::transport::{Fetch, FetchError};
pub use session::SessionStore;
pub use storage::{Storage, StorageError};

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
}
