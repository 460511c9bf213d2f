//! Client-side state the web app kept in contexts and hooks.
//!
//! Plain structs with methods; a UI layer wraps them in whatever reactive
//! container it uses. Anything authoritative still lives on the server.

pub mod activity;
pub mod auth;
pub mod maintenance;
pub mod rankings;
