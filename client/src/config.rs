//! Client configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const SESSION_DIR_NAME: &str = ".copytrade";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Transport-level defaults; individual requests may set a shorter timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for TransportTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL without a trailing slash.
    pub server_url: String,
    /// Directory for the file-backed session store.
    pub session_dir: PathBuf,
    pub timeouts: TransportTimeouts,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `COPYTRADE_SERVER_URL`: default `http://127.0.0.1:5000`
    /// - `COPYTRADE_SESSION_DIR`: default `.copytrade` under the user's home directory
    /// - `COPYTRADE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `COPYTRADE_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` when the server URL is not http(s).
    pub fn from_env() -> Result<Self, ConfigError> {
        let server_url = normalize_server_url(
            &std::env::var("COPYTRADE_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string()),
        )?;
        let session_dir = std::env::var_os("COPYTRADE_SESSION_DIR").map_or_else(default_session_dir, PathBuf::from);
        let timeouts = TransportTimeouts {
            request_secs: env_parse_u64("COPYTRADE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("COPYTRADE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Ok(Self { server_url, session_dir, timeouts })
    }

    /// Replace the server URL, validating it the same way `from_env` does.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for a non-http(s) URL.
    pub fn with_server_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.server_url = normalize_server_url(raw)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = dir.into();
        self
    }
}

/// Require an http(s) scheme and strip trailing slashes.
///
/// # Errors
///
/// Returns `ConfigError::Invalid` when the scheme or host is missing.
pub fn normalize_server_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let has_host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(ConfigError::Invalid(format!("server URL must be http(s)://host, got '{raw}'")));
    }
    Ok(trimmed.to_string())
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn default_session_dir() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(SESSION_DIR_NAME), |home| home.join(SESSION_DIR_NAME))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
