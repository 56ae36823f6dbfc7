//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so the client can start against a local
//! development server with zero configuration.

use std::time::Duration;

use parley_shared::constants::{
    DEFAULT_AUTH_HEADER, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVER_URL,
};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the history API.
    /// Env: `PARLEY_SERVER_URL`
    /// Default: `http://localhost:5000`
    pub server_url: String,

    /// Per-request timeout for history API calls.
    /// Env: `PARLEY_REQUEST_TIMEOUT_SECS`
    /// Default: `15`
    pub request_timeout: Duration,

    /// Header carrying the session token.
    /// Env: `PARLEY_AUTH_HEADER`
    /// Default: `token`
    pub auth_header: String,

    /// Session token issued by the auth service, if already known.
    /// Env: `PARLEY_AUTH_TOKEN`
    pub auth_token: Option<String>,

    /// Capacity of the engine's UI event channel. Slow listeners that fall
    /// further behind than this miss events and should re-read the snapshot.
    /// Env: `PARLEY_EVENT_CAPACITY`
    /// Default: `256`
    pub event_capacity: usize,

    /// Buffer size of the push connection's inbound and outbound queues.
    /// Env: `PARLEY_PUSH_BUFFER`
    /// Default: `256`
    pub push_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
            auth_token: None,
            event_capacity: 256,
            push_buffer: 256,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("PARLEY_SERVER_URL") {
            let url = url.trim();
            if !url.is_empty() {
                config.server_url = url.to_string();
            }
        }

        if let Some(val) = lookup("PARLEY_REQUEST_TIMEOUT_SECS") {
            match parse_positive(&val) {
                Ok(secs) => config.request_timeout = Duration::from_secs(secs as u64),
                Err(e) => {
                    tracing::warn!(value = %val, error = %e, "Invalid PARLEY_REQUEST_TIMEOUT_SECS, using default");
                }
            }
        }

        if let Some(header) = lookup("PARLEY_AUTH_HEADER") {
            if !header.trim().is_empty() {
                config.auth_header = header.trim().to_string();
            }
        }

        if let Some(token) = lookup("PARLEY_AUTH_TOKEN") {
            if !token.is_empty() {
                config.auth_token = Some(token);
            }
        }

        if let Some(val) = lookup("PARLEY_EVENT_CAPACITY") {
            match parse_positive(&val) {
                Ok(n) => config.event_capacity = n,
                Err(e) => {
                    tracing::warn!(value = %val, error = %e, "Invalid PARLEY_EVENT_CAPACITY, using default");
                }
            }
        }

        if let Some(val) = lookup("PARLEY_PUSH_BUFFER") {
            match parse_positive(&val) {
                Ok(n) => config.push_buffer = n,
                Err(e) => {
                    tracing::warn!(value = %val, error = %e, "Invalid PARLEY_PUSH_BUFFER, using default");
                }
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

/// Parse a strictly positive integer.
fn parse_positive(value: &str) -> Result<usize, String> {
    let n: usize = value
        .trim()
        .parse()
        .map_err(|e| format!("not a number: {e}"))?;
    if n == 0 {
        return Err("must be greater than zero".to_string());
    }
    Ok(n)
}
