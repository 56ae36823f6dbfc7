use thiserror::Error;

/// Failures of a single request or push-channel operation.
#[derive(Error, Debug)]
pub enum NetError {
    /// Transport-level failure reported by reqwest (connect, timeout, TLS...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Server responded {status}: {body}")]
    Status { status: u16, body: String },

    /// The server answered `success: false`.
    #[error("{0}")]
    Rejected(String),

    /// The response body did not have the expected shape.
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Any other transport failure (used by non-HTTP clients).
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The push connection's transport side has gone away.
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl NetError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, NetError::Http(e) if e.is_timeout())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NetError>;
