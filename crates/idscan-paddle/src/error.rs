//! Failures of the recognition server client.

use std::time::Duration;

/// Result type for recognition client operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure modes when talking to the recognition server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection, TLS or transport failure reported by `reqwest`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error envelope or a non-success status.
    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// The server answered 2xx with a body that is not a usable envelope.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        message: String,
        body: Option<String>,
    },

    /// The server is overloaded or restarting (429, 502, 503).
    #[error("Recognition server busy (status {status})")]
    Busy {
        status: u16,
        retry_after: Option<Duration>,
    },

    /// The server or a gateway gave up on the request.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The crop could not be encoded as PNG.
    #[error("Image encoding error: {0}")]
    Encode(#[from] image::ImageError),
}

impl Error {
    pub fn api(status: u16, message: impl Into<String>, code: Option<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            code,
        }
    }

    pub fn invalid_response(message: impl Into<String>, body: Option<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
            body,
        }
    }

    pub fn busy(status: u16, retry_after: Option<Duration>) -> Self {
        Self::Busy {
            status,
            retry_after,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns true if the same request may succeed when sent again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Busy { .. } | Self::Timeout(_) => true,
            // A 4xx surfaced by reqwest itself is final.
            Self::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::Api { status, .. } => matches!(*status, 429 | 500..=599),
            Self::InvalidResponse { .. } | Self::Config(_) | Self::Encode(_) => false,
        }
    }

    /// Returns the server-suggested delay before retrying.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Busy { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Short name of the failure for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Api { .. } => "api",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::Busy { .. } => "busy",
            Self::Timeout(_) => "timeout",
            Self::Config(_) => "config",
            Self::Encode(_) => "encode",
        }
    }
}

impl From<Error> for idscan_core::Error {
    fn from(error: Error) -> Self {
        let base = match &error {
            Error::Config(_) => idscan_core::Error::configuration(),
            _ => idscan_core::Error::recognition_failure(),
        };

        base.with_message(error.to_string()).with_source(error)
    }
}
