use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// JSON body of every error response.
///
/// `status` and `context` never reach the client; the timestamp is stamped
/// when the response is produced.
#[must_use = "error responses do nothing unless serialized"]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse<'a> {
    /// Always `false`.
    pub success: bool,
    /// Message safe for client display.
    pub error: Cow<'a, str>,
    /// Machine-readable error identifier.
    pub error_code: Cow<'a, str>,
    /// When the error response was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    /// Internal context for diagnostics.
    #[serde(skip)]
    pub context: Option<Cow<'a, str>>,
    /// HTTP status code (not serialized in JSON).
    #[serde(skip)]
    pub status: StatusCode,
}

impl<'a> ErrorResponse<'a> {
    // 4xx Client Errors
    pub const BAD_REQUEST: Self = Self::new(
        "bad_request",
        "The request could not be processed due to invalid data",
        StatusCode::BAD_REQUEST,
    );
    pub const NOT_FOUND: Self = Self::new(
        "not_found",
        "The requested resource was not found",
        StatusCode::NOT_FOUND,
    );
    pub const REQUEST_TIMEOUT: Self = Self::new(
        "request_timeout",
        "The request took too long to process and was terminated",
        StatusCode::REQUEST_TIMEOUT,
    );
    // 5xx Server Errors
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        "An internal server error occurred. Please try again later",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const SERVICE_UNAVAILABLE: Self = Self::new(
        "service_unavailable",
        "The extraction models are not available",
        StatusCode::SERVICE_UNAVAILABLE,
    );

    /// Creates a new error response.
    #[inline]
    pub const fn new(error_code: &'a str, error: &'a str, status: StatusCode) -> Self {
        Self {
            success: false,
            error: Cow::Borrowed(error),
            error_code: Cow::Borrowed(error_code),
            timestamp: None,
            context: None,
            status,
        }
    }

    /// Replaces the client-facing message.
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        self.error = message.into();
        self
    }

    /// Attaches context to the error response.
    /// If context already exists, it merges them with a separator.
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        let new_context = context.into();
        self.context = Some(match self.context {
            Some(existing) => Cow::Owned(format!("{existing}; {new_context}")),
            None => new_context,
        });
        self
    }
}

impl Default for ErrorResponse<'_> {
    #[inline]
    fn default() -> Self {
        Self::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ErrorResponse<'_> {
    #[inline]
    fn into_response(mut self) -> Response {
        self.timestamp.get_or_insert_with(Timestamp::now);
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_replaces_default() {
        let response = ErrorResponse::BAD_REQUEST.with_message("No filename provided");
        assert_eq!(response.error, "No filename provided");
        assert_eq!(response.error_code, "bad_request");
    }

    #[test]
    fn context_merges() {
        let response = ErrorResponse::INTERNAL_SERVER_ERROR
            .with_context("detector failed")
            .with_context("session poisoned");

        assert_eq!(
            response.context.as_deref(),
            Some("detector failed; session poisoned")
        );
    }

    #[test]
    fn serialization_hides_internal_fields() {
        let mut response = ErrorResponse::NOT_FOUND.with_context("/tmp/card.png");
        response.timestamp = Some(Timestamp::UNIX_EPOCH);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error_code"], "not_found");
        assert_eq!(json["timestamp"], "1970-01-01T00:00:00Z");
        assert!(json.get("context").is_none());
        assert!(json.get("status").is_none());
    }
}
