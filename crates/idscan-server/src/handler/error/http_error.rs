//! The error type returned by HTTP handlers.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::handler::response::ErrorResponse;

/// A handler failure: an [`ErrorKind`] plus an optional client-facing
/// message and optional diagnostic context.
///
/// Context is merged into the logged response template but the JSON body
/// only ever carries the message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "errors do nothing unless turned into a response"]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    context: Option<String>,
}

impl Error {
    /// Creates an error that answers with the default message of `kind`.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            context: None,
        }
    }

    /// Replaces the default message of the error kind.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches diagnostic context.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let template = self.kind.response();
        let status = template.status.as_u16();
        let message = self.message.as_deref().unwrap_or(&template.error);

        match &self.context {
            Some(context) => write!(f, "{} ({status}): {message} - {context}", self.kind),
            None => write!(f, "{} ({status}): {message}", self.kind),
        }
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let template = self.kind.response();
        let template = match self.message {
            Some(message) => template.with_message(message),
            None => template,
        };
        let template = match self.context {
            Some(context) => template.with_context(context),
            None => template,
        };

        template.into_response()
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Result of an HTTP handler.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The statuses a handler can fail with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 400, the upload or request is invalid.
    BadRequest,
    /// 404, unknown route or unreadable image source.
    NotFound,
    /// 408, the request outlived the configured timeout.
    RequestTimeout,
    /// 500.
    #[default]
    InternalServerError,
    /// 503, a backend is not initialized.
    ServiceUnavailable,
}

impl ErrorKind {
    /// Shorthand for [`Error::new`].
    pub fn into_error(self) -> Error {
        Error::new(self)
    }

    /// Shorthand for `Error::new(self).with_message(message)`.
    pub fn with_message(self, message: impl Into<String>) -> Error {
        Error::new(self).with_message(message)
    }

    /// Shorthand for `Error::new(self).with_context(context)`.
    pub fn with_context(self, context: impl Into<String>) -> Error {
        Error::new(self).with_context(context)
    }

    pub fn status_code(self) -> StatusCode {
        self.response().status
    }

    /// Returns the response template with the default message.
    pub fn response(self) -> ErrorResponse<'static> {
        match self {
            Self::BadRequest => ErrorResponse::BAD_REQUEST,
            Self::NotFound => ErrorResponse::NOT_FOUND,
            Self::RequestTimeout => ErrorResponse::REQUEST_TIMEOUT,
            Self::InternalServerError => ErrorResponse::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => ErrorResponse::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.response().error_code)
    }
}

impl IntoResponse for ErrorKind {
    fn into_response(self) -> Response {
        self.response().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_internal_server_error() {
        let error = Error::default();
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
        assert_eq!(error.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn builders_chain() {
        let error = ErrorKind::BadRequest
            .with_message("No filename provided")
            .with_context("multipart field 'file'");

        assert_eq!(error.kind(), ErrorKind::BadRequest);
        assert_eq!(error.message(), Some("No filename provided"));
        assert_eq!(error.context(), Some("multipart field 'file'"));
    }

    #[test]
    fn display_includes_code_status_message_and_context() {
        let error = ErrorKind::NotFound
            .with_message("Image not found")
            .with_context("/tmp/missing.png");

        assert_eq!(
            error.to_string(),
            "not_found (404): Image not found - /tmp/missing.png"
        );
    }

    #[test]
    fn display_falls_back_to_default_message() {
        let display = Error::new(ErrorKind::ServiceUnavailable).to_string();
        assert!(display.starts_with("service_unavailable (503): "));
    }

    #[test]
    fn status_codes_match_responses() {
        for kind in [
            ErrorKind::BadRequest,
            ErrorKind::NotFound,
            ErrorKind::RequestTimeout,
            ErrorKind::InternalServerError,
            ErrorKind::ServiceUnavailable,
        ] {
            assert!(kind.status_code().as_u16() >= 400);
            assert_eq!(kind.into_response().status(), kind.status_code());
        }
    }
}
