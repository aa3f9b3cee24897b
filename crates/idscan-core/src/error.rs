//! Error taxonomy shared by the pipeline and its backends.

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
///
/// Used as the source of a structured [`Error`] so backends can attach their
/// own error types without the core depending on them.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while extracting fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The image reference does not resolve to readable data.
    SourceNotFound,
    /// The detection backend failed; no region data exists for the image.
    DetectionFailure,
    /// Recognition failed for a single region.
    RecognitionFailure,
    /// A backend could not be loaded at startup.
    InitializationFailure,
    /// Input validation failed.
    InvalidInput,
    /// Configuration error.
    Configuration,
    /// Internal error.
    Internal,
}

impl ErrorKind {
    /// Returns the `snake_case` name of this kind.
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Returns true if an error of this kind aborts the whole invocation.
    ///
    /// Only [`ErrorKind::RecognitionFailure`] is recovered locally; it is
    /// folded into an empty extraction and never reaches the caller.
    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::RecognitionFailure)
    }
}

/// A structured error type for idscan operations.
#[derive(Debug, Error)]
#[error("{}{}", kind.as_str(), message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Creates a new source not found error.
    pub fn source_not_found() -> Self {
        Self::new(ErrorKind::SourceNotFound)
    }

    /// Creates a new detection failure.
    pub fn detection_failure() -> Self {
        Self::new(ErrorKind::DetectionFailure)
    }

    /// Creates a new per-region recognition failure.
    pub fn recognition_failure() -> Self {
        Self::new(ErrorKind::RecognitionFailure)
    }

    /// Creates a new initialization failure.
    pub fn initialization_failure() -> Self {
        Self::new(ErrorKind::InitializationFailure)
    }

    /// Creates a new invalid input error.
    pub fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a new internal error.
    pub fn internal_error() -> Self {
        Self::new(ErrorKind::Internal)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }

    /// Returns true if this error aborts the whole invocation.
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let error = Error::source_not_found().with_message("missing.jpg");
        assert_eq!(error.to_string(), "source_not_found: missing.jpg");

        let bare = Error::detection_failure();
        assert_eq!(bare.to_string(), "detection_failure");
    }

    #[test]
    fn only_recognition_failures_are_isolated() {
        assert!(!Error::recognition_failure().is_fatal());
        assert!(Error::detection_failure().is_fatal());
        assert!(Error::source_not_found().is_fatal());
        assert!(Error::initialization_failure().is_fatal());
    }

    #[test]
    fn source_is_preserved() {
        let io = std::io::Error::other("disk gone");
        let error = Error::detection_failure().with_source(io);

        let source = std::error::Error::source(&error).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("disk gone"));
        assert_eq!(error.kind_str(), "detection_failure");
    }
}
