//! Conversion of pipeline errors into HTTP errors.

use idscan_core::ErrorKind as PipelineErrorKind;

use super::{Error, ErrorKind};

impl From<idscan_core::Error> for Error {
    fn from(error: idscan_core::Error) -> Self {
        let kind = match error.kind() {
            PipelineErrorKind::InvalidInput => ErrorKind::BadRequest,
            PipelineErrorKind::SourceNotFound => ErrorKind::NotFound,
            PipelineErrorKind::InitializationFailure => ErrorKind::ServiceUnavailable,
            PipelineErrorKind::DetectionFailure
            | PipelineErrorKind::RecognitionFailure
            | PipelineErrorKind::Configuration
            | PipelineErrorKind::Internal => ErrorKind::InternalServerError,
        };

        let message = match kind {
            ErrorKind::InternalServerError => format!("Processing failed: {error}"),
            _ => error.to_string(),
        };

        let converted = kind.with_message(message);
        match error.source {
            Some(source) => converted.with_context(source.to_string()),
            None => converted,
        }
    }
}
