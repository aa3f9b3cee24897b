//! Error types for the YOLO detection backend.

use std::path::PathBuf;

/// Result type for YOLO backend operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while loading or running the detector.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The model file does not exist.
    #[error("model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// ONNX Runtime could not build a session from the model file.
    #[error("failed to load model '{}': {source}", .path.display())]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },

    /// ONNX Runtime failed during inference.
    #[error("onnx runtime error: {0}")]
    Ort(#[from] ort::Error),

    /// The model produced an output the decoder does not understand.
    #[error("unexpected model output: {0}")]
    InvalidOutput(String),

    /// The labels file could not be parsed.
    #[error("invalid labels file '{}': {message}", .path.display())]
    Labels { path: PathBuf, message: String },

    /// I/O error while reading a model-side file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A previous inference panicked while holding the session.
    #[error("inference session is poisoned")]
    SessionPoisoned,

    /// The blocking inference task could not be joined.
    #[error("inference task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// Creates an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns true if the error happened while loading the model.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::ModelNotFound(_)
                | Self::ModelLoad { .. }
                | Self::Labels { .. }
                | Self::Config(_)
                | Self::Io(_)
        )
    }
}

impl From<Error> for idscan_core::Error {
    fn from(error: Error) -> Self {
        let base = match &error {
            Error::Config(_) => idscan_core::Error::configuration(),
            Error::ModelNotFound(_)
            | Error::ModelLoad { .. }
            | Error::Labels { .. }
            | Error::Io(_) => {
                idscan_core::Error::initialization_failure()
            }
            Error::SessionPoisoned | Error::Join(_) => idscan_core::Error::internal_error(),
            Error::Ort(_) | Error::InvalidOutput(_) => idscan_core::Error::detection_failure(),
        };

        base.with_message(error.to_string()).with_source(error)
    }
}
