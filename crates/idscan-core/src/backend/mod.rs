//! Capabilities the pipeline consumes.
//!
//! The pipeline only ever talks to a [`DetectionBackend`] and a
//! [`RecognitionBackend`]. Production crates implement them over real models,
//! `idscan-test` implements them over fixed data, and the orchestration logic
//! is the same for both.

mod detection;
mod recognition;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use detection::{ClassTable, DetectionBackend, RawDetection};
pub use recognition::{RecognitionBackend, Recognized};

/// Descriptive metadata a backend reports for introspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendInfo {
    /// Short name of the implementation, e.g. `yolo-onnx`.
    pub backend: String,
    /// Model file, model name or endpoint the backend runs.
    pub model: String,
    /// Backend-specific details.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl BackendInfo {
    /// Creates metadata with no extra details.
    pub fn new(backend: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            model: model.into(),
            details: Map::new(),
        }
    }

    /// Adds a backend-specific detail.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}
