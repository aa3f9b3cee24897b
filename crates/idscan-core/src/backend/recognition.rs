use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::BackendInfo;
use crate::error::Result;
use crate::health::ServiceHealth;

/// Text read from a single crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recognized {
    /// The recognized text.
    pub text: String,
    /// Confidence, if the backend reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Recognized {
    /// Creates a result without a confidence score.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
        }
    }

    /// Attaches a confidence score.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// A single-line text recognizer.
#[async_trait::async_trait]
pub trait RecognitionBackend: Send + Sync {
    /// Reads the text in `crop`.
    ///
    /// # Errors
    ///
    /// Errors are isolated to the region the crop was taken from.
    async fn read(&self, crop: RgbImage) -> Result<Recognized>;

    /// Returns metadata for introspection. Must not run the model.
    fn model_info(&self) -> BackendInfo;

    /// Returns true if the backend finished initializing and is usable.
    ///
    /// Must be cheap and must not run the model.
    fn is_ready(&self) -> bool {
        true
    }

    /// Checks whether the backend can serve requests.
    async fn health_check(&self) -> Result<ServiceHealth> {
        Ok(ServiceHealth::healthy())
    }
}
