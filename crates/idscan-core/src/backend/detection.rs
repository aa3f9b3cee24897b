use std::collections::BTreeMap;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::BackendInfo;
use crate::error::Result;
use crate::health::ServiceHealth;

/// Class identifier to class name table of a detector.
pub type ClassTable = BTreeMap<u32, String>;

/// One detection as emitted by a backend, before it becomes a [`Region`].
///
/// [`Region`]: crate::Region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Corners `[x1, y1, x2, y2]` in the pixel space of the input image.
    pub xyxy: [f32; 4],
    /// Detection confidence in `[0, 1]`.
    pub confidence: f32,
    /// Class identifier, a key of [`DetectionBackend::class_table`].
    pub class_id: u32,
}

impl RawDetection {
    pub fn new(xyxy: [f32; 4], confidence: f32, class_id: u32) -> Self {
        Self {
            xyxy,
            confidence,
            class_id,
        }
    }
}

/// A region detector.
///
/// Implementations are shared by every in-flight request and must not
/// mutate their configuration per call.
#[async_trait::async_trait]
pub trait DetectionBackend: Send + Sync {
    /// Returns the classes this detector can emit.
    fn class_table(&self) -> &ClassTable;

    /// Runs the detector once over `image`.
    ///
    /// Detections are returned in the detector's native order.
    ///
    /// # Errors
    ///
    /// Any error is treated as a fatal detection failure for the image.
    async fn infer(&self, image: &RgbImage) -> Result<Vec<RawDetection>>;

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
