//! Detector configuration.

use std::path::PathBuf;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default location of the exported identity card model.
pub const DEFAULT_MODEL_PATH: &str = "models/Text_Detection/YOLO/ID_CARD_2.onnx";

const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
const DEFAULT_INPUT_SIZE: u32 = 640;
const DEFAULT_MAX_DETECTIONS: usize = 300;

/// Configuration for [`YoloDetector`].
///
/// [`YoloDetector`]: crate::YoloDetector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[serde(default)]
pub struct YoloConfig {
    /// Path to the ONNX model file.
    #[cfg_attr(
        feature = "config",
        arg(long = "yolo-model", env = "YOLO_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)
    )]
    pub model_path: PathBuf,

    /// Optional labels file mapping class identifiers to names.
    #[cfg_attr(feature = "config", arg(long = "yolo-labels", env = "YOLO_LABELS_PATH"))]
    pub labels_path: Option<PathBuf>,

    /// Minimum class confidence for a detection to be kept.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "yolo-confidence",
            env = "YOLO_CONFIDENCE",
            default_value_t = DEFAULT_CONFIDENCE_THRESHOLD
        )
    )]
    pub confidence_threshold: f32,

    /// Overlap above which same-class detections are suppressed.
    #[cfg_attr(
        feature = "config",
        arg(long = "yolo-iou", env = "YOLO_IOU", default_value_t = DEFAULT_IOU_THRESHOLD)
    )]
    pub iou_threshold: f32,

    /// Side of the square model input, in pixels.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "yolo-input-size",
            env = "YOLO_INPUT_SIZE",
            default_value_t = DEFAULT_INPUT_SIZE
        )
    )]
    pub input_size: u32,

    /// Maximum number of detections kept per image.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "yolo-max-detections",
            env = "YOLO_MAX_DETECTIONS",
            default_value_t = DEFAULT_MAX_DETECTIONS
        )
    )]
    pub max_detections: usize,

    /// Intra-op thread count for ONNX Runtime. Unset lets the runtime decide.
    #[cfg_attr(feature = "config", arg(long = "yolo-threads", env = "YOLO_THREADS"))]
    pub intra_threads: Option<usize>,
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            labels_path: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            input_size: DEFAULT_INPUT_SIZE,
            max_detections: DEFAULT_MAX_DETECTIONS,
            intra_threads: None,
        }
    }
}

impl YoloConfig {
    /// Creates a configuration for the given model with default thresholds.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    /// Set the labels file.
    pub fn with_labels_path(mut self, labels_path: impl Into<PathBuf>) -> Self {
        self.labels_path = Some(labels_path.into());
        self
    }

    /// Set the confidence threshold.
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set the IoU threshold used by non-maximum suppression.
    pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    /// Set the model input size.
    pub fn with_input_size(mut self, input_size: u32) -> Self {
        self.input_size = input_size;
        self
    }

    /// Set the maximum number of detections.
    pub fn with_max_detections(mut self, max_detections: usize) -> Self {
        self.max_detections = max_detections;
        self
    }

    /// Set the intra-op thread count.
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    /// Checks the configured values.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Error::config("confidence threshold must be within [0, 1]"));
        }

        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(Error::config("IoU threshold must be within [0, 1]"));
        }

        if self.input_size == 0 || self.input_size % 32 != 0 {
            return Err(Error::config("input size must be a positive multiple of 32"));
        }

        if self.max_detections == 0 {
            return Err(Error::config("max detections must be greater than 0"));
        }

        if self.intra_threads == Some(0) {
            return Err(Error::config("intra-op thread count must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_ultralytics() {
        let config = YoloConfig::default();
        assert_eq!(config.confidence_threshold, 0.25);
        assert_eq!(config.iou_threshold, 0.45);
        assert_eq!(config.input_size, 640);
        assert_eq!(config.max_detections, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(YoloConfig::default().with_confidence_threshold(1.5).validate().is_err());
        assert!(YoloConfig::default().with_iou_threshold(-0.1).validate().is_err());
        assert!(YoloConfig::default().with_input_size(100).validate().is_err());
        assert!(YoloConfig::default().with_max_detections(0).validate().is_err());
        assert!(YoloConfig::default().with_intra_threads(0).validate().is_err());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: YoloConfig =
            serde_json::from_str(r#"{"model_path": "card.onnx", "input_size": 320}"#).unwrap();
        assert_eq!(config.model_path, PathBuf::from("card.onnx"));
        assert_eq!(config.input_size, 320);
        assert_eq!(config.max_detections, 300);
    }
}
