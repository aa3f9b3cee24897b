#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod detector;
mod error;
mod labels;
mod processing;

pub use config::YoloConfig;
pub use detector::YoloDetector;
pub use error::{Error, Result};
pub use labels::{load_class_table, parse_class_table};

/// Tracing target for model loading and session management.
pub const TRACING_TARGET_MODEL: &str = "idscan_yolo::model";

/// Tracing target for inference and output decoding.
pub const TRACING_TARGET_INFERENCE: &str = "idscan_yolo::inference";
