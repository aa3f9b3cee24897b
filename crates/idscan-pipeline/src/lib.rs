#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for the detection stage.
pub const TRACING_TARGET_DETECTION: &str = "idscan_pipeline::detection";

/// Tracing target for the recognition stage.
pub const TRACING_TARGET_RECOGNITION: &str = "idscan_pipeline::recognition";

/// Tracing target for orchestration and introspection.
pub const TRACING_TARGET_PIPELINE: &str = "idscan_pipeline::pipeline";

mod config;
mod detection;
mod info;
mod pipeline;
mod recognition;

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use detection::{Detection, DetectionAdapter};
pub use info::ServiceInfo;
pub use pipeline::Pipeline;
pub use recognition::{ASSUMED_CONFIDENCE, Recognition, RecognitionAdapter};
