#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for image source resolution.
pub const TRACING_TARGET_SOURCE: &str = "idscan_core::source";

/// Tracing target for taxonomy binding.
pub const TRACING_TARGET_TAXONOMY: &str = "idscan_core::taxonomy";

mod error;
mod health;
mod source;
mod taxonomy;

pub mod backend;
pub mod prelude;
pub mod types;

pub use backend::{
    BackendInfo, ClassTable, DetectionBackend, RawDetection, RecognitionBackend, Recognized,
};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use health::{ServiceHealth, ServiceStatus};
pub use source::{ImageSource, LoadedImage};
pub use taxonomy::{
    BoundTaxonomy, DEFAULT_TEXT_LABELS, ID_CARD_CLASSES, RegionTaxonomy, id_card_class_table,
};
pub use types::{
    BoundingBox, FieldExtraction, NO_TEXT_REGIONS_MESSAGE, PipelineResult, RecognitionOutcome,
    Region, TimingBreakdown, unit_confidence,
};
