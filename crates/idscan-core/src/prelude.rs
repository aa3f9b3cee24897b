//! Convenient re-exports for common use.

pub use crate::backend::{
    BackendInfo, ClassTable, DetectionBackend, RawDetection, RecognitionBackend, Recognized,
};
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::health::{ServiceHealth, ServiceStatus};
pub use crate::source::ImageSource;
pub use crate::taxonomy::{BoundTaxonomy, RegionTaxonomy};
pub use crate::types::{FieldExtraction, PipelineResult, Region, TimingBreakdown};
