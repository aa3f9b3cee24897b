//! Data produced by one pipeline invocation.
//!
//! # Overview
//!
//! - **Region**: a detected rectangle with its class and detection confidence
//! - **FieldExtraction**: a text-bearing region paired with the recognized text
//! - **TimingBreakdown**: detection, recognition and total wall-clock seconds
//! - **PipelineResult**: the terminal artifact returned to callers
//!
//! All of these serialize to the JSON shape HTTP clients consume, for example:
//!
//! ```json
//! {
//!   "succeeded": true,
//!   "source_identifier": "card.jpg",
//!   "total_region_count": 2,
//!   "extractions": [{
//!     "region": {"ordinal": 1, "bbox": [100, 50, 300, 80], "confidence": 0.95,
//!                "class_id": 12, "class_name": "name"},
//!     "extracted_text": "NGUYEN VAN A",
//!     "recognition_confidence": 1.0
//!   }],
//!   "timing": {"detection_seconds": 0.1, "recognition_seconds": 0.2, "total_seconds": 0.3},
//!   "message": null
//! }
//! ```

mod extraction;
mod region;
mod result;

pub use extraction::{FieldExtraction, RecognitionOutcome, unit_confidence};
pub use region::{BoundingBox, Region};
pub use result::{NO_TEXT_REGIONS_MESSAGE, PipelineResult, TimingBreakdown};
