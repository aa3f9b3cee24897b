use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::FieldExtraction;

/// Informational message attached when nothing text-bearing was detected.
pub const NO_TEXT_REGIONS_MESSAGE: &str = "No text regions detected";

/// Wall-clock seconds spent in each stage.
///
/// `total_seconds` is always exactly the sum of the two stage timings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingBreakdown {
    detection_seconds: f64,
    recognition_seconds: f64,
    total_seconds: f64,
}

impl TimingBreakdown {
    /// Creates a breakdown from the two stage durations.
    pub fn new(detection: Duration, recognition: Duration) -> Self {
        let detection_seconds = detection.as_secs_f64();
        let recognition_seconds = recognition.as_secs_f64();

        Self {
            detection_seconds,
            recognition_seconds,
            total_seconds: detection_seconds + recognition_seconds,
        }
    }

    /// Creates a breakdown for a run that skipped recognition.
    pub fn detection_only(detection: Duration) -> Self {
        Self::new(detection, Duration::ZERO)
    }

    /// Seconds spent in detection.
    pub fn detection_seconds(&self) -> f64 {
        self.detection_seconds
    }

    /// Seconds spent recognizing text regions, zero on early exit.
    pub fn recognition_seconds(&self) -> f64 {
        self.recognition_seconds
    }

    /// Sum of the two stage timings.
    pub fn total_seconds(&self) -> f64 {
        self.total_seconds
    }
}

/// The outcome of one successful pipeline invocation.
///
/// Built once per request and immutable afterwards. Fatal failures never
/// produce a `PipelineResult`; they are returned as an [`Error`] instead.
///
/// [`Error`]: crate::Error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    succeeded: bool,
    source_identifier: String,
    total_region_count: usize,
    extractions: Vec<FieldExtraction>,
    timing: TimingBreakdown,
    message: Option<String>,
}

impl PipelineResult {
    /// Creates the result of a run that recognized every text-bearing region.
    ///
    /// `total_region_count` is clamped up to the number of extractions.
    pub fn completed(
        source_identifier: impl Into<String>,
        total_region_count: usize,
        extractions: Vec<FieldExtraction>,
        timing: TimingBreakdown,
    ) -> Self {
        Self {
            succeeded: true,
            source_identifier: source_identifier.into(),
            total_region_count: total_region_count.max(extractions.len()),
            extractions,
            timing,
            message: None,
        }
    }

    /// Creates the result of a run where no region was text-bearing.
    pub fn no_text_regions(
        source_identifier: impl Into<String>,
        total_region_count: usize,
        detection: Duration,
    ) -> Self {
        Self {
            succeeded: true,
            source_identifier: source_identifier.into(),
            total_region_count,
            extractions: Vec::new(),
            timing: TimingBreakdown::detection_only(detection),
            message: Some(NO_TEXT_REGIONS_MESSAGE.to_owned()),
        }
    }

    /// Always true for a returned result.
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Path or upload name of the processed image.
    pub fn source_identifier(&self) -> &str {
        &self.source_identifier
    }

    /// Number of regions detected, text-bearing or not.
    pub fn total_region_count(&self) -> usize {
        self.total_region_count
    }

    /// One extraction per text region, in detection order.
    pub fn extractions(&self) -> &[FieldExtraction] {
        &self.extractions
    }

    /// Stage timings of this run.
    pub fn timing(&self) -> &TimingBreakdown {
        &self.timing
    }

    /// Informational note, set when no text region was found.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn total_is_the_sum_of_stages() {
        let timing = TimingBreakdown::new(Duration::from_millis(125), Duration::from_millis(250));
        assert_eq!(
            timing.total_seconds(),
            timing.detection_seconds() + timing.recognition_seconds()
        );
    }

    #[test]
    fn empty_result_shape() {
        let result = PipelineResult::no_text_regions("card.jpg", 3, Duration::from_millis(500));
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(
            value,
            json!({
                "succeeded": true,
                "source_identifier": "card.jpg",
                "total_region_count": 3,
                "extractions": [],
                "timing": {
                    "detection_seconds": 0.5,
                    "recognition_seconds": 0.0,
                    "total_seconds": 0.5
                },
                "message": "No text regions detected"
            })
        );
    }

    #[test]
    fn completed_result_has_no_message() {
        let timing = TimingBreakdown::new(Duration::ZERO, Duration::ZERO);
        let result = PipelineResult::completed("card.jpg", 0, Vec::new(), timing);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["message"], serde_json::Value::Null);
        assert!(result.succeeded());
    }
}
