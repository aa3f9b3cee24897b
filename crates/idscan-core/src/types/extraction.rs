use serde::{Deserialize, Serialize};

use super::Region;

/// A text-bearing region together with what recognition read from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldExtraction {
    /// The region the text was read from.
    pub region: Region,
    /// Recognized text, empty when recognition failed.
    pub extracted_text: String,
    /// Recognition confidence in `[0, 1]`, `0.0` when recognition failed.
    pub recognition_confidence: f32,
}

impl FieldExtraction {
    /// Returns true if this extraction is the sentinel of a failed recognition.
    pub fn is_blank(&self) -> bool {
        self.extracted_text.is_empty() && self.recognition_confidence == 0.0
    }
}

/// What recognizing a single region produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionOutcome {
    /// The backend returned text.
    Success {
        /// Recognized text.
        text: String,
        /// Confidence reported (or assumed) for the text.
        confidence: f32,
    },
    /// The backend failed or the crop was empty.
    Failed,
}

/// Clamps a score to `[0, 1]`, mapping NaN to `0.0`.
pub fn unit_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl RecognitionOutcome {
    /// Creates a successful outcome, clamping the confidence to `[0, 1]`.
    pub fn success(text: impl Into<String>, confidence: f32) -> Self {
        let confidence = unit_confidence(confidence);

        Self::Success {
            text: text.into(),
            confidence,
        }
    }

    /// Returns true for [`RecognitionOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Folds the outcome into the extraction for `region`.
    ///
    /// A failed outcome always becomes an empty text with zero confidence.
    pub fn into_extraction(self, region: Region) -> FieldExtraction {
        let (extracted_text, recognition_confidence) = match self {
            Self::Success { text, confidence } => (text, confidence),
            Self::Failed => (String::new(), 0.0),
        };

        FieldExtraction {
            region,
            extracted_text,
            recognition_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;

    fn region() -> Region {
        Region {
            ordinal: 1,
            bbox: BoundingBox::new(100, 50, 300, 80),
            confidence: 0.95,
            class_id: 12,
            class_name: "name".to_owned(),
        }
    }

    #[test]
    fn unit_confidence_maps_nan_to_zero() {
        assert_eq!(unit_confidence(f32::NAN), 0.0);
        assert_eq!(unit_confidence(-0.2), 0.0);
        assert_eq!(unit_confidence(0.42), 0.42);
        assert_eq!(unit_confidence(f32::INFINITY), 1.0);
    }

    #[test]
    fn failure_folds_into_sentinel() {
        let extraction = RecognitionOutcome::Failed.into_extraction(region());
        assert_eq!(extraction.extracted_text, "");
        assert_eq!(extraction.recognition_confidence, 0.0);
        assert!(extraction.is_blank());
        assert_eq!(extraction.region, region());
    }

    #[test]
    fn success_keeps_text_and_clamps_confidence() {
        let extraction = RecognitionOutcome::success("NGUYEN VAN A", 1.7).into_extraction(region());
        assert_eq!(extraction.extracted_text, "NGUYEN VAN A");
        assert_eq!(extraction.recognition_confidence, 1.0);
        assert!(!extraction.is_blank());

        assert_eq!(
            RecognitionOutcome::success("x", f32::NAN),
            RecognitionOutcome::Success {
                text: "x".to_owned(),
                confidence: 0.0
            }
        );
    }
}
