//! Detection stage: run the detector and split out text-bearing regions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use idscan_core::{
    BoundTaxonomy, BoundingBox, DetectionBackend, Error, ErrorKind, RawDetection, Region,
    RegionTaxonomy, Result, unit_confidence,
};
use image::RgbImage;

use crate::TRACING_TARGET_DETECTION;

/// Output of one detection run.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Regions whose class belongs to the taxonomy, in emission order.
    pub text_regions: Vec<Region>,
    /// Wall-clock time spent in the detector.
    pub elapsed: Duration,
    /// Every detected region, in emission order.
    pub all_regions: Vec<Region>,
}

/// Wraps a [`DetectionBackend`] together with the taxonomy bound to its
/// class table.
#[derive(Clone)]
pub struct DetectionAdapter {
    backend: Arc<dyn DetectionBackend>,
    taxonomy: BoundTaxonomy,
}

impl DetectionAdapter {
    /// Binds `taxonomy` to the backend's class table.
    pub fn new(backend: Arc<dyn DetectionBackend>, taxonomy: &RegionTaxonomy) -> Self {
        let taxonomy = taxonomy.bind(backend.class_table());

        tracing::info!(
            target: TRACING_TARGET_DETECTION,
            classes = backend.class_table().len(),
            text_class_ids = ?taxonomy.class_ids(),
            "detection adapter ready"
        );

        Self { backend, taxonomy }
    }

    /// Returns the wrapped backend.
    pub fn backend(&self) -> &Arc<dyn DetectionBackend> {
        &self.backend
    }

    /// Returns the taxonomy bound to the backend's class table.
    pub fn taxonomy(&self) -> &BoundTaxonomy {
        &self.taxonomy
    }

    /// Runs the detector once over `image`.
    ///
    /// Finding no text-bearing region is not an error; `text_regions` is
    /// simply empty.
    ///
    /// # Errors
    ///
    /// Any backend error is returned as a [`ErrorKind::DetectionFailure`] and
    /// no regions are produced.
    pub async fn detect(&self, image: &RgbImage) -> Result<Detection> {
        let started = Instant::now();
        let raw = self.backend.infer(image).await.map_err(into_detection_failure)?;
        let elapsed = started.elapsed();

        let all_regions: Vec<Region> = raw
            .iter()
            .enumerate()
            .map(|(index, detection)| self.region(index, detection))
            .collect();

        let text_regions: Vec<Region> = all_regions
            .iter()
            .filter(|region| self.taxonomy.classify(region.class_id).is_some())
            .cloned()
            .collect();

        tracing::debug!(
            target: TRACING_TARGET_DETECTION,
            total_regions = all_regions.len(),
            text_regions = text_regions.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "detection completed"
        );

        Ok(Detection {
            text_regions,
            elapsed,
            all_regions,
        })
    }

    fn region(&self, index: usize, detection: &RawDetection) -> Region {
        let class_name = self
            .backend
            .class_table()
            .get(&detection.class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", detection.class_id));

        Region {
            ordinal: u32::try_from(index + 1).unwrap_or(u32::MAX),
            bbox: BoundingBox::from_xyxy(detection.xyxy),
            confidence: unit_confidence(detection.confidence),
            class_id: detection.class_id,
            class_name,
        }
    }
}

fn into_detection_failure(error: Error) -> Error {
    if error.kind() == ErrorKind::DetectionFailure {
        return error;
    }

    Error::detection_failure()
        .with_message("detection backend failed")
        .with_source(error)
}

#[cfg(test)]
mod tests {
    use idscan_test::MockDetectionBackend;

    use super::*;

    fn adapter(detections: Vec<RawDetection>) -> DetectionAdapter {
        let backend = MockDetectionBackend::default().with_detections(detections);
        DetectionAdapter::new(Arc::new(backend), &RegionTaxonomy::default())
    }

    #[tokio::test]
    async fn ordinals_follow_emission_order() {
        let adapter = adapter(vec![
            RawDetection::new([0.0, 0.0, 10.0, 10.0], 0.8, 1),
            RawDetection::new([100.0, 50.0, 300.0, 80.0], 0.95, 12),
            RawDetection::new([100.0, 100.0, 200.0, 130.0], 0.9, 7),
        ]);

        let detection = adapter.detect(&RgbImage::new(400, 200)).await.unwrap();
        let ordinals: Vec<u32> = detection.all_regions.iter().map(|r| r.ordinal).collect();
        assert_eq!(ordinals, [1, 2, 3]);

        let text: Vec<(u32, &str)> = detection
            .text_regions
            .iter()
            .map(|r| (r.ordinal, r.class_name.as_str()))
            .collect();
        assert_eq!(text, [(2, "name"), (3, "id")]);
    }

    #[tokio::test]
    async fn unknown_classes_get_a_placeholder_name() {
        let adapter = adapter(vec![RawDetection::new([0.0, 0.0, 5.0, 5.0], 0.5, 99)]);

        let detection = adapter.detect(&RgbImage::new(10, 10)).await.unwrap();
        assert_eq!(detection.all_regions[0].class_name, "class_99");
        assert!(detection.text_regions.is_empty());
    }

    #[tokio::test]
    async fn nan_confidence_serializes_as_zero() {
        let adapter = adapter(vec![
            RawDetection::new([100.0, 50.0, 300.0, 80.0], f32::NAN, 12),
            RawDetection::new([100.0, 100.0, 200.0, 130.0], 1.4, 7),
        ]);

        let detection = adapter.detect(&RgbImage::new(400, 200)).await.unwrap();
        assert_eq!(detection.all_regions[0].confidence, 0.0);
        assert_eq!(detection.all_regions[1].confidence, 1.0);

        let json = serde_json::to_value(&detection.all_regions[0]).unwrap();
        assert_eq!(json["confidence"], serde_json::json!(0.0));
    }

    #[tokio::test]
    async fn backend_errors_become_detection_failures() {
        let backend = MockDetectionBackend::default().failing();
        let adapter = DetectionAdapter::new(Arc::new(backend), &RegionTaxonomy::default());

        let error = adapter.detect(&RgbImage::new(10, 10)).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DetectionFailure);
    }
}
