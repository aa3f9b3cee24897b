//! Recognition stage: crop each text-bearing region and read it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use futures::stream;
use idscan_core::{FieldExtraction, RecognitionBackend, RecognitionOutcome, Region};
use image::RgbImage;
use image::imageops;

use crate::TRACING_TARGET_RECOGNITION;

/// Confidence recorded when a backend returns text without a score.
///
/// This is a placeholder, not a calibrated probability.
pub const ASSUMED_CONFIDENCE: f32 = 1.0;

/// Output of one recognition batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    /// One extraction per input region, in input order.
    pub extractions: Vec<FieldExtraction>,
    /// Wall-clock time for the whole batch.
    pub elapsed: Duration,
}

/// Wraps a [`RecognitionBackend`] and isolates failures per region.
#[derive(Clone)]
pub struct RecognitionAdapter {
    backend: Arc<dyn RecognitionBackend>,
    concurrency: usize,
}

impl RecognitionAdapter {
    /// Creates an adapter that keeps at most `concurrency` backend calls in
    /// flight. A value of zero is treated as one.
    pub fn new(backend: Arc<dyn RecognitionBackend>, concurrency: usize) -> Self {
        Self {
            backend,
            concurrency: concurrency.max(1),
        }
    }

    /// Returns the wrapped backend.
    pub fn backend(&self) -> &Arc<dyn RecognitionBackend> {
        &self.backend
    }

    /// Recognizes every region of `image`.
    ///
    /// Never fails: a region whose crop is empty or whose backend call errors
    /// yields an extraction with empty text and zero confidence, and the
    /// other regions are unaffected.
    pub async fn recognize(&self, image: &RgbImage, regions: Vec<Region>) -> Recognition {
        let started = Instant::now();

        let extractions: Vec<FieldExtraction> = stream::iter(regions)
            .map(|region| async move {
                let outcome = self.read_region(image, &region).await;
                outcome.into_extraction(region)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let elapsed = started.elapsed();
        let failed = extractions.iter().filter(|e| e.is_blank()).count();

        tracing::debug!(
            target: TRACING_TARGET_RECOGNITION,
            regions = extractions.len(),
            failed,
            elapsed_ms = elapsed.as_millis() as u64,
            "recognition completed"
        );

        Recognition {
            extractions,
            elapsed,
        }
    }

    async fn read_region(&self, image: &RgbImage, region: &Region) -> RecognitionOutcome {
        let Some(crop) = crop(image, region) else {
            tracing::warn!(
                target: TRACING_TARGET_RECOGNITION,
                ordinal = region.ordinal,
                class_name = %region.class_name,
                bbox = ?<[i32; 4]>::from(region.bbox),
                "region lies outside the image, skipping recognition"
            );
            return RecognitionOutcome::Failed;
        };

        match self.backend.read(crop).await {
            Ok(recognized) => RecognitionOutcome::success(
                recognized.text,
                recognized.confidence.unwrap_or(ASSUMED_CONFIDENCE),
            ),
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_RECOGNITION,
                    ordinal = region.ordinal,
                    class_name = %region.class_name,
                    error = %error,
                    "recognition failed for region"
                );
                RecognitionOutcome::Failed
            }
        }
    }
}

/// Copies the part of `image` covered by the region, clipped to the image.
fn crop(image: &RgbImage, region: &Region) -> Option<RgbImage> {
    let (x, y, width, height) = region.bbox.clip(image.width(), image.height())?;
    Some(imageops::crop_imm(image, x, y, width, height).to_image())
}

#[cfg(test)]
mod tests {
    use idscan_core::{BoundingBox, Error, Recognized};
    use idscan_test::MockRecognitionBackend;
    use image::Rgb;

    use super::*;

    fn region(ordinal: u32, bbox: [i32; 4]) -> Region {
        Region {
            ordinal,
            bbox: BoundingBox::from(bbox),
            confidence: 0.9,
            class_id: 12,
            class_name: "name".to_owned(),
        }
    }

    #[tokio::test]
    async fn crops_match_the_region_size() {
        let backend = MockRecognitionBackend::default()
            .with_reader(|crop| Ok(Recognized::text(format!("{}x{}", crop.width(), crop.height()))));
        let adapter = RecognitionAdapter::new(Arc::new(backend), 2);

        let image = RgbImage::from_pixel(50, 40, Rgb([255, 255, 255]));
        let recognition = adapter
            .recognize(&image, vec![region(1, [0, 0, 20, 10]), region(2, [40, 30, 60, 60])])
            .await;

        let texts: Vec<&str> = recognition
            .extractions
            .iter()
            .map(|e| e.extracted_text.as_str())
            .collect();
        assert_eq!(texts, ["20x10", "10x10"]);
    }

    #[tokio::test]
    async fn missing_confidence_is_assumed() {
        let backend =
            MockRecognitionBackend::default().with_reader(|_| Ok(Recognized::text("0123")));
        let adapter = RecognitionAdapter::new(Arc::new(backend), 1);

        let recognition = adapter
            .recognize(&RgbImage::new(10, 10), vec![region(1, [0, 0, 5, 5])])
            .await;
        assert_eq!(
            recognition.extractions[0].recognition_confidence,
            ASSUMED_CONFIDENCE
        );
    }

    #[tokio::test]
    async fn out_of_range_region_is_blank_and_skips_backend() {
        let backend = Arc::new(MockRecognitionBackend::default());
        let adapter = RecognitionAdapter::new(backend.clone(), 4);

        let recognition = adapter
            .recognize(&RgbImage::new(10, 10), vec![region(1, [50, 50, 80, 80])])
            .await;

        assert!(recognition.extractions[0].is_blank());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn errors_stay_with_their_region() {
        let backend = MockRecognitionBackend::default().with_reader(|crop| {
            if crop.width() == 3 {
                Err(Error::recognition_failure().with_message("unreadable"))
            } else {
                Ok(Recognized::text("ok").with_confidence(0.8))
            }
        });
        let adapter = RecognitionAdapter::new(Arc::new(backend), 4);

        let recognition = adapter
            .recognize(
                &RgbImage::new(20, 20),
                vec![
                    region(1, [0, 0, 5, 5]),
                    region(2, [0, 0, 3, 5]),
                    region(3, [0, 0, 7, 5]),
                ],
            )
            .await;

        let blanks: Vec<bool> = recognition.extractions.iter().map(|e| e.is_blank()).collect();
        assert_eq!(blanks, [false, true, false]);
        assert_eq!(recognition.extractions[0].recognition_confidence, 0.8);
    }
}
