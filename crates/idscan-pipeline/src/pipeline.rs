//! The orchestrator composing detection and recognition.

use std::sync::Arc;
use std::time::Instant;

use idscan_core::{
    DetectionBackend, Error, ImageSource, PipelineResult, RecognitionBackend, Result,
    ServiceHealth, ServiceStatus, TimingBreakdown,
};
use serde_json::Value;

use crate::{
    DetectionAdapter, PipelineConfig, RecognitionAdapter, ServiceInfo, TRACING_TARGET_PIPELINE,
};

/// Two-stage field extraction pipeline.
///
/// Construct it once at startup and share it behind an [`Arc`]; invocations
/// are independent of each other and only read the shared backends.
///
/// One call to [`Pipeline::process`] moves through
/// `NotStarted -> Detecting -> (EarlyExit | Recognizing) -> Assembling -> Done`.
/// Only source resolution and detection can fail the call. Recognition
/// failures are confined to their region.
#[derive(Clone)]
pub struct Pipeline {
    detection: DetectionAdapter,
    recognition: RecognitionAdapter,
    started_at: Instant,
}

impl Pipeline {
    /// Creates a pipeline over the two backends.
    ///
    /// # Errors
    ///
    /// Returns a [`Configuration`] error if `config` is invalid.
    ///
    /// [`Configuration`]: idscan_core::ErrorKind::Configuration
    pub fn new(
        detection: Arc<dyn DetectionBackend>,
        recognition: Arc<dyn RecognitionBackend>,
        config: &PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;

        let detection = DetectionAdapter::new(detection, &config.taxonomy());
        let recognition = RecognitionAdapter::new(recognition, config.recognition_concurrency);

        tracing::info!(
            target: TRACING_TARGET_PIPELINE,
            text_labels = ?config.text_labels,
            missing_labels = ?detection.taxonomy().missing_labels(),
            recognition_concurrency = config.recognition_concurrency,
            "pipeline initialized"
        );

        Ok(Self {
            detection,
            recognition,
            started_at: Instant::now(),
        })
    }

    /// Runs detection and then recognition on `source`.
    ///
    /// # Errors
    ///
    /// - [`InitializationFailure`] if either backend is not ready; nothing is
    ///   read and no backend is called
    /// - [`SourceNotFound`] if the source cannot be read; no backend is called
    /// - [`DetectionFailure`] if the image cannot be decoded or the detector fails
    ///
    /// No partial result is produced in either case.
    ///
    /// [`InitializationFailure`]: idscan_core::ErrorKind::InitializationFailure
    /// [`SourceNotFound`]: idscan_core::ErrorKind::SourceNotFound
    /// [`DetectionFailure`]: idscan_core::ErrorKind::DetectionFailure
    pub async fn process(&self, source: &ImageSource) -> Result<PipelineResult> {
        if !self.is_ready() {
            tracing::warn!(
                target: TRACING_TARGET_PIPELINE,
                detection_ready = self.detection.backend().is_ready(),
                recognition_ready = self.recognition.backend().is_ready(),
                "refusing to process, backends are not initialized"
            );
            return Err(Error::initialization_failure()
                .with_message("detection or recognition backend is not initialized"));
        }

        let loaded = source.resolve().await?;
        let identifier = loaded.identifier().to_owned();

        let image = tokio::task::spawn_blocking(move || loaded.decode())
            .await
            .map_err(|e| {
                Error::internal_error()
                    .with_message("image decoding task failed")
                    .with_source(e)
            })??;

        let detection = self.detection.detect(&image).await?;
        let total_region_count = detection.all_regions.len();

        if detection.text_regions.is_empty() {
            tracing::info!(
                target: TRACING_TARGET_PIPELINE,
                source = %identifier,
                total_regions = total_region_count,
                detection_ms = detection.elapsed.as_millis() as u64,
                "no text regions detected"
            );

            return Ok(PipelineResult::no_text_regions(
                identifier,
                total_region_count,
                detection.elapsed,
            ));
        }

        let text_region_count = detection.text_regions.len();
        let recognition = self
            .recognition
            .recognize(&image, detection.text_regions)
            .await;

        let timing = TimingBreakdown::new(detection.elapsed, recognition.elapsed);

        tracing::info!(
            target: TRACING_TARGET_PIPELINE,
            source = %identifier,
            total_regions = total_region_count,
            text_regions = text_region_count,
            detection_seconds = timing.detection_seconds(),
            recognition_seconds = timing.recognition_seconds(),
            total_seconds = timing.total_seconds(),
            "pipeline completed"
        );

        Ok(PipelineResult::completed(
            identifier,
            total_region_count,
            recognition.extractions,
            timing,
        ))
    }

    /// Returns true if both backends are initialized and usable.
    pub fn is_ready(&self) -> bool {
        self.detection.backend().is_ready() && self.recognition.backend().is_ready()
    }

    /// Returns backend metadata and uptime without calling either model.
    pub fn service_info(&self) -> ServiceInfo {
        let detection_backend = self.detection.backend();
        let taxonomy = self.detection.taxonomy();

        let detection = detection_backend.is_ready().then(|| {
            detection_backend
                .model_info()
                .with_detail("text_class_ids", taxonomy.class_ids())
                .with_detail(
                    "text_labels",
                    taxonomy.taxonomy().labels().collect::<Vec<_>>(),
                )
                .with_detail("missing_labels", taxonomy.missing_labels().to_vec())
        });

        let recognition_backend = self.recognition.backend();
        let recognition = recognition_backend
            .is_ready()
            .then(|| recognition_backend.model_info());

        ServiceInfo {
            detection,
            recognition,
            uptime_seconds: self.uptime_seconds(),
        }
    }

    /// Returns seconds elapsed since construction.
    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    /// Probes both backends.
    ///
    /// An unhealthy detector makes the pipeline unhealthy. An unhealthy
    /// recognizer only degrades it, since every region would still come back
    /// blank rather than failing the request.
    pub async fn health_check(&self) -> ServiceHealth {
        let started = Instant::now();

        let detection = self
            .detection
            .backend()
            .health_check()
            .await
            .unwrap_or_else(|e| ServiceHealth::unhealthy(e.to_string()));
        let recognition = self
            .recognition
            .backend()
            .health_check()
            .await
            .unwrap_or_else(|e| ServiceHealth::unhealthy(e.to_string()));

        let recognition_status = match recognition.status {
            ServiceStatus::Unhealthy => ServiceStatus::Degraded,
            status => status,
        };
        let status = detection.status.worst(recognition_status);

        let mut health = match status {
            ServiceStatus::Healthy => ServiceHealth::healthy(),
            ServiceStatus::Degraded => ServiceHealth::degraded("recognition backend is impaired"),
            ServiceStatus::Unhealthy => ServiceHealth::unhealthy("detection backend is impaired"),
        };
        health = health
            .with_response_time(started.elapsed())
            .with_metric("detection", to_value(&detection))
            .with_metric("recognition", to_value(&recognition));

        tracing::debug!(
            target: TRACING_TARGET_PIPELINE,
            status = ?health.status,
            "health check completed"
        );

        health
    }
}

fn to_value(health: &ServiceHealth) -> Value {
    serde_json::to_value(health).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use idscan_test::{MockDetectionBackend, MockRecognitionBackend};

    use super::*;

    #[test]
    fn zero_concurrency_is_a_configuration_error() {
        let config = PipelineConfig {
            recognition_concurrency: 0,
            ..Default::default()
        };

        let result = Pipeline::new(
            Arc::new(MockDetectionBackend::default()),
            Arc::new(MockRecognitionBackend::default()),
            &config,
        );
        let error = result.err().map(|e| e.kind());
        assert_eq!(error, Some(idscan_core::ErrorKind::Configuration));
    }

    #[tokio::test]
    async fn unready_detector_is_reported_as_none() {
        let pipeline = Pipeline::new(
            Arc::new(MockDetectionBackend::default().not_ready()),
            Arc::new(MockRecognitionBackend::default()),
            &PipelineConfig::default(),
        )
        .unwrap();

        assert!(!pipeline.is_ready());
        let info = pipeline.service_info();
        assert!(info.detection.is_none());
        assert!(info.recognition.is_some());
    }

    #[tokio::test]
    async fn recognizer_outage_only_degrades() {
        let pipeline = Pipeline::new(
            Arc::new(MockDetectionBackend::default()),
            Arc::new(MockRecognitionBackend::default().unhealthy()),
            &PipelineConfig::default(),
        )
        .unwrap();

        let health = pipeline.health_check().await;
        assert_eq!(health.status, ServiceStatus::Degraded);
        assert!(health.metrics.contains_key("recognition"));

        let pipeline = Pipeline::new(
            Arc::new(MockDetectionBackend::default().unhealthy()),
            Arc::new(MockRecognitionBackend::default()),
            &PipelineConfig::default(),
        )
        .unwrap();
        assert_eq!(pipeline.health_check().await.status, ServiceStatus::Unhealthy);
    }
}
