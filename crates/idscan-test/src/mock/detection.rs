//! Mock detection backend for testing.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use idscan_core::{
    BackendInfo, ClassTable, DetectionBackend, Error, RawDetection, Result, ServiceHealth,
    id_card_class_table,
};
use image::RgbImage;

use super::{MockConfig, simulate_latency};

/// The detections emitted by a default [`MockDetectionBackend`].
pub fn default_detections() -> Vec<RawDetection> {
    vec![
        RawDetection::new([100.0, 50.0, 300.0, 80.0], 0.95, 12),
        RawDetection::new([100.0, 100.0, 200.0, 130.0], 0.90, 7),
    ]
}

/// Mock detection backend for testing.
///
/// Emits the same detections for every image, regardless of its content.
#[derive(Debug, Clone)]
pub struct MockDetectionBackend {
    config: MockConfig,
    class_table: ClassTable,
    detections: Vec<RawDetection>,
    fail: bool,
    ready: bool,
    healthy: bool,
    calls: Arc<AtomicUsize>,
}

impl Default for MockDetectionBackend {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

impl MockDetectionBackend {
    /// Creates a new mock detection backend with the given configuration.
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            class_table: id_card_class_table(),
            detections: default_detections(),
            fail: false,
            ready: true,
            healthy: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replaces the emitted detections.
    pub fn with_detections(mut self, detections: Vec<RawDetection>) -> Self {
        self.detections = detections;
        self
    }

    /// Replaces the class table.
    pub fn with_class_table(mut self, class_table: ClassTable) -> Self {
        self.class_table = class_table;
        self
    }

    /// Makes every inference fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Reports the backend as not initialized.
    pub fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    /// Makes health checks report the backend as unhealthy.
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Returns how many times [`DetectionBackend::infer`] was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DetectionBackend for MockDetectionBackend {
    fn class_table(&self) -> &ClassTable {
        &self.class_table
    }

    async fn infer(&self, _image: &RgbImage) -> Result<Vec<RawDetection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        simulate_latency(self.config.latency()).await;

        if self.fail {
            return Err(Error::detection_failure().with_message("mock detector failure"));
        }

        Ok(self.detections.clone())
    }

    fn model_info(&self) -> BackendInfo {
        BackendInfo::new("mock", "mock-detector")
            .with_detail("num_classes", self.class_table.len())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        if self.healthy {
            Ok(ServiceHealth::healthy())
        } else {
            Ok(ServiceHealth::unhealthy("mock detector is down"))
        }
    }
}
