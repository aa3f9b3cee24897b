//! Mock recognition backend for testing.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use idscan_core::{BackendInfo, Error, RecognitionBackend, Recognized, Result, ServiceHealth};
use image::RgbImage;

use super::{MockConfig, simulate_latency};

const DEFAULT_TEXT: &str = "Mock text";
const DEFAULT_CONFIDENCE: f32 = 0.95;

type Reader = dyn Fn(&RgbImage) -> Result<Recognized> + Send + Sync;
type Latency = dyn Fn(&RgbImage) -> Duration + Send + Sync;

/// Mock recognition backend for testing.
///
/// Returns [`MockConfig::mock_text`] for every crop unless a reader closure
/// is installed with [`MockRecognitionBackend::with_reader`].
#[derive(Clone)]
pub struct MockRecognitionBackend {
    config: MockConfig,
    reader: Option<Arc<Reader>>,
    latency: Option<Arc<Latency>>,
    fail: bool,
    ready: bool,
    healthy: bool,
    calls: Arc<AtomicUsize>,
}

impl Default for MockRecognitionBackend {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

impl fmt::Debug for MockRecognitionBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockRecognitionBackend")
            .field("config", &self.config)
            .field("reader", &self.reader.is_some())
            .field("fail", &self.fail)
            .field("ready", &self.ready)
            .field("calls", &self.calls())
            .finish()
    }
}

impl MockRecognitionBackend {
    /// Creates a new mock recognition backend with the given configuration.
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            reader: None,
            latency: None,
            fail: false,
            ready: true,
            healthy: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Computes the result of every call from the crop.
    pub fn with_reader<F>(mut self, reader: F) -> Self
    where
        F: Fn(&RgbImage) -> Result<Recognized> + Send + Sync + 'static,
    {
        self.reader = Some(Arc::new(reader));
        self
    }

    /// Computes a per-call delay from the crop, replacing the configured one.
    pub fn with_latency<F>(mut self, latency: F) -> Self
    where
        F: Fn(&RgbImage) -> Duration + Send + Sync + 'static,
    {
        self.latency = Some(Arc::new(latency));
        self
    }

    /// Makes every call fail.
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

    /// Returns how many times [`RecognitionBackend::read`] was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RecognitionBackend for MockRecognitionBackend {
    async fn read(&self, crop: RgbImage) -> Result<Recognized> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = match &self.latency {
            Some(latency) => latency(&crop),
            None => self.config.latency(),
        };
        simulate_latency(latency).await;

        if self.fail {
            return Err(Error::recognition_failure().with_message("mock recognizer failure"));
        }

        match &self.reader {
            Some(reader) => reader(&crop),
            None => {
                let text = self.config.mock_text.as_deref().unwrap_or(DEFAULT_TEXT);
                Ok(Recognized::text(text).with_confidence(DEFAULT_CONFIDENCE))
            }
        }
    }

    fn model_info(&self) -> BackendInfo {
        BackendInfo::new("mock", "mock-recognizer").with_detail("device", "none")
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        if self.healthy {
            Ok(ServiceHealth::healthy())
        } else {
            Ok(ServiceHealth::unhealthy("mock recognizer is down"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_text_and_confidence() {
        let backend = MockRecognitionBackend::default();
        let recognized = backend.read(RgbImage::new(4, 4)).await.unwrap();

        assert_eq!(recognized.text, "Mock text");
        assert_eq!(recognized.confidence, Some(0.95));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn configured_text_wins() {
        let backend = MockRecognitionBackend::new(MockConfig {
            mock_text: Some("NGUYEN VAN A".into()),
            ..Default::default()
        });
        let recognized = backend.read(RgbImage::new(4, 4)).await.unwrap();
        assert_eq!(recognized.text, "NGUYEN VAN A");
    }
}
