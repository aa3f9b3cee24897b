//! Mock implementations of the detection and recognition backends.
//!
//! The defaults reproduce a card with two text fields: a `name` region
//! (class 12) and an `id` region (class 7), each read back as
//! `"Mock text"` with confidence `0.95`.

mod detection;
mod recognition;

use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
pub use detection::{MockDetectionBackend, default_detections};
use idscan_core::{DetectionBackend, RecognitionBackend};
pub use recognition::MockRecognitionBackend;
use serde::{Deserialize, Serialize};

/// Configuration for the mock backends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct MockConfig {
    /// Text returned for every recognized region.
    #[cfg_attr(feature = "config", arg(long = "mock-text", env = "MOCK_TEXT"))]
    #[serde(default)]
    pub mock_text: Option<String>,

    /// Artificial latency added to every backend call, in milliseconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "mock-latency-ms", env = "MOCK_LATENCY_MS", default_value_t = 0)
    )]
    #[serde(default)]
    pub mock_latency_ms: u64,
}

impl MockConfig {
    fn latency(&self) -> Duration {
        Duration::from_millis(self.mock_latency_ms)
    }
}

/// Creates both mock backends from one configuration.
pub fn create_mock_backends(
    config: MockConfig,
) -> (Arc<dyn DetectionBackend>, Arc<dyn RecognitionBackend>) {
    (
        Arc::new(MockDetectionBackend::new(config.clone())),
        Arc::new(MockRecognitionBackend::new(config)),
    )
}

async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}
