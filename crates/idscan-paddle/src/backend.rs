//! [`RecognitionBackend`] over the HTTP client.

use std::io::Cursor;

use idscan_core::{BackendInfo, RecognitionBackend, Recognized, ServiceHealth};
use image::{ImageFormat, RgbImage};

use crate::{PaddleClient, PaddleConfig, Result, TRACING_TARGET_RECOGNITION};

/// Recognition backend that reads each crop through a remote server.
#[derive(Debug, Clone)]
pub struct PaddleRecognizer {
    client: PaddleClient,
}

impl PaddleRecognizer {
    /// Creates a recognizer from a client configuration.
    pub fn new(config: PaddleConfig) -> Result<Self> {
        Ok(Self::from_client(PaddleClient::new(config)?))
    }

    /// Wraps an existing client.
    pub fn from_client(client: PaddleClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &PaddleClient {
        &self.client
    }
}

fn encode_png(crop: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    crop.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

#[async_trait::async_trait]
impl RecognitionBackend for PaddleRecognizer {
    async fn read(&self, crop: RgbImage) -> idscan_core::Result<Recognized> {
        let png = encode_png(&crop)?;
        let response = self.client.recognize_png(png).await?;

        tracing::trace!(
            target: TRACING_TARGET_RECOGNITION,
            chars = response.text.chars().count(),
            confidence = ?response.confidence,
            "crop recognized"
        );

        let recognized = Recognized::text(response.text);
        Ok(match response.confidence {
            Some(confidence) => recognized.with_confidence(confidence),
            None => recognized,
        })
    }

    fn model_info(&self) -> BackendInfo {
        let config = self.client.config();
        BackendInfo::new("paddle", config.model_name.clone())
            .with_detail("endpoint", self.client.recognize_url().as_str())
            .with_detail("device", config.device.clone())
            .with_detail("max_retries", config.max_retries)
    }

    async fn health_check(&self) -> idscan_core::Result<ServiceHealth> {
        Ok(match self.client.health_check().await {
            Ok(elapsed) => ServiceHealth::healthy().with_response_time(elapsed),
            Err(error) => ServiceHealth::unhealthy(error.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn crops_encode_as_png() {
        let crop = RgbImage::from_pixel(8, 4, Rgb([10, 20, 30]));
        let png = encode_png(&crop).unwrap();

        assert_eq!(&png[1..4], b"PNG");
        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (8, 4));
    }

    #[test]
    fn model_info_reports_endpoint_and_device() {
        let config = PaddleConfig::new("http://ocr:9000").unwrap().with_device("cpu");
        let info = PaddleRecognizer::new(config).unwrap().model_info();

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["backend"], "paddle");
        assert_eq!(json["model"], "vgg_transformer");
        assert_eq!(json["endpoint"], "http://ocr:9000/api/v1/ocr/recognize");
        assert_eq!(json["device"], "cpu");
    }
}
