//! Backend selection and pipeline construction.

use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use idscan_core::{ClassTable, DetectionBackend, RecognitionBackend, id_card_class_table};
use idscan_paddle::{PaddleConfig, PaddleRecognizer};
use idscan_pipeline::{Pipeline, PipelineConfig};
use idscan_yolo::{YoloConfig, YoloDetector, load_class_table};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

type Backends = (Arc<dyn DetectionBackend>, Arc<dyn RecognitionBackend>);

/// Pipeline and backend configuration shared by every command that runs
/// the pipeline.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Text labels and recognition concurrency.
    #[clap(flatten)]
    pub pipeline: PipelineConfig,

    /// Detection model settings.
    #[clap(flatten)]
    pub yolo: YoloConfig,

    /// Recognition server settings.
    #[clap(flatten)]
    pub paddle: PaddleConfig,

    /// Run against the deterministic mock backends instead of the models.
    #[cfg(feature = "mock")]
    #[arg(long = "mock", env = "USE_MOCK_BACKENDS")]
    #[serde(default)]
    pub use_mock: bool,

    /// Mock backend settings.
    #[cfg(feature = "mock")]
    #[clap(flatten)]
    #[serde(default)]
    pub mock: idscan_test::MockConfig,
}

impl BackendConfig {
    /// Validates the pipeline and the selected backends.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.pipeline
            .validate()
            .context("invalid pipeline configuration")?;

        if self.uses_mock() {
            return Ok(());
        }

        self.yolo
            .validate()
            .context("invalid detection model configuration")?;
        self.paddle
            .validate()
            .context("invalid recognition server configuration")?;
        Ok(())
    }

    /// Builds both backends.
    ///
    /// # Errors
    ///
    /// Returns an initialization failure if the model cannot be loaded or
    /// the recognition client cannot be built.
    pub fn create_backends(&self) -> anyhow::Result<Backends> {
        #[cfg(feature = "mock")]
        if self.use_mock {
            tracing::warn!(
                target: TRACING_TARGET_CONFIG,
                "Using mock backends, results are synthetic"
            );
            return Ok(idscan_test::create_mock_backends(self.mock.clone()));
        }

        let detector = YoloDetector::new(self.yolo.clone())
            .map_err(idscan_core::Error::from)
            .context("failed to initialize the detection backend")?;

        let recognizer = PaddleRecognizer::new(self.paddle.clone())
            .map_err(|error| {
                idscan_core::Error::initialization_failure()
                    .with_message(error.to_string())
                    .with_source(error)
            })
            .context("failed to initialize the recognition backend")?;

        Ok((Arc::new(detector), Arc::new(recognizer)))
    }

    /// Builds the backends and the pipeline over them.
    pub fn create_pipeline(&self) -> anyhow::Result<Pipeline> {
        let (detection, recognition) = self.create_backends()?;
        Pipeline::new(detection, recognition, &self.pipeline)
            .context("failed to create the pipeline")
    }

    /// Returns the detector class table without loading the model.
    pub fn class_table(&self) -> anyhow::Result<ClassTable> {
        if self.uses_mock() {
            return Ok(id_card_class_table());
        }

        match &self.yolo.labels_path {
            Some(path) => load_class_table(path)
                .with_context(|| format!("failed to load labels from {}", path.display())),
            None => Ok(id_card_class_table()),
        }
    }

    /// Logs backend configuration at info level (no secrets).
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            text_labels = ?self.pipeline.text_labels,
            recognition_concurrency = self.pipeline.recognition_concurrency,
            mock = self.uses_mock(),
            "Pipeline configuration"
        );

        if self.uses_mock() {
            return;
        }

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            model_path = %self.yolo.model_path.display(),
            confidence_threshold = self.yolo.confidence_threshold,
            iou_threshold = self.yolo.iou_threshold,
            input_size = self.yolo.input_size,
            "Detection configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            base_url = %self.paddle.base_url,
            model_name = %self.paddle.model_name,
            timeout_secs = self.paddle.timeout_secs,
            max_retries = self.paddle.max_retries,
            "Recognition configuration"
        );
    }

    #[cfg(feature = "mock")]
    fn uses_mock(&self) -> bool {
        self.use_mock
    }

    #[cfg(not(feature = "mock"))]
    fn uses_mock(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        backends: BackendConfig,
    }

    fn parse(args: &[&str]) -> BackendConfig {
        let argv = std::iter::once("idscan").chain(args.iter().copied());
        Harness::try_parse_from(argv).unwrap().backends
    }

    #[test]
    fn class_table_defaults_to_the_id_card_classes() {
        let config = parse(&[]);
        assert_eq!(config.class_table().unwrap(), id_card_class_table());
    }

    #[test]
    fn class_table_reads_a_labels_file() {
        let mut labels = tempfile::NamedTempFile::new().unwrap();
        writeln!(labels, "cccd\nname\ndob").unwrap();

        let path = labels.path().to_str().unwrap();
        let config = parse(&["--yolo-labels", path]);
        let table = config.class_table().unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table[&1], "name");
    }

    #[test]
    fn missing_labels_file_is_an_error() {
        let config = parse(&["--yolo-labels", "/nonexistent/labels.txt"]);
        let error = config.class_table().unwrap_err();
        assert!(error.to_string().contains("/nonexistent/labels.txt"));
    }

    #[test]
    fn missing_model_fails_initialization() {
        let config = parse(&["--yolo-model", "/nonexistent/model.onnx"]);
        assert!(config.create_backends().is_err());
    }
}
