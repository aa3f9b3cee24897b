//! ONNX Runtime backed [`DetectionBackend`].

use std::sync::{Arc, Mutex};
use std::time::Instant;

use idscan_core::{
    BackendInfo, ClassTable, DetectionBackend, RawDetection, ServiceHealth, id_card_class_table,
};
use image::RgbImage;
use ort::session::Session;
use ort::value::TensorRef;

use crate::processing::{self, DecodeOptions};
use crate::{Error, Result, TRACING_TARGET_INFERENCE, TRACING_TARGET_MODEL, YoloConfig};

/// YOLOv8 region detector.
///
/// The session is shared behind a mutex: ONNX Runtime needs exclusive access
/// to run, so concurrent requests queue up for inference while the rest of
/// their work proceeds in parallel.
#[derive(Clone)]
pub struct YoloDetector {
    session: Arc<Mutex<Session>>,
    class_table: ClassTable,
    config: YoloConfig,
}

impl std::fmt::Debug for YoloDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloDetector")
            .field("config", &self.config)
            .field("num_classes", &self.class_table.len())
            .finish_non_exhaustive()
    }
}

impl YoloDetector {
    /// Loads the model and its class table.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid, the model file is missing or
    /// rejected by ONNX Runtime, or the labels file cannot be read.
    pub fn new(config: YoloConfig) -> Result<Self> {
        config.validate()?;

        if !config.model_path.is_file() {
            return Err(Error::ModelNotFound(config.model_path.clone()));
        }

        let class_table = match &config.labels_path {
            Some(path) => crate::load_class_table(path)?,
            None => id_card_class_table(),
        };

        let started = Instant::now();
        let session = Self::build_session(&config).map_err(|source| Error::ModelLoad {
            path: config.model_path.clone(),
            source,
        })?;

        tracing::info!(
            target: TRACING_TARGET_MODEL,
            model_path = %config.model_path.display(),
            num_classes = class_table.len(),
            input_size = config.input_size,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded detection model"
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            class_table,
            config,
        })
    }

    fn build_session(config: &YoloConfig) -> std::result::Result<Session, ort::Error> {
        let mut builder = Session::builder()?;
        if let Some(threads) = config.intra_threads {
            builder = builder.with_intra_threads(threads)?;
        }
        builder.commit_from_file(&config.model_path)
    }

    /// Returns the configuration the detector was loaded with.
    pub fn config(&self) -> &YoloConfig {
        &self.config
    }

    fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            confidence_threshold: self.config.confidence_threshold,
            iou_threshold: self.config.iou_threshold,
            max_detections: self.config.max_detections,
        }
    }

    fn run(
        session: &Mutex<Session>,
        image: &RgbImage,
        input_size: u32,
        options: DecodeOptions,
    ) -> Result<Vec<RawDetection>> {
        let (input, letterbox) = processing::preprocess(image, input_size);

        let mut session = session.lock().map_err(|_| Error::SessionPoisoned)?;
        let tensor = TensorRef::from_array_view(input.view())?;
        let outputs = session.run(ort::inputs![tensor])?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        processing::decode(shape.as_ref(), data, &letterbox, options)
    }
}

#[async_trait::async_trait]
impl DetectionBackend for YoloDetector {
    fn class_table(&self) -> &ClassTable {
        &self.class_table
    }

    async fn infer(&self, image: &RgbImage) -> idscan_core::Result<Vec<RawDetection>> {
        let session = Arc::clone(&self.session);
        let image = image.clone();
        let input_size = self.config.input_size;
        let options = self.decode_options();

        let started = Instant::now();
        let detections = tokio::task::spawn_blocking(move || {
            Self::run(&session, &image, input_size, options)
        })
        .await
        .map_err(Error::from)??;

        tracing::debug!(
            target: TRACING_TARGET_INFERENCE,
            detections = detections.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "inference completed"
        );

        Ok(detections)
    }

    fn model_info(&self) -> BackendInfo {
        BackendInfo::new("yolo", self.config.model_path.display().to_string())
            .with_detail("model_path", self.config.model_path.display().to_string())
            .with_detail("num_classes", self.class_table.len())
            .with_detail(
                "class_names",
                self.class_table.values().cloned().collect::<Vec<_>>(),
            )
            .with_detail("input_size", self.config.input_size)
            .with_detail("confidence_threshold", self.config.confidence_threshold)
    }

    fn is_ready(&self) -> bool {
        !self.session.is_poisoned()
    }

    async fn health_check(&self) -> idscan_core::Result<ServiceHealth> {
        if self.is_ready() {
            let num_classes = self.class_table.len();
            Ok(ServiceHealth::healthy().with_metric("num_classes", num_classes.into()))
        } else {
            Ok(ServiceHealth::unhealthy("inference session is poisoned"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn missing_model_fails_before_touching_the_runtime() {
        let config = YoloConfig::new("/nonexistent/model.onnx");
        match YoloDetector::new(config) {
            Err(Error::ModelNotFound(path)) => {
                assert_eq!(path, PathBuf::from("/nonexistent/model.onnx"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn invalid_config_is_rejected_first() {
        let config = YoloConfig::new("/nonexistent/model.onnx").with_input_size(33);
        assert!(matches!(YoloDetector::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn unreadable_labels_fail_initialization() {
        let model = tempfile::NamedTempFile::new().unwrap();
        let config = YoloConfig::new(model.path()).with_labels_path("/nonexistent/labels.txt");

        let error: idscan_core::Error = YoloDetector::new(config).unwrap_err().into();
        assert_eq!(error.kind(), idscan_core::ErrorKind::InitializationFailure);
    }
}
