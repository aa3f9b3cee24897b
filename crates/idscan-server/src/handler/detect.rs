//! Image upload and field extraction.

use std::sync::Arc;

use axum::{Json, Router};
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use idscan_core::{ImageSource, PipelineResult};
use idscan_pipeline::Pipeline;

use crate::handler::{Error, ErrorKind, Result};
use crate::service::{ServiceState, StagedUpload, UploadConfig};

/// Tracing target for extraction requests.
const TRACING_TARGET: &str = "idscan_server::handler::detect";

/// Name of the multipart part carrying the image.
const FILE_FIELD: &str = "file";

/// An image read from the multipart body.
struct UploadedFile {
    file_name: String,
    extension: String,
    data: Vec<u8>,
}

/// Runs the pipeline on an uploaded image.
///
/// The image is staged in a temporary file for the duration of the call.
#[tracing::instrument(skip_all)]
async fn detect(
    State(pipeline): State<Arc<Pipeline>>,
    State(upload): State<UploadConfig>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<PipelineResult>> {
    let mut multipart = multipart
        .map_err(|rejection| ErrorKind::BadRequest.with_message(rejection.body_text()))?;

    let file = read_file(&mut multipart, &upload).await?;

    tracing::info!(
        target: TRACING_TARGET,
        file_name = %file.file_name,
        bytes = file.data.len(),
        "upload received"
    );

    let staged = StagedUpload::write(&upload, &file.extension, file.data)
        .await
        .map_err(|err| {
            tracing::error!(
                target: TRACING_TARGET,
                error = %err,
                "failed to stage upload"
            );
            ErrorKind::InternalServerError
                .with_message("Failed to store the uploaded file")
                .with_context(err.to_string())
        })?;

    let source = ImageSource::path(staged.path());
    let result = pipeline.process(&source).await.map_err(|err| {
        tracing::error!(
            target: TRACING_TARGET,
            file_name = %file.file_name,
            error = %err,
            "extraction failed"
        );
        Error::from(err)
    })?;
    drop(staged);

    tracing::info!(
        target: TRACING_TARGET,
        file_name = %file.file_name,
        regions = result.total_region_count(),
        extractions = result.extractions().len(),
        "extraction completed"
    );

    Ok(Json(result))
}

/// Reads the `file` part, enforcing the name, extension and size rules.
async fn read_file(multipart: &mut Multipart, upload: &UploadConfig) -> Result<UploadedFile> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        return read_field(field, upload).await;
    }

    Err(ErrorKind::BadRequest.with_message("No file provided"))
}

async fn read_field(mut field: Field<'_>, upload: &UploadConfig) -> Result<UploadedFile> {
    let file_name = field
        .file_name()
        .filter(|name| !name.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| ErrorKind::BadRequest.with_message("No filename provided"))?;

    let extension = UploadConfig::extension_of(&file_name)
        .filter(|ext| upload.is_allowed(ext))
        .ok_or_else(|| {
            let found = UploadConfig::extension_of(&file_name).unwrap_or_default();
            ErrorKind::BadRequest.with_message(format!(
                "File type .{found} not allowed. Allowed types: {}",
                upload.allowed_extensions.join(", ")
            ))
        })?;

    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if data.len() + chunk.len() > upload.max_file_size {
            return Err(ErrorKind::BadRequest.with_message(format!(
                "File too large. Max size: {} bytes",
                upload.max_file_size
            )));
        }
        data.extend_from_slice(&chunk);
    }

    if data.is_empty() {
        return Err(ErrorKind::BadRequest.with_message("Uploaded file is empty"));
    }

    Ok(UploadedFile {
        file_name,
        extension,
        data,
    })
}

fn multipart_error(err: MultipartError) -> Error {
    tracing::warn!(
        target: TRACING_TARGET,
        error = %err,
        "malformed multipart body"
    );

    ErrorKind::BadRequest.with_message(format!("Invalid multipart body: {}", err.body_text()))
}

/// Returns a [`Router`] with the upload route.
pub fn routes(upload: &UploadConfig) -> Router<ServiceState> {
    Router::new()
        .route("/detect", post(detect))
        .layer(DefaultBodyLimit::max(upload.body_limit()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;

    use axum_test::multipart::{MultipartForm, Part};
    use idscan_core::{Error as PipelineError, RawDetection, Recognized};
    use idscan_test::{MockDetectionBackend, MockRecognitionBackend};
    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;
    use crate::handler::response::ErrorResponse;
    use crate::handler::test::{create_test_server, create_test_server_with_backends};

    fn card_png() -> Vec<u8> {
        let image = RgbImage::from_pixel(400, 200, Rgb([220, 220, 220]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn upload_form(file_name: &str, data: Vec<u8>) -> MultipartForm {
        MultipartForm::new().add_part(
            "file",
            Part::bytes(data).file_name(file_name).mime_type("image/png"),
        )
    }

    #[tokio::test]
    async fn upload_returns_pipeline_result() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server
            .post("/api/v1/detect")
            .multipart(upload_form("card.png", card_png()))
            .await;
        response.assert_status_success();

        let body = response.json::<serde_json::Value>();
        assert_eq!(body["succeeded"], true);
        assert_eq!(body["total_region_count"], 2);

        let extractions = body["extractions"].as_array().unwrap();
        assert_eq!(extractions.len(), 2);
        assert_eq!(extractions[0]["region"]["class_name"], "name");
        assert_eq!(extractions[0]["extracted_text"], "Mock text");
        assert_eq!(extractions[1]["region"]["class_name"], "id");

        let source = body["source_identifier"].as_str().unwrap();
        assert!(source.ends_with(".png"));
        assert!(!std::path::Path::new(source).exists());
        Ok(())
    }

    #[tokio::test]
    async fn temp_file_is_removed_after_failure() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let server = create_test_server_with_backends(
            Arc::new(MockDetectionBackend::default().failing()),
            Arc::new(MockRecognitionBackend::default()),
            UploadConfig::default().with_temp_dir(dir.path()),
        )?;

        let response = server
            .post("/api/v1/detect")
            .multipart(upload_form("card.png", card_png()))
            .await;
        response.assert_status_internal_server_error();
        assert!(
            response
                .json::<ErrorResponse>()
                .error
                .starts_with("Processing failed")
        );

        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn only_text_regions_are_recognized() -> anyhow::Result<()> {
        let recognition = MockRecognitionBackend::default()
            .with_reader(|_| Ok(Recognized::text("079201001234")));
        let server = create_test_server_with_backends(
            Arc::new(MockDetectionBackend::default().with_detections(vec![
                RawDetection::new([10.0, 10.0, 60.0, 40.0], 0.9, 1),
                RawDetection::new([100.0, 100.0, 200.0, 130.0], 0.8, 7),
            ])),
            Arc::new(recognition.clone()),
            UploadConfig::default(),
        )?;

        let response = server
            .post("/api/v1/detect")
            .multipart(upload_form("card.PNG", card_png()))
            .await;
        response.assert_status_success();

        let body = response.json::<serde_json::Value>();
        assert_eq!(body["total_region_count"], 2);
        assert_eq!(body["extractions"][0]["extracted_text"], "079201001234");
        assert_eq!(body["extractions"][0]["recognition_confidence"], 1.0);
        assert_eq!(recognition.calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_part_is_rejected() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let form = MultipartForm::new().add_text("note", "front side");
        let response = server.post("/api/v1/detect").multipart(form).await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<ErrorResponse>().error, "No file provided");
        Ok(())
    }

    #[tokio::test]
    async fn disallowed_extension_is_rejected() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server
            .post("/api/v1/detect")
            .multipart(upload_form("card.gif", card_png()))
            .await;
        response.assert_status_bad_request();

        let body = response.json::<ErrorResponse>();
        assert_eq!(body.error_code, "bad_request");
        assert!(body.error.starts_with("File type .gif not allowed"));
        assert!(body.timestamp.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() -> anyhow::Result<()> {
        let (detection, recognition) = (
            Arc::new(MockDetectionBackend::default()),
            Arc::new(MockRecognitionBackend::default()),
        );
        let server = create_test_server_with_backends(
            detection.clone(),
            recognition,
            UploadConfig::default().with_max_file_size(1024),
        )?;

        let response = server
            .post("/api/v1/detect")
            .multipart(upload_form("card.png", vec![0; 4096]))
            .await;
        response.assert_status_bad_request();
        assert_eq!(
            response.json::<ErrorResponse>().error,
            "File too large. Max size: 1024 bytes"
        );
        assert_eq!(detection.calls(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn empty_file_is_rejected() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server
            .post("/api/v1/detect")
            .multipart(upload_form("card.png", Vec::new()))
            .await;
        response.assert_status_bad_request();
        Ok(())
    }

    #[tokio::test]
    async fn non_multipart_body_is_rejected() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server
            .post("/api/v1/detect")
            .json(&serde_json::json!({ "file": "card.png" }))
            .await;
        response.assert_status_bad_request();
        assert_eq!(
            response.json::<ErrorResponse>().error_code,
            "bad_request"
        );
        Ok(())
    }

    #[tokio::test]
    async fn undecodable_image_is_a_server_error() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server
            .post("/api/v1/detect")
            .multipart(upload_form("card.jpg", b"not an image".to_vec()))
            .await;
        response.assert_status_internal_server_error();
        assert!(
            response
                .json::<ErrorResponse>()
                .error
                .contains("detection_failure")
        );
        Ok(())
    }

    #[tokio::test]
    async fn recognition_errors_stay_in_their_region() -> anyhow::Result<()> {
        let server = create_test_server_with_backends(
            Arc::new(MockDetectionBackend::default()),
            Arc::new(MockRecognitionBackend::default().with_reader(|_| {
                Err(PipelineError::initialization_failure())
            })),
            UploadConfig::default(),
        )?;

        let response = server
            .post("/api/v1/detect")
            .multipart(upload_form("card.png", card_png()))
            .await;
        response.assert_status_success();
        assert_eq!(
            response.json::<serde_json::Value>()["extractions"][0]["extracted_text"],
            ""
        );
        Ok(())
    }

    #[tokio::test]
    async fn slow_recognition_still_completes() -> anyhow::Result<()> {
        let server = create_test_server_with_backends(
            Arc::new(MockDetectionBackend::default()),
            Arc::new(
                MockRecognitionBackend::default().with_latency(|_| Duration::from_millis(20)),
            ),
            UploadConfig::default(),
        )?;

        let response = server
            .post("/api/v1/detect")
            .multipart(upload_form("card.bmp", card_png()))
            .await;
        response.assert_status_success();
        Ok(())
    }
}
