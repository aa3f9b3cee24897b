//! Readiness and service introspection handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use idscan_pipeline::{Pipeline, ServiceInfo};
use jiff::Timestamp;

use crate::handler::response::{HealthResponse, HealthStatus};
use crate::service::ServiceState;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "idscan_server::handler::monitors";

/// Reports whether both backends are loaded.
///
/// Answers `503` with the same body when they are not.
#[tracing::instrument(skip_all)]
async fn health_status(
    State(pipeline): State<Arc<Pipeline>>,
) -> (StatusCode, Json<HealthResponse>) {
    let models_loaded = pipeline.is_ready();

    let (status, status_code) = if models_loaded {
        (HealthStatus::Healthy, StatusCode::OK)
    } else {
        (HealthStatus::Unhealthy, StatusCode::SERVICE_UNAVAILABLE)
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_owned(),
        models_loaded,
        timestamp: Timestamp::now(),
        uptime: pipeline.uptime_seconds(),
    };

    tracing::debug!(
        target: TRACING_TARGET,
        models_loaded,
        status_code = status_code.as_u16(),
        "health status prepared"
    );

    (status_code, Json(response))
}

/// Returns backend metadata and uptime.
#[tracing::instrument(skip_all)]
async fn service_info(State(pipeline): State<Arc<Pipeline>>) -> Json<ServiceInfo> {
    Json(pipeline.service_info())
}

/// Returns a [`Router`] with the health and info routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/health", get(health_status))
        .route("/info", get(service_info))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use idscan_test::{MockDetectionBackend, MockRecognitionBackend};

    use super::*;
    use crate::handler::test::{create_test_server, create_test_server_with_backends};
    use crate::service::UploadConfig;

    #[tokio::test]
    async fn healthy_when_models_are_loaded() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server.get("/api/v1/health").await;
        response.assert_status_ok();

        let body = response.json::<HealthResponse>();
        assert_eq!(body.status, HealthStatus::Healthy);
        assert!(body.models_loaded);
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
        assert!(body.uptime >= 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn unhealthy_when_a_backend_is_not_ready() -> anyhow::Result<()> {
        let server = create_test_server_with_backends(
            Arc::new(MockDetectionBackend::default()),
            Arc::new(MockRecognitionBackend::default().not_ready()),
            UploadConfig::default(),
        )?;

        let response = server.get("/api/v1/health").await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

        let body = response.json::<HealthResponse>();
        assert_eq!(body.status, HealthStatus::Unhealthy);
        assert!(!body.models_loaded);
        Ok(())
    }

    #[tokio::test]
    async fn info_reports_both_backends() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server.get("/api/v1/info").await;
        response.assert_status_ok();

        let info = response.json::<ServiceInfo>();
        let detection = info.detection.expect("detection metadata");
        let recognition = info.recognition.expect("recognition metadata");
        assert_eq!(detection.backend, "mock");
        assert_eq!(recognition.model, "mock-recognizer");
        Ok(())
    }

    #[tokio::test]
    async fn info_omits_backends_that_are_not_ready() -> anyhow::Result<()> {
        let server = create_test_server_with_backends(
            Arc::new(MockDetectionBackend::default().not_ready()),
            Arc::new(MockRecognitionBackend::default()),
            UploadConfig::default(),
        )?;

        let info = server.get("/api/v1/info").await.json::<ServiceInfo>();
        assert!(info.detection.is_none());
        assert!(info.recognition.is_some());
        Ok(())
    }
}
