//! The HTTP API server.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use clap::Args;
use idscan_core::ServiceStatus;
use idscan_pipeline::Pipeline;
use idscan_server::handler::routes;
use idscan_server::middleware::{RouterObservabilityExt, RouterRecoveryExt, RouterSecurityExt};
use idscan_server::service::{ServiceState, UploadConfig};

use crate::TRACING_TARGET_STARTUP;
use crate::config::{BackendConfig, MiddlewareConfig, ServerConfig};
use crate::server;

/// Arguments of `idscan serve`.
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// HTTP middleware configuration (CORS, timeouts, admission).
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// Upload limits and temporary storage.
    #[clap(flatten)]
    pub upload: UploadConfig,

    #[clap(flatten)]
    pub backends: BackendConfig,
}

impl ServeArgs {
    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.middleware
            .validate()
            .context("invalid middleware configuration")?;
        self.upload
            .validate()
            .context("invalid upload configuration")?;
        self.backends.validate()
    }

    /// Logs configuration at info level (no sensitive information).
    pub fn log(&self) {
        self.server.log();
        self.middleware.log();
        self.backends.log();
    }
}

/// Builds the pipeline once and serves it until a shutdown signal arrives.
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    args.log();
    args.validate()?;

    let pipeline = Arc::new(args.backends.create_pipeline()?);
    probe_backends(&pipeline).await;

    let state = ServiceState::new(pipeline, args.upload.clone());
    let router = create_router(state, &args.middleware);

    server::serve(router, args.server).await?;
    Ok(())
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Recovery (outermost) - catches panics and enforces timeouts
/// 2. Observability - request ids and tracing spans
/// 3. Security - CORS and compression
/// 4. Routes (innermost) - admission control and handlers
fn create_router(state: ServiceState, middleware: &MiddlewareConfig) -> Router {
    routes(&state, &middleware.admission)
        .with_state(state)
        .with_security(&middleware.cors)
        .with_observability()
        .with_recovery(&middleware.recovery)
}

/// Logs the health of both backends once, before accepting requests.
async fn probe_backends(pipeline: &Pipeline) {
    let health = pipeline.health_check().await;

    match health.status {
        ServiceStatus::Healthy => tracing::info!(
            target: TRACING_TARGET_STARTUP,
            response_time = ?health.response,
            "Backends are healthy"
        ),
        _ => tracing::warn!(
            target: TRACING_TARGET_STARTUP,
            status = ?health.status,
            message = ?health.message,
            metrics = ?health.metrics,
            "Backends are not fully healthy"
        ),
    }
}
