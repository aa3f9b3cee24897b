//! Middleware configuration for the HTTP server.
//!
//! All middleware configs are re-exported from `idscan-server` and support
//! both CLI arguments and environment variables.
//!
//! ```bash
//! idscan serve --cors-origins "https://kyc.example.com" --request-timeout 60
//! ```

use clap::Args;
use idscan_server::middleware::{AdmissionConfig, CorsConfig, RecoveryConfig};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Middleware configuration combining CORS, recovery and admission settings.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// CORS (Cross-Origin Resource Sharing) configuration.
    #[clap(flatten)]
    pub cors: CorsConfig,

    /// Request timeout and panic recovery.
    #[clap(flatten)]
    pub recovery: RecoveryConfig,

    /// Cap on concurrently processed uploads.
    #[clap(flatten)]
    pub admission: AdmissionConfig,
}

impl MiddlewareConfig {
    /// Validates the middleware settings.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.recovery.request_timeout == 0 || self.recovery.request_timeout > 300 {
            anyhow::bail!(
                "Request timeout {} seconds is invalid. Must be between 1 and 300 seconds.",
                self.recovery.request_timeout
            );
        }

        if self.admission.max_concurrent_requests == 0 {
            anyhow::bail!("Max concurrent requests must be at least 1");
        }

        Ok(())
    }

    /// Logs middleware configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            origins = ?self.cors.allowed_origins,
            credentials = self.cors.allow_credentials,
            "CORS configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            request_timeout_secs = self.recovery.request_timeout,
            max_concurrent_requests = self.admission.max_concurrent_requests,
            "Recovery and admission configuration"
        );
    }
}
