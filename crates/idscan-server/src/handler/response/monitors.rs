use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Coarse readiness reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Body of `GET /api/v1/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Server version.
    pub version: String,
    /// True if both backends are initialized.
    pub models_loaded: bool,
    pub timestamp: Timestamp,
    /// Seconds since the pipeline was constructed.
    pub uptime: f64,
}
