use idscan_core::BackendInfo;
use serde::{Deserialize, Serialize};

/// Introspection data for health and info endpoints.
///
/// A backend that is not ready is reported as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Detection backend metadata, extended with the bound taxonomy.
    pub detection: Option<BackendInfo>,
    /// Recognition backend metadata.
    pub recognition: Option<BackendInfo>,
    /// Seconds since the pipeline was constructed.
    pub uptime_seconds: f64,
}
