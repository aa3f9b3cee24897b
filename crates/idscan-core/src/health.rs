//! Health reporting for detection and recognition backends.
//!
//! Readiness (`is_ready`) only says whether both backends were constructed.
//! Health goes one step further and lets a backend probe whatever it depends
//! on (a model session, a remote recognition server) without running a
//! detection or recognition call.

use std::collections::BTreeMap;
use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a health probe, ordered from best to worst.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Everything the backend depends on answered.
    #[default]
    Healthy,
    /// Requests still succeed, possibly with blank fields.
    Degraded,
    /// Requests will fail.
    Unhealthy,
}

impl ServiceStatus {
    /// Returns the worse of two statuses.
    pub fn worst(self, other: Self) -> Self {
        match (self, other) {
            (Self::Unhealthy, _) | (_, Self::Unhealthy) => Self::Unhealthy,
            (Self::Degraded, _) | (_, Self::Degraded) => Self::Degraded,
            _ => Self::Healthy,
        }
    }
}

/// One health probe of a backend, or of the whole pipeline.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: ServiceStatus,
    /// How long the probe took, when the backend measured it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Duration>,
    /// Why the backend is not healthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub checked_at: Timestamp,
    /// Backend-specific details, such as the class count of a model.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, Value>,
}

impl ServiceHealth {
    fn report(status: ServiceStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            checked_at: Timestamp::now(),
            ..Default::default()
        }
    }

    pub fn healthy() -> Self {
        Self::report(ServiceStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::report(ServiceStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::report(ServiceStatus::Unhealthy, Some(message.into()))
    }

    /// Records how long the probe took.
    pub fn with_response_time(mut self, response_time: Duration) -> Self {
        self.response = Some(response_time);
        self
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    /// Returns true if the status is not [`ServiceStatus::Unhealthy`].
    pub fn is_operational(&self) -> bool {
        self.status != ServiceStatus::Unhealthy
    }
}
