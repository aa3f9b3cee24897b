//! Admission control for the upload route.
//!
//! Requests beyond the limit wait for a slot instead of being rejected; the
//! recovery timeout still bounds how long they wait.

use axum::Router;
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower::limit::GlobalConcurrencyLimitLayer;

/// Configuration for admission control.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct AdmissionConfig {
    /// Maximum number of extraction requests processed at the same time.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MAX_CONCURRENT_REQUESTS", default_value = "5")
    )]
    pub max_concurrent_requests: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 5,
        }
    }
}

impl AdmissionConfig {
    /// Creates a configuration admitting `max` concurrent requests.
    pub fn with_max_concurrent_requests(max: usize) -> Self {
        Self {
            max_concurrent_requests: max,
        }
    }

    /// Returns the limit, never lower than one.
    pub fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent_requests.max(1)
    }
}

/// Extension trait for `axum::`[`Router`] to cap concurrent requests.
pub trait RouterAdmissionExt<S> {
    /// Caps the number of concurrently running requests across every route
    /// currently registered on the router.
    ///
    /// Applied as a route layer, so unknown paths are not counted.
    fn with_admission(self, config: &AdmissionConfig) -> Self;
}

impl<S> RouterAdmissionExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_admission(self, config: &AdmissionConfig) -> Self {
        self.route_layer(GlobalConcurrencyLimitLayer::new(
            config.max_concurrent_requests(),
        ))
    }
}
