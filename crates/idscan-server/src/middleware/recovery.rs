//! Turns handler panics and slow requests into JSON error responses.
//!
//! The pipeline never cancels itself, so the request timeout here is the
//! only bound on how long a detection request may run. Dropping the handler
//! future on timeout also drops its staged upload.

use std::any::Any;
use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::response::{IntoResponse, Response};
#[cfg(feature = "config")]
use clap::Args;
use futures::future::{BoxFuture, FutureExt, ready};
use serde::{Deserialize, Serialize};
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower::{BoxError, ServiceBuilder};
use tower_http::catch_panic::CatchPanicLayer;

use crate::handler::{Error, ErrorKind};

const TRACING_TARGET_RECOVERY: &str = "idscan_server::middleware::recovery";

/// Request timeout used when none is configured, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Request timeout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct RecoveryConfig {
    /// Seconds a request may take before it is answered with 408.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REQUEST_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)
    )]
    pub request_timeout: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT_SECS)
    }
}

impl RecoveryConfig {
    /// Creates a configuration with a request timeout in seconds.
    pub fn new(request_timeout: u64) -> Self {
        Self { request_timeout }
    }

    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Adds panic catching and the request timeout to a [`Router`].
pub trait RouterRecoveryExt<S> {
    /// Panics become 500 and requests over the timeout become 408.
    fn with_recovery(self, config: &RecoveryConfig) -> Self;
}

impl<S> RouterRecoveryExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_recovery(self, config: &RecoveryConfig) -> Self {
        let layers = ServiceBuilder::new()
            .layer(HandleErrorLayer::new(|error: BoxError| -> BoxFuture<'static, Response> {
                ready(classify(&error).into_response()).boxed()
            }))
            .layer(CatchPanicLayer::custom(|panic: Box<dyn Any + Send>| {
                on_panic(panic.as_ref())
            }))
            .layer(TimeoutLayer::new(config.request_timeout()));

        self.layer(layers)
    }
}

/// Maps a middleware error to the HTTP error returned to the client.
fn classify(error: &BoxError) -> Error {
    if error.is::<Elapsed>() {
        tracing::warn!(target: TRACING_TARGET_RECOVERY, "request timed out");
        return ErrorKind::RequestTimeout.into_error();
    }

    tracing::error!(
        target: TRACING_TARGET_RECOVERY,
        error = %error,
        "unhandled middleware error"
    );

    ErrorKind::InternalServerError
        .with_message("An unexpected error occurred")
        .with_context(error.to_string())
}

fn on_panic(panic: &(dyn Any + Send)) -> Response {
    let detail = match (panic.downcast_ref::<String>(), panic.downcast_ref::<&str>()) {
        (Some(message), _) => message.as_str(),
        (None, Some(message)) => message,
        (None, None) => "non-string panic payload",
    };

    tracing::error!(target: TRACING_TARGET_RECOVERY, detail, "handler panicked");

    ErrorKind::InternalServerError
        .with_message("An unexpected panic occurred")
        .into_response()
}
