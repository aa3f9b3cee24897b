//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod detect;
mod error;
mod monitors;
pub mod response;

use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::middleware::{AdmissionConfig, RouterAdmissionExt};
use crate::service::ServiceState;

/// Prefix of every API route.
pub const API_PREFIX: &str = "/api/v1";

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns a [`Router`] with every API route and a JSON 404 fallback.
///
/// Only the upload route goes through admission control.
pub fn routes(state: &ServiceState, admission: &AdmissionConfig) -> Router<ServiceState> {
    let api = Router::new()
        .merge(detect::routes(state.upload()).with_admission(admission))
        .merge(monitors::routes());

    Router::new().nest(API_PREFIX, api).fallback(handler)
}
