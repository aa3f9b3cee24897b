//! Application state and upload handling.

mod state;
mod upload;

pub use state::ServiceState;
pub use upload::{StagedUpload, UploadConfig};

/// Tracing target for upload staging.
pub(crate) const TRACING_TARGET_UPLOAD: &str = "idscan_server::service::upload";
