//! Application state and dependency injection.

use std::sync::Arc;

use idscan_pipeline::Pipeline;

use crate::service::UploadConfig;

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection). The pipeline is
/// built once at startup and shared by every request.
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    pipeline: Arc<Pipeline>,
    upload: UploadConfig,
}

impl ServiceState {
    /// Creates the state from an initialized pipeline.
    pub fn new(pipeline: Arc<Pipeline>, upload: UploadConfig) -> Self {
        Self { pipeline, upload }
    }

    /// Returns the shared pipeline.
    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Returns the upload limits.
    pub fn upload(&self) -> &UploadConfig {
        &self.upload
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(pipeline: Arc<Pipeline>);
impl_di!(upload: UploadConfig);
