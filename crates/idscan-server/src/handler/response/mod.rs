//! Response bodies returned by the handlers.

mod error_response;
mod monitors;

pub use error_response::ErrorResponse;
pub use monitors::{HealthResponse, HealthStatus};
