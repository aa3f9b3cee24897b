//! Middleware for `axum::Router` and HTTP request processing.
//!
//! Every concern is an extension trait on [`Router`], so the binary decides
//! the order of the layers:
//!
//! ```rust,no_run
//! use axum::Router;
//! use idscan_server::middleware::{
//!     CorsConfig, RecoveryConfig, RouterObservabilityExt, RouterRecoveryExt,
//!     RouterSecurityExt,
//! };
//!
//! let app: Router = Router::new()
//!     .with_security(&CorsConfig::default())
//!     .with_observability()
//!     .with_recovery(&RecoveryConfig::default());
//! ```
//!
//! [`Router`]: axum::Router

mod admission;
mod observability;
mod recovery;
mod security;

pub use admission::{AdmissionConfig, RouterAdmissionExt};
pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{CorsConfig, RouterSecurityExt};
