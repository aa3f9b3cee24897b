#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Logging target for client setup and retries.
pub const TRACING_TARGET_CLIENT: &str = "idscan_paddle::client";

/// Logging target for recognition requests.
pub const TRACING_TARGET_RECOGNITION: &str = "idscan_paddle::recognition";

mod backend;
pub mod client;
mod error;

pub use backend::PaddleRecognizer;
pub use client::{PaddleClient, PaddleConfig, RecognizeResponse};
pub use error::{Error, Result};
