//! HTTP client for the text recognition server.

mod paddle_client;
mod paddle_config;

pub use paddle_client::{PaddleClient, RecognizeResponse};
pub use paddle_config::PaddleConfig;
