//! CORS and response compression.
//!
//! Browser clients upload from another origin, so `/detect` needs CORS
//! preflight support. Only `GET`, `POST` and `OPTIONS` are ever routed.

use std::time::Duration;

use axum::Router;
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::Method;
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use super::observability::REQUEST_ID_HEADER;

/// Origins allowed when none are configured.
const LOCAL_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://localhost:8000",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:8000",
];

/// Adds CORS and response compression to a [`Router`].
pub trait RouterSecurityExt<S> {
    fn with_security(self, cors: &CorsConfig) -> Self;
}

impl<S> RouterSecurityExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_security(self, cors: &CorsConfig) -> Self {
        self.layer(CompressionLayer::new()).layer(cors.layer())
    }
}

/// Cross-origin settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct CorsConfig {
    /// Origins allowed to call the API; localhost development origins
    /// when empty.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_ORIGINS", value_delimiter = ',')
    )]
    pub allowed_origins: Vec<String>,

    /// How long browsers may cache a preflight answer, in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_MAX_AGE", default_value_t = 3600)
    )]
    pub max_age_seconds: u64,

    /// Whether cookies and authorization headers may be sent cross-origin.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_ALLOW_CREDENTIALS", default_value_t = true, action = clap::ArgAction::Set)
    )]
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_age_seconds: 3600,
            allow_credentials: true,
        }
    }
}

impl CorsConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_seconds)
    }

    /// Parses the configured origins, skipping invalid header values.
    pub fn origins(&self) -> Vec<HeaderValue> {
        if self.allowed_origins.is_empty() {
            return LOCAL_ORIGINS
                .iter()
                .copied()
                .map(HeaderValue::from_static)
                .collect();
        }

        self.allowed_origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect()
    }

    fn layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(self.origins())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
            .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
            .allow_credentials(self.allow_credentials)
            .max_age(self.max_age())
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::get;
    use axum_test::TestServer;

    use super::*;

    #[test]
    fn empty_origins_fall_back_to_localhost() {
        let values = CorsConfig::default().origins();
        assert!(values.contains(&HeaderValue::from_static("http://localhost:3000")));
    }

    #[test]
    fn invalid_origins_are_skipped() {
        let config = CorsConfig {
            allowed_origins: vec!["https://kyc.example.com".into(), "bad\norigin".into()],
            ..Default::default()
        };
        assert_eq!(
            config.origins(),
            vec![HeaderValue::from_static("https://kyc.example.com")]
        );
    }

    #[tokio::test]
    async fn allowed_origin_is_echoed() -> anyhow::Result<()> {
        let cors = CorsConfig {
            allowed_origins: vec!["https://kyc.example.com".into()],
            ..Default::default()
        };
        let app: Router = Router::new()
            .route("/", get(|| async { "ok" }))
            .with_security(&cors);
        let server = TestServer::new(app)?;

        let response = server
            .get("/")
            .add_header(header::ORIGIN, "https://kyc.example.com")
            .await;
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            "https://kyc.example.com"
        );
        Ok(())
    }
}
