//! Recognition HTTP client implementation.

use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{Error, PaddleConfig, Result, TRACING_TARGET_CLIENT, TRACING_TARGET_RECOGNITION};

const RECOGNIZE_PATH: &str = "api/v1/ocr/recognize";
const HEALTH_PATH: &str = "health";

/// Text read from one crop by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognizeResponse {
    /// Recognized text.
    #[serde(default)]
    pub text: String,
    /// Server-reported confidence, if the model exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// HTTP client for the text recognition server.
#[derive(Debug, Clone)]
pub struct PaddleClient {
    http_client: Client,
    recognize_url: Url,
    health_url: Url,
    config: PaddleConfig,
}

impl PaddleClient {
    /// Create a new client with the given configuration.
    pub fn new(config: PaddleConfig) -> Result<Self> {
        config.validate()?;

        let mut client_builder = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent())
            .danger_accept_invalid_certs(!config.verify_ssl);

        let mut headers = HeaderMap::new();
        for (key, value) in &config.custom_headers {
            let header_name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| Error::config(format!("Invalid header name '{}': {}", key, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("Invalid header value '{}': {}", value, e)))?;
            headers.insert(header_name, header_value);
        }

        if let Some(api_key) = &config.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| Error::config(format!("Invalid API key: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        if !headers.is_empty() {
            client_builder = client_builder.default_headers(headers);
        }

        let http_client = client_builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let recognize_url = Self::endpoint(&config.base_url, RECOGNIZE_PATH)?;
        let health_url = Self::endpoint(&config.base_url, HEALTH_PATH)?;

        debug!(
            target: TRACING_TARGET_CLIENT,
            base_url = %config.base_url,
            timeout = ?config.timeout(),
            max_retries = config.max_retries,
            "recognition client initialized"
        );

        Ok(Self {
            http_client,
            recognize_url,
            health_url,
            config,
        })
    }

    /// Resolves `path` below the base URL, keeping any path prefix it has.
    fn endpoint(base_url: &Url, path: &str) -> Result<Url> {
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        base.join(path)
            .map_err(|e| Error::config(format!("Failed to construct URL for '{}': {}", path, e)))
    }

    /// Get a reference to the client configuration.
    pub fn config(&self) -> &PaddleConfig {
        &self.config
    }

    /// Get the URL crops are posted to.
    pub fn recognize_url(&self) -> &Url {
        &self.recognize_url
    }

    /// Recognizes the text in a PNG-encoded crop.
    pub async fn recognize_png(&self, png: Vec<u8>) -> Result<RecognizeResponse> {
        debug!(
            target: TRACING_TARGET_RECOGNITION,
            url = %self.recognize_url,
            size = png.len(),
            "sending crop for recognition"
        );

        self.execute_with_retry(png).await
    }

    async fn execute_with_retry(&self, png: Vec<u8>) -> Result<RecognizeResponse> {
        let mut attempt = 0;
        let max_retries = self.config.max_retries;

        loop {
            let part = reqwest::multipart::Part::bytes(png.clone())
                .file_name("crop.png")
                .mime_str("image/png")?;
            let form = reqwest::multipart::Form::new().part("file", part);

            let result = async {
                let response = self
                    .http_client
                    .post(self.recognize_url.clone())
                    .multipart(form)
                    .send()
                    .await?;

                self.handle_response(response).await
            }
            .await;

            match result {
                Ok(recognized) => {
                    if attempt > 0 {
                        info!(
                            target: TRACING_TARGET_CLIENT,
                            attempt = attempt + 1,
                            "request succeeded after retry"
                        );
                    }
                    return Ok(recognized);
                }
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    attempt += 1;
                    let backoff = self.config.retry_backoff() * attempt;
                    let delay = e.retry_after().unwrap_or(backoff);

                    warn!(
                        target: TRACING_TARGET_CLIENT,
                        attempt = attempt,
                        max_retries = max_retries,
                        delay_ms = delay.as_millis() as u64,
                        category = e.category(),
                        error = %e,
                        "request failed, retrying"
                    );

                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        target: TRACING_TARGET_CLIENT,
                        attempt = attempt + 1,
                        category = e.category(),
                        error = %e,
                        "request failed permanently"
                    );
                    return Err(e);
                }
            }
        }
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<RecognizeResponse> {
        let status = response.status();

        debug!(
            target: TRACING_TARGET_CLIENT,
            status = status.as_u16(),
            "received response"
        );

        if status.is_success() {
            let body = response.text().await?;
            let envelope: ApiResponse<RecognizeResponse> =
                serde_json::from_str(&body).map_err(|e| {
                    Error::invalid_response(
                        format!("Failed to parse success response: {}", e),
                        Some(body.clone()),
                    )
                })?;

            if !envelope.success {
                return Err(Error::api(
                    status.as_u16(),
                    envelope
                        .message
                        .unwrap_or_else(|| "Unknown error".to_string()),
                    envelope.code,
                ));
            }

            return envelope
                .data
                .ok_or_else(|| Error::invalid_response("Success response without data", Some(body)));
        }

        let retry_after = parse_retry_after(response.headers());
        let body_text = response.text().await.ok();

        let error = match status {
            StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::BAD_GATEWAY => Error::busy(status.as_u16(), retry_after),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                Error::Timeout(self.config.timeout())
            }
            _ => match &body_text {
                Some(body) => match serde_json::from_str::<ApiResponse<()>>(body) {
                    Ok(api_error) => Error::api(
                        status.as_u16(),
                        api_error
                            .message
                            .unwrap_or_else(|| "Unknown error".to_string()),
                        api_error.code,
                    ),
                    Err(_) => Error::api(status.as_u16(), body.clone(), None),
                },
                None => Error::api(status.as_u16(), status.to_string(), None),
            },
        };

        Err(error)
    }

    /// Checks that the server answers its health endpoint.
    ///
    /// Returns the round-trip time on success.
    pub async fn health_check(&self) -> Result<Duration> {
        debug!(target: TRACING_TARGET_CLIENT, url = %self.health_url, "performing health check");

        let started = Instant::now();
        let response = self.http_client.get(self.health_url.clone()).send().await?;

        if response.status().is_success() {
            Ok(started.elapsed())
        } else {
            Err(Error::busy(
                response.status().as_u16(),
                parse_retry_after(response.headers()),
            ))
        }
    }
}

/// Reads a `Retry-After` header given in seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Envelope shared by every endpoint of the recognition server.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiResponse<T> {
    success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<T>,

    #[serde(default, alias = "error", skip_serializing_if = "Option::is_none")]
    message: Option<String>,

    #[serde(default, alias = "error_code", skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}
