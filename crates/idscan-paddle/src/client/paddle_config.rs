//! Configuration for the recognition HTTP client.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
const DEFAULT_MODEL_NAME: &str = "vgg_transformer";
const DEFAULT_DEVICE: &str = "cuda:0";

/// Configuration for [`PaddleClient`].
///
/// `model_name` and `device` describe the model served remotely. They are
/// only reported in backend metadata and never sent to the server.
///
/// # Examples
///
/// ```ignore
/// use idscan_paddle::PaddleConfig;
///
/// let config = PaddleConfig::new("http://ocr:8080")?
///     .with_api_key("secret")
///     .with_max_retries(5);
/// ```
///
/// [`PaddleClient`]: crate::PaddleClient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct PaddleConfig {
    /// Base URL of the recognition server.
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-url", env = "OCR_BASE_URL", default_value = DEFAULT_BASE_URL)
    )]
    pub base_url: Url,

    /// Bearer token sent with every request.
    #[cfg_attr(feature = "config", arg(long = "ocr-api-key", env = "OCR_API_KEY"))]
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-timeout", env = "OCR_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)
    )]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first attempt for retryable failures.
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-max-retries", env = "OCR_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)
    )]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay unit of the linear backoff, in milliseconds.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "ocr-retry-backoff-ms",
            env = "OCR_RETRY_BACKOFF_MS",
            default_value_t = DEFAULT_RETRY_BACKOFF_MS
        )
    )]
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Name of the served recognition model.
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-model-name", env = "OCR_MODEL_NAME", default_value = DEFAULT_MODEL_NAME)
    )]
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Device the served model runs on.
    #[cfg_attr(
        feature = "config",
        arg(long = "ocr-device", env = "OCR_DEVICE", default_value = DEFAULT_DEVICE)
    )]
    #[serde(default = "default_device")]
    pub device: String,

    /// Whether to verify TLS certificates.
    #[cfg_attr(feature = "config", arg(skip = true))]
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,

    /// Custom HTTP headers included in all requests.
    #[cfg_attr(feature = "config", arg(skip))]
    #[serde(default)]
    pub custom_headers: Vec<(String, String)>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_retry_backoff_ms() -> u64 {
    DEFAULT_RETRY_BACKOFF_MS
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_owned()
}

fn default_device() -> String {
    DEFAULT_DEVICE.to_owned()
}

fn default_verify_ssl() -> bool {
    true
}

impl PaddleConfig {
    /// Create a configuration for the given base URL with default settings.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref()).map_err(|e| {
            Error::config(format!("Invalid base URL '{}': {}", base_url.as_ref(), e))
        })?;

        Ok(Self::from_url(base_url))
    }

    fn from_url(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            model_name: default_model_name(),
            device: default_device(),
            verify_ssl: true,
            custom_headers: Vec::new(),
        }
    }

    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the retry backoff unit.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Get the user agent string.
    pub fn user_agent(&self) -> String {
        format!("idscan-paddle/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the retry backoff unit.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff_ms = backoff.as_millis() as u64;
        self
    }

    /// Set the reported model name.
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Set the reported device.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Set whether to verify TLS certificates.
    pub fn with_verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Add a custom header to all requests.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((key.into(), value.into()));
        self
    }

    /// Checks the configured values.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "Base URL must use http or https, got '{}'",
                self.base_url.scheme()
            )));
        }

        if self.timeout_secs == 0 {
            return Err(Error::config("Timeout must be greater than 0"));
        }

        Ok(())
    }
}

impl Default for PaddleConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL).expect("Default URL should be valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config() {
        let config = PaddleConfig::new("http://localhost:8080").unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.api_key, None);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_backoff(), Duration::from_millis(500));
        assert_eq!(config.model_name, "vgg_transformer");
        assert!(config.verify_ssl);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let result = PaddleConfig::new("not a valid url");
        assert!(matches!(result, Err(crate::Error::Config(_))));

        let config = PaddleConfig::new("ftp://ocr.internal").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fluent_api() {
        let config = PaddleConfig::default()
            .with_api_key("my-key")
            .with_timeout(Duration::from_secs(45))
            .with_max_retries(10)
            .with_retry_backoff(Duration::from_millis(20))
            .with_device("cpu")
            .with_header("X-Tenant", "acme");

        assert_eq!(config.api_key.as_deref(), Some("my-key"));
        assert_eq!(config.timeout(), Duration::from_secs(45));
        assert_eq!(config.max_retries, 10);
        assert_eq!(config.retry_backoff(), Duration::from_millis(20));
        assert_eq!(config.device, "cpu");
        assert_eq!(config.custom_headers.len(), 1);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let config = PaddleConfig::default().with_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let config = PaddleConfig::default().with_api_key("secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
