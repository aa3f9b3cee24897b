//! Pipeline configuration.

#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use idscan_core::{DEFAULT_TEXT_LABELS, Error, RegionTaxonomy, Result};
use serde::{Deserialize, Serialize};

/// Default number of regions recognized at the same time.
const DEFAULT_RECOGNITION_CONCURRENCY: usize = 4;

/// Configuration of the orchestration itself, independent of any backend.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[builder(
    name = "PipelineConfigBuilder",
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "Self::validate_config")
)]
pub struct PipelineConfig {
    /// Field names whose regions are sent to recognition.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "text-labels",
            env = "TEXT_LABELS",
            value_delimiter = ',',
            default_values_t = default_text_labels()
        )
    )]
    #[builder(default = "default_text_labels()")]
    #[serde(default = "default_text_labels")]
    pub text_labels: Vec<String>,

    /// Maximum number of regions recognized concurrently.
    ///
    /// `1` recognizes regions one after another.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "recognition-concurrency",
            env = "RECOGNITION_CONCURRENCY",
            default_value_t = DEFAULT_RECOGNITION_CONCURRENCY
        )
    )]
    #[builder(default = "DEFAULT_RECOGNITION_CONCURRENCY")]
    #[serde(default = "default_recognition_concurrency")]
    pub recognition_concurrency: usize,
}

fn default_text_labels() -> Vec<String> {
    DEFAULT_TEXT_LABELS.iter().map(|s| (*s).to_owned()).collect()
}

fn default_recognition_concurrency() -> usize {
    DEFAULT_RECOGNITION_CONCURRENCY
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            text_labels: default_text_labels(),
            recognition_concurrency: DEFAULT_RECOGNITION_CONCURRENCY,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Returns the taxonomy made of the configured text labels.
    pub fn taxonomy(&self) -> RegionTaxonomy {
        RegionTaxonomy::new(self.text_labels.iter().map(|label| label.trim()))
    }

    /// Checks the configured values.
    ///
    /// # Errors
    ///
    /// Returns a [`Configuration`] error if the recognition concurrency is zero.
    ///
    /// [`Configuration`]: idscan_core::ErrorKind::Configuration
    pub fn validate(&self) -> Result<()> {
        if self.recognition_concurrency == 0 {
            return Err(Error::configuration()
                .with_message("recognition concurrency must be greater than 0"));
        }

        Ok(())
    }
}

impl PipelineConfigBuilder {
    fn validate_config(&self) -> std::result::Result<(), String> {
        if self.recognition_concurrency == Some(0) {
            return Err("Recognition concurrency must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_id_card_fields() {
        let config = PipelineConfig::default();
        assert_eq!(config.text_labels.len(), 12);
        assert_eq!(config.recognition_concurrency, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_rejects_zero_concurrency() {
        let result = PipelineConfig::builder()
            .with_recognition_concurrency(0usize)
            .build();
        assert!(result.is_err());

        let config = PipelineConfig::builder()
            .with_text_labels(vec!["name".to_owned(), " id ".to_owned()])
            .build()
            .unwrap();
        let taxonomy = config.taxonomy();
        assert!(taxonomy.contains("id"));
        assert_eq!(taxonomy.len(), 2);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }
}
