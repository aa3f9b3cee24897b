//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── log_format                     # text | json
//! └── command
//!     ├── serve   ServerConfig, MiddlewareConfig, UploadConfig, BackendConfig
//!     ├── extract <IMAGE>, BackendConfig
//!     └── labels  BackendConfig
//! ```
//!
//! Every option can be provided as a CLI argument or an environment
//! variable. Use `--help` on each command to see them.

mod backend;
mod middleware;
mod server;

use std::process;

pub use backend::BackendConfig;
use clap::{Parser, ValueEnum};
pub use middleware::MiddlewareConfig;
pub use server::ServerConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::TRACING_TARGET_STARTUP;
use crate::command::Command;

/// Format of the log lines written to stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "idscan")]
#[command(about = "Identity document field extraction")]
#[command(version)]
pub struct Cli {
    /// Log line format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded first so that clap's `env` fallbacks see it.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// Logs go to stderr so that command output on stdout stays parseable.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(filter);

        match self.log_format {
            LogFormat::Text => registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init(),
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init(),
        }
    }

    /// Logs build information at debug level.
    pub fn log_build_info(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            command = self.command.name(),
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [
            cfg!(feature = "dotenv").then_some("dotenv"),
            cfg!(feature = "mock").then_some("mock"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["idscan", "serve"]).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };

        assert_eq!(cli.log_format, LogFormat::Text);
        assert_eq!(args.server.port, 8000);
        assert_eq!(args.middleware.recovery.request_timeout, 30);
        assert_eq!(args.middleware.admission.max_concurrent_requests, 5);
        assert_eq!(args.upload.max_file_size, 10 * 1024 * 1024);
        assert_eq!(args.backends.pipeline.recognition_concurrency, 4);
        assert_eq!(args.backends.pipeline.text_labels.len(), 12);
        assert_eq!(args.backends.yolo.input_size, 640);
    }

    #[test]
    fn extract_takes_an_image_path() {
        let cli =
            Cli::try_parse_from(["idscan", "--log-format", "json", "extract", "card.jpg"]).unwrap();
        let Command::Extract(args) = cli.command else {
            panic!("expected extract");
        };

        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(args.image.to_str(), Some("card.jpg"));
    }

    #[test]
    fn text_labels_are_comma_separated() {
        let cli = Cli::try_parse_from(["idscan", "labels", "--text-labels", "name,dob"]).unwrap();
        let Command::Labels(args) = cli.command else {
            panic!("expected labels");
        };

        assert_eq!(args.backends.pipeline.text_labels, ["name", "dob"]);
    }
}
