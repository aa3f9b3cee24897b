//! One-shot extraction from an image file.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use idscan_core::ImageSource;

use crate::TRACING_TARGET_COMMAND;
use crate::config::BackendConfig;

/// Arguments of `idscan extract`.
#[derive(Debug, Clone, Args)]
pub struct ExtractArgs {
    /// Image file to process.
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Print the result on a single line.
    #[arg(long)]
    pub compact: bool,

    #[clap(flatten)]
    pub backends: BackendConfig,
}

/// Runs the pipeline once and prints the result to stdout.
pub async fn run(args: ExtractArgs) -> anyhow::Result<()> {
    args.backends.validate()?;
    args.backends.log();

    let pipeline = args.backends.create_pipeline()?;
    let source = ImageSource::path(&args.image);

    let result = pipeline
        .process(&source)
        .await
        .with_context(|| format!("failed to process {}", args.image.display()))?;

    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        regions = result.total_region_count(),
        extractions = result.extractions().len(),
        total_seconds = result.timing().total_seconds(),
        "Extraction completed"
    );

    let json = if args.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}").context("failed to write the result")?;
    Ok(())
}
