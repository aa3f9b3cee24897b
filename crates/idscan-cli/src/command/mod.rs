//! Subcommands of the `idscan` binary.

mod extract;
mod labels;
mod serve;

use clap::Subcommand;
pub use extract::ExtractArgs;
pub use labels::LabelsArgs;
pub use serve::ServeArgs;

/// What the binary should do.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Serve the HTTP API.
    Serve(ServeArgs),
    /// Run the pipeline once on an image and print the result as JSON.
    Extract(ExtractArgs),
    /// Print the detector class table and mark the text-bearing classes.
    Labels(LabelsArgs),
}

impl Command {
    /// Returns the subcommand name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Serve(_) => "serve",
            Self::Extract(_) => "extract",
            Self::Labels(_) => "labels",
        }
    }

    /// Runs the subcommand to completion.
    pub async fn run(self) -> anyhow::Result<()> {
        match self {
            Self::Serve(args) => serve::run(args).await,
            Self::Extract(args) => extract::run(args).await,
            Self::Labels(args) => labels::run(&args),
        }
    }
}
