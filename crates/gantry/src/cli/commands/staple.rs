//! Staple command

use std::path::PathBuf;

use clap::Args;
use console::style;

use gantry_core::with_retry;
use gantry_notary::staple::{staple, STAPLE_ATTEMPTS};

use crate::cli::Cli;

/// Staple a notarization ticket to an artifact
#[derive(Debug, Args)]
pub struct StapleCommand {
    /// Path to the notarized artifact
    #[arg(required = true)]
    pub artifact: PathBuf,
}

impl StapleCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        if !cli.quiet {
            println!(
                "{} {}",
                style("Stapling").cyan(),
                style(self.artifact.display()).bold()
            );
        }

        with_retry(STAPLE_ATTEMPTS, || staple(&self.artifact)).await?;

        if !cli.quiet {
            println!("{} ticket attached", style("✓").green().bold());
        }
        Ok(())
    }
}
