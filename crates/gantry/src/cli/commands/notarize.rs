//! Full-pipeline notarize command

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use console::style;

use gantry_notary::{notarize, NotarizeMode, NotarizeOptions};

use crate::cli::Cli;

use super::CredentialArgs;

/// Notarize an artifact end to end
#[derive(Debug, Args)]
pub struct NotarizeCommand {
    /// Path to the packaged, codesigned artifact (app, dmg, pkg)
    #[arg(required = true)]
    pub artifact: PathBuf,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Use this notarytool binary instead of `xcrun notarytool`
    #[arg(long, value_name = "PATH")]
    pub tool_path: Option<PathBuf>,

    /// Skip attaching the ticket after a successful verdict
    #[arg(long)]
    pub skip_staple: bool,

    /// Use the legacy altool upload-and-poll protocol
    #[arg(long)]
    pub legacy: bool,

    /// Primary bundle identifier, required by the legacy protocol
    #[arg(long, requires = "legacy")]
    pub bundle_id: Option<String>,

    /// Seconds to wait before the first legacy status check
    #[arg(long, default_value_t = 10, requires = "legacy")]
    pub initial_delay: u64,
}

impl NotarizeCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let mode = if self.legacy {
            let bundle_id = self
                .bundle_id
                .clone()
                .ok_or_else(|| anyhow::anyhow!("--bundle-id is required with --legacy"))?;
            NotarizeMode::Legacy {
                bundle_id,
                initial_delay: Duration::from_secs(self.initial_delay),
            }
        } else {
            NotarizeMode::NotaryTool
        };

        let options = NotarizeOptions {
            artifact: self.artifact.clone(),
            credentials: self.credentials.to_raw()?,
            tool_path: self.tool_path.clone(),
            mode,
            staple: !self.skip_staple,
        };

        if !cli.quiet {
            println!(
                "{} {}",
                style("Notarizing").cyan(),
                style(self.artifact.display()).bold()
            );
        }

        notarize(&options).await?;

        if !cli.quiet {
            println!(
                "{} {} notarized{}",
                style("✓").green().bold(),
                style(self.artifact.display()).bold(),
                if options.staple { " and stapled" } else { "" }
            );
        }
        Ok(())
    }
}
