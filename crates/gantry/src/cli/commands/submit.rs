//! Submission-only command

use std::path::PathBuf;

use clap::Args;
use console::style;

use gantry_notary::{is_notarytool_available, submit_and_wait, NotaryError, SubmissionRequest};

use crate::cli::Cli;

use super::CredentialArgs;

/// Submit an artifact and wait for the verdict, without stapling
#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// Path to the packaged, codesigned artifact (app, dmg, pkg)
    #[arg(required = true)]
    pub artifact: PathBuf,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Use this notarytool binary instead of `xcrun notarytool`
    #[arg(long, value_name = "PATH")]
    pub tool_path: Option<PathBuf>,
}

impl SubmitCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let credentials = self.credentials.to_raw()?.validate()?;

        if !is_notarytool_available(self.tool_path.as_deref()).await {
            return Err(NotaryError::ToolUnavailable(
                "notarytool (install Xcode, or pass an explicit tool path)".to_string(),
            )
            .into());
        }

        if !cli.quiet {
            println!(
                "{} {}",
                style("Submitting").cyan(),
                style(self.artifact.display()).bold()
            );
        }

        let request = SubmissionRequest {
            artifact: self.artifact.clone(),
            credentials,
            tool_path: self.tool_path.clone(),
        };
        submit_and_wait(&request).await?;

        if !cli.quiet {
            println!(
                "{} submission accepted",
                style("✓").green().bold()
            );
        }
        Ok(())
    }
}
