//! Signature and staple status check

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;

use gantry_notary::{check_signatures, validate_staple};

use crate::cli::{Cli, OutputFormat};

/// Check codesigning and staple status of an artifact
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Path to the artifact
    #[arg(required = true)]
    pub artifact: PathBuf,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    signatures_valid: bool,
    ticket_stapled: bool,
}

impl CheckCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        // Staple status is informational; the signature check is the gate.
        let stapled = validate_staple(&self.artifact).await?;
        let signature_result = check_signatures(&self.artifact).await;

        let report = CheckReport {
            signatures_valid: signature_result.is_ok(),
            ticket_stapled: stapled,
        };

        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => {
                if !cli.quiet {
                    let mark = |ok: bool| {
                        if ok {
                            style("✓").green().bold()
                        } else {
                            style("✗").red().bold()
                        }
                    };
                    println!("{} signatures", mark(report.signatures_valid));
                    println!(
                        "{} notarization ticket {}",
                        mark(report.ticket_stapled),
                        if report.ticket_stapled {
                            "stapled"
                        } else {
                            "not stapled"
                        }
                    );
                }
            }
        }

        signature_result?;
        Ok(())
    }
}
