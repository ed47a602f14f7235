//! Doctor command - check environment for required tools

use std::process::Command;

use clap::Args;
use console::style;
use serde::Serialize;

use crate::cli::{Cli, OutputFormat};

/// Check environment for required tools
#[derive(Debug, Args)]
pub struct DoctorCommand {}

/// Result of a single check
#[derive(Debug, Clone, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    message: Option<String>,
}

/// Status of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

/// Tools resolved on PATH directly
const PATH_TOOLS: &[&str] = &["xcrun", "codesign", "spctl", "ditto", "zip"];

/// Tools resolved through `xcrun --find`; altool is optional (legacy only)
const XCRUN_TOOLS: &[(&str, bool)] = &[("notarytool", true), ("stapler", true), ("altool", false)];

fn check_path_tool(name: &str) -> CheckResult {
    match which::which(name) {
        Ok(path) => CheckResult {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: Some(path.display().to_string()),
        },
        Err(_) => CheckResult {
            name: name.to_string(),
            status: CheckStatus::Fail,
            message: Some("not found on PATH".to_string()),
        },
    }
}

fn check_xcrun_tool(name: &str, required: bool) -> CheckResult {
    let found = Command::new("xcrun")
        .args(["--find", name])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);

    if found {
        CheckResult {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: None,
        }
    } else {
        CheckResult {
            name: name.to_string(),
            status: if required {
                CheckStatus::Fail
            } else {
                CheckStatus::Warn
            },
            message: Some(if required {
                "not found via xcrun (install Xcode)".to_string()
            } else {
                "not found via xcrun (only needed for the legacy protocol)".to_string()
            }),
        }
    }
}

impl DoctorCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut results: Vec<CheckResult> = PATH_TOOLS.iter().map(|t| check_path_tool(t)).collect();
        results.extend(
            XCRUN_TOOLS
                .iter()
                .map(|(name, required)| check_xcrun_tool(name, *required)),
        );

        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
            OutputFormat::Text => {
                for result in &results {
                    let mark = match result.status {
                        CheckStatus::Ok => style("✓").green().bold(),
                        CheckStatus::Warn => style("!").yellow().bold(),
                        CheckStatus::Fail => style("✗").red().bold(),
                    };
                    match &result.message {
                        Some(message) => println!("{} {} ({})", mark, result.name, message),
                        None => println!("{} {}", mark, result.name),
                    }
                }
            }
        }

        if results
            .iter()
            .any(|r| r.status == CheckStatus::Fail)
        {
            anyhow::bail!("some required tools are missing");
        }
        Ok(())
    }
}
