//! CLI definition and command handling

pub mod commands;

use clap::{Parser, Subcommand};

use commands::{CheckCommand, DoctorCommand, NotarizeCommand, StapleCommand, SubmitCommand};

/// Gantry - macOS notarization CLI
#[derive(Debug, Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full pipeline: pre-flight, submit, wait, staple
    Notarize(NotarizeCommand),

    /// Submit an artifact and wait for the verdict, without stapling
    Submit(SubmitCommand),

    /// Staple a notarization ticket to an artifact
    Staple(StapleCommand),

    /// Check codesigning and staple status of an artifact
    Check(CheckCommand),

    /// Check environment for required tools
    Doctor(DoctorCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Notarize(ref cmd) => cmd.execute(&self),
            Commands::Submit(ref cmd) => cmd.execute(&self),
            Commands::Staple(ref cmd) => cmd.execute(&self),
            Commands::Check(ref cmd) => cmd.execute(&self),
            Commands::Doctor(ref cmd) => cmd.execute(&self),
        }
    }
}
