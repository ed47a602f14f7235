//! Top-level notarization pipeline
//!
//! Sequences the whole flow for one artifact: signature pre-flight,
//! credential validation, tool availability, submission, staple. Stapling
//! never begins before the submission reports terminal success.

use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use gantry_core::with_retry;

use crate::credentials::RawCredentials;
use crate::error::{NotaryError, Result};
use crate::legacy;
use crate::notarytool::{is_notarytool_available, submit_and_wait, SubmissionRequest};
use crate::signature::check_signatures;
use crate::staple::{staple, STAPLE_ATTEMPTS};

/// Which submission protocol to drive
#[derive(Debug, Clone)]
pub enum NotarizeMode {
    /// `notarytool submit --wait`, the synchronous default
    NotaryTool,
    /// `altool` upload followed by status polling
    Legacy {
        /// Primary bundle identifier required by the upload call
        bundle_id: String,
        /// Grace period before the first status check
        initial_delay: Duration,
    },
}

/// Options for one full notarization run
#[derive(Debug, Clone)]
pub struct NotarizeOptions {
    /// Packaged, codesigned application
    pub artifact: PathBuf,
    /// Loose credential input; validated before anything is spawned
    pub credentials: RawCredentials,
    /// Run this binary instead of `xcrun notarytool`
    pub tool_path: Option<PathBuf>,
    /// Protocol selection
    pub mode: NotarizeMode,
    /// Attach the ticket after a successful verdict
    pub staple: bool,
}

impl NotarizeOptions {
    /// Defaults: notarytool protocol, stapling enabled.
    pub fn new(artifact: impl Into<PathBuf>, credentials: RawCredentials) -> Self {
        Self {
            artifact: artifact.into(),
            credentials,
            tool_path: None,
            mode: NotarizeMode::NotaryTool,
            staple: true,
        }
    }
}

/// Run the full pipeline: pre-flight, validate, submit, wait, staple.
pub async fn notarize(options: &NotarizeOptions) -> Result<()> {
    check_signatures(&options.artifact).await?;

    let credentials = options.credentials.validate()?;
    info!(
        artifact = %options.artifact.display(),
        strategy = credentials.strategy(),
        "starting notarization"
    );

    match &options.mode {
        NotarizeMode::NotaryTool => {
            if !is_notarytool_available(options.tool_path.as_deref()).await {
                return Err(NotaryError::ToolUnavailable(
                    "notarytool (install Xcode, or pass an explicit tool path)".to_string(),
                ));
            }
            let request = SubmissionRequest {
                artifact: options.artifact.clone(),
                credentials,
                tool_path: options.tool_path.clone(),
            };
            submit_and_wait(&request).await?;
        }
        NotarizeMode::Legacy {
            bundle_id,
            initial_delay,
        } => {
            let request_id = legacy::upload(&options.artifact, bundle_id, &credentials).await?;
            legacy::wait_for_verdict_after(*initial_delay, &request_id, &credentials).await?;
        }
    }

    if options.staple {
        with_retry(STAPLE_ATTEMPTS, || staple(&options.artifact)).await?;
    }

    info!("notarization complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_notarytool_and_staple() {
        let options = NotarizeOptions::new("MyApp.app", RawCredentials::default());
        assert!(matches!(options.mode, NotarizeMode::NotaryTool));
        assert!(options.staple);
        assert!(options.tool_path.is_none());
    }

    #[tokio::test]
    async fn preflight_failure_comes_before_credential_validation() {
        // The pipeline orders pre-flight ahead of validation, so a broken
        // artifact surfaces a signature error (or a missing-tool error on
        // hosts without codesign) rather than the credential error the empty
        // input would otherwise produce.
        let mut options = NotarizeOptions::new("/nonexistent/MyApp.app", RawCredentials::default());
        options.staple = false;
        let err = notarize(&options).await.unwrap_err();
        assert!(matches!(
            err,
            NotaryError::SignatureCheckFailed(_) | NotaryError::Process(_)
        ));
    }
}
