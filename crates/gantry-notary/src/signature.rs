//! Pre-flight signature checks
//!
//! Notarization rejects unsigned or badly signed bundles after a long round
//! trip, so both verification tools run up front: `codesign` checks the
//! signature itself, `spctl` checks Gatekeeper assessment. The two checks
//! are independent and run concurrently; their failures are reported
//! together so the operator sees everything at once.

use std::path::Path;

use tracing::debug;

use gantry_core::{run, CommandLine};

use crate::error::NotaryError;
use crate::staple::artifact_parts;

/// Run both signature checks against the artifact.
pub async fn check_signatures(artifact: &Path) -> Result<(), NotaryError> {
    let (dir, name) = artifact_parts(artifact)?;
    debug!(artifact = %artifact.display(), "running signature pre-flight");

    let mut codesign = CommandLine::new("codesign");
    codesign
        .arg("-vvv")
        .arg("--deep")
        .arg("--strict")
        .arg(name)
        .current_dir(dir);

    let mut spctl = CommandLine::new("spctl");
    spctl
        .arg("-vvv")
        .arg("--assess")
        .arg(name)
        .current_dir(dir);

    let (codesign_result, spctl_result) = tokio::join!(run(&codesign), run(&spctl));
    let codesign_result = codesign_result?;
    let spctl_result = spctl_result?;

    let code_text = |code: Option<i32>| {
        code.map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string())
    };

    let mut error = String::new();
    if !spctl_result.success() {
        debug!(code = ?spctl_result.code, "spctl assessment failed");
        error.push_str(&format!(
            "Failed to spctl assess your application with code: {}\n\n{}\n",
            code_text(spctl_result.code),
            spctl_result.output
        ));
    }
    if !codesign_result.success() {
        debug!(code = ?codesign_result.code, "codesign check failed");
        error.push_str(&format!(
            "Failed to codesign your application with code: {}\n\n{}",
            code_text(codesign_result.code),
            codesign_result.output
        ));
    }

    if !error.is_empty() {
        return Err(NotaryError::SignatureCheckFailed(error));
    }
    debug!("codesign and spctl assessment succeeded");
    Ok(())
}
