//! Submission driver for `xcrun notarytool`
//!
//! The modern protocol is a single blocking call: `notarytool submit --wait`
//! uploads the artifact, polls Apple internally, and reports the terminal
//! verdict as a one-line JSON object mixed into free-text diagnostics. This
//! module archives the artifact when needed, runs the submission, digs the
//! JSON result out of the output, and pulls the notarization log for
//! rejected submissions.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use gantry_core::{run, CommandLine, ProcessResult};

use crate::credentials::Credentials;
use crate::error::NotaryError;

/// One notarization submission
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    /// Packaged, codesigned application (`.app`, `.dmg`, `.pkg`, …)
    pub artifact: PathBuf,
    /// Validated credential strategy
    pub credentials: Credentials,
    /// Run this binary instead of `xcrun notarytool`
    pub tool_path: Option<PathBuf>,
}

impl SubmissionRequest {
    /// Build a request with the default tool resolution
    pub fn new(artifact: impl Into<PathBuf>, credentials: Credentials) -> Self {
        Self {
            artifact: artifact.into(),
            credentials,
            tool_path: None,
        }
    }
}

/// The structured result embedded in notarytool output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResponse {
    /// Terminal status, `"Accepted"` on success
    pub status: Option<String>,
    /// Submission identifier, usable with `notarytool log`
    pub id: Option<String>,
}

/// Base invocation: `xcrun notarytool`, or an override binary.
fn notary_command(tool_path: Option<&Path>) -> CommandLine {
    match tool_path {
        Some(path) => CommandLine::new(path.display().to_string()),
        None => {
            let mut cmd = CommandLine::new("xcrun");
            cmd.arg("notarytool");
            cmd
        }
    }
}

/// Probe for the submission tool.
///
/// `xcrun --find notarytool` for the default resolution, `<tool> --version`
/// for an override path. A tool that cannot even be started counts as
/// unavailable.
pub async fn is_notarytool_available(tool_path: Option<&Path>) -> bool {
    let cmd = match tool_path {
        Some(path) => {
            let mut c = CommandLine::new(path.display().to_string());
            c.arg("--version");
            c
        }
        None => {
            let mut c = CommandLine::new("xcrun");
            c.arg("--find").arg("notarytool");
            c
        }
    };
    match run(&cmd).await {
        Ok(result) => result.success(),
        Err(_) => false,
    }
}

/// Extract the structured result from notarytool output.
///
/// The contract is a single line that is a complete JSON object; every other
/// line is non-contractual diagnostic text. The first line that both looks
/// like an object and parses as JSON wins. No parseable line at all is an
/// error that preserves the raw output for the operator.
pub fn parse_submission_output(output: &str) -> Result<SubmissionResponse, NotaryError> {
    for line in output.lines() {
        let line = line.trim();
        if !(line.starts_with('{') && line.ends_with('}')) {
            if !line.is_empty() {
                debug!(line, "ignoring non-JSON output line");
            }
            continue;
        }
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(line) {
            return Ok(SubmissionResponse {
                status: value
                    .get("status")
                    .and_then(|v| v.as_str())
                    .map(String::from),
                id: value.get("id").and_then(|v| v.as_str()).map(String::from),
            });
        }
    }
    Err(NotaryError::UnparseableResult {
        output: output.to_string(),
    })
}

/// Success requires both a clean exit and an `Accepted` status; the exit code
/// alone is not sufficient.
fn submission_accepted(result: &ProcessResult, response: &SubmissionResponse) -> bool {
    result.success() && response.status.as_deref() == Some("Accepted")
}

/// Submit the artifact and block until Apple reports a terminal verdict.
pub async fn submit_and_wait(request: &SubmissionRequest) -> Result<(), NotaryError> {
    info!(artifact = %request.artifact.display(), "submitting for notarization");

    // Staging directory for the archive; removed on every exit path by drop.
    let staging = tempfile::tempdir()?;
    let upload_path = resolve_upload_path(&request.artifact, staging.path()).await?;

    let mut cmd = notary_command(request.tool_path.as_deref());
    cmd.arg("submit");
    cmd.arg(upload_path.display().to_string());
    cmd.args(request.credentials.notarytool_args());
    cmd.arg("--wait").arg("--output-format").arg("json");

    let result = run(&cmd).await?;
    let parsed = parse_submission_output(&result.output)?;

    if submission_accepted(&result, &parsed) {
        info!("notarization accepted");
        return Ok(());
    }

    let log = match &parsed.id {
        Some(id) => fetch_log(request, id).await,
        None => None,
    };
    Err(NotaryError::SubmissionRejected {
        output: result.output,
        log,
    })
}

/// `.dmg` and `.pkg` containers upload as-is; anything else is archived with
/// `ditto`, preserving resource forks and the enclosing directory.
async fn resolve_upload_path(artifact: &Path, staging: &Path) -> Result<PathBuf, NotaryError> {
    let ext = artifact
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if ext == "dmg" || ext == "pkg" {
        debug!(artifact = %artifact.display(), "uploading container directly");
        return Ok(artifact.to_path_buf());
    }

    let stem = artifact
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| NotaryError::InvalidArtifact(artifact.display().to_string()))?;
    let zip_path = staging.join(format!("{stem}.zip"));
    debug!(zip = %zip_path.display(), "archiving application");

    let mut cmd = CommandLine::new("ditto");
    cmd.arg("-c")
        .arg("-k")
        .arg("--sequesterRsrc")
        .arg("--keepParent")
        .arg(artifact.display().to_string())
        .arg(zip_path.display().to_string());

    let result = run(&cmd).await?;
    if !result.success() {
        return Err(NotaryError::ArchiveFailed {
            code: result.code,
            output: result.output,
        });
    }
    Ok(zip_path)
}

/// Best-effort diagnostic log fetch for a rejected submission. Failure here
/// is logged and swallowed; it never escalates the primary error.
async fn fetch_log(request: &SubmissionRequest, id: &str) -> Option<String> {
    let mut cmd = notary_command(request.tool_path.as_deref());
    cmd.arg("log").arg(id);
    cmd.args(request.credentials.notarytool_args());

    match run(&cmd).await {
        Ok(result) if result.success() => {
            debug!(id, "fetched notarization log");
            Some(result.output)
        }
        Ok(result) => {
            debug!(id, code = ?result.code, "notarization log fetch failed");
            None
        }
        Err(err) => {
            debug!(id, error = %err, "failed to pull notarization logs");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_output() {
        let parsed = parse_submission_output(r#"{"status": "Accepted", "id": "123"}"#).unwrap();
        assert_eq!(parsed.status.as_deref(), Some("Accepted"));
        assert_eq!(parsed.id.as_deref(), Some("123"));
    }

    #[test]
    fn parses_json_surrounded_by_whitespace() {
        let parsed =
            parse_submission_output("\n\n  {\"status\": \"Accepted\", \"id\": \"456\"}  \n")
                .unwrap();
        assert_eq!(parsed.id.as_deref(), Some("456"));
    }

    #[test]
    fn first_json_line_wins_over_surrounding_noise() {
        let output = "Warning: noise\n{\"status\":\"Accepted\",\"id\":\"789\"}\nWarning: trailing";
        let parsed = parse_submission_output(output).unwrap();
        assert_eq!(parsed.status.as_deref(), Some("Accepted"));
        assert_eq!(parsed.id.as_deref(), Some("789"));
    }

    #[test]
    fn parses_json_with_warnings_before_and_after() {
        let output =
            "Warning: First warning\n{\"status\": \"Invalid\", \"id\": \"def\"}\nWarning: Second warning";
        let parsed = parse_submission_output(output).unwrap();
        assert_eq!(parsed.status.as_deref(), Some("Invalid"));
        assert_eq!(parsed.id.as_deref(), Some("def"));
    }

    #[test]
    fn parses_nested_objects() {
        let output = r#"{"status": "Accepted", "data": {"nested": "value"}}"#;
        let parsed = parse_submission_output(output).unwrap();
        assert_eq!(parsed.status.as_deref(), Some("Accepted"));
        assert_eq!(parsed.id, None);
    }

    #[test]
    fn rejects_non_json_output() {
        let err = parse_submission_output("not json at all").unwrap_err();
        match err {
            NotaryError::UnparseableResult { output } => assert_eq!(output, "not json at all"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_truncated_json() {
        let input = r#"{"status": "Accepted""#;
        let err = parse_submission_output(input).unwrap_err();
        match err {
            NotaryError::UnparseableResult { output } => assert_eq!(output, input),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn acceptance_requires_exit_zero_and_accepted_status() {
        let accepted = SubmissionResponse {
            status: Some("Accepted".into()),
            id: Some("123".into()),
        };
        let invalid = SubmissionResponse {
            status: Some("Invalid".into()),
            id: Some("123".into()),
        };
        let clean = ProcessResult {
            code: Some(0),
            output: String::new(),
        };
        let dirty = ProcessResult {
            code: Some(1),
            output: String::new(),
        };

        assert!(submission_accepted(&clean, &accepted));
        assert!(!submission_accepted(&clean, &invalid));
        assert!(!submission_accepted(&dirty, &accepted));
    }

    #[tokio::test]
    async fn dmg_and_pkg_upload_directly() {
        let staging = tempfile::tempdir().unwrap();
        for name in ["MyApp.dmg", "MyApp.pkg", "MyApp.PKG"] {
            let artifact = PathBuf::from(format!("/builds/{name}"));
            let resolved = resolve_upload_path(&artifact, staging.path()).await.unwrap();
            assert_eq!(resolved, artifact);
        }
    }

    #[test]
    fn override_path_replaces_xcrun() {
        let cmd = notary_command(Some(Path::new("/opt/notarytool")));
        assert_eq!(cmd.program(), "/opt/notarytool");
        let cmd = notary_command(None);
        assert_eq!(cmd.program(), "xcrun");
    }
}
