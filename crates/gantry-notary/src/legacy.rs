//! Legacy `altool` upload-and-poll protocol
//!
//! Before notarytool, submission was a two-step dance: upload the archive
//! with `altool --notarize-app`, then poll `altool --notarization-info`
//! until Apple reached a terminal verdict. The verdict arrives as free text,
//! scraped field by field. Kept as a complete, selectable protocol; the
//! notarytool driver is the default.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use tokio::time::sleep;
use tracing::{debug, info};

use gantry_core::{run, CommandLine, ProcessError, ProcessResult};

use crate::credentials::Credentials;
use crate::error::NotaryError;

/// Fixed delay between status polls
pub const POLL_DELAY: Duration = Duration::from_secs(30);

/// Attempts allowed while the service cannot find the request id yet
const NOT_FOUND_ATTEMPTS: u32 = 10;

/// Substring altool prints while the request id is not yet visible.
///
/// Text sniffing against one tool's phrasing; the weakest contract in this
/// crate, which is why the bounded variant is opt-in.
const NOT_FOUND_MARKER: &str = "could not find the request";

/// Fields scraped from `altool --notarization-info` output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerdictInfo {
    pub request_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    /// Raw status text, e.g. `in progress`, `success`, `invalid`
    pub status: Option<String>,
    pub log_url: Option<String>,
    pub status_code: Option<i64>,
    pub status_message: Option<String>,
}

/// Terminal classification of one poll
#[derive(Debug, Clone, PartialEq, Eq)]
enum Verdict {
    Pending,
    Approved,
    Rejected {
        status_code: Option<i64>,
        status_message: Option<String>,
        log_url: Option<String>,
    },
}

fn capture(pattern: &str, text: &str) -> Option<String> {
    Regex::new(pattern)
        .ok()?
        .captures(text)?
        .get(1)
        .map(|m| m.as_str().trim().to_string())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Scrape the verdict fields out of altool's free-text output.
///
/// A literal `(null)` log URL is how altool spells "no log"; it normalizes
/// to absent.
pub fn parse_verdict(output: &str) -> VerdictInfo {
    let log_url =
        capture(r"(?m)^ *LogFileURL: (.+)$", output).filter(|url| url != "(null)");

    VerdictInfo {
        request_id: capture(r"(?m)^ *RequestUUID: (.+)$", output),
        timestamp: capture(r"(?m)^ *Date: (.+)$", output)
            .as_deref()
            .and_then(parse_timestamp),
        status: capture(r"(?m)^ *Status: (.+)$", output),
        log_url,
        status_code: capture(r"(?m)^ *Status Code: (.+)$", output)
            .and_then(|code| code.parse().ok()),
        status_message: capture(r"(?m)^ *Status Message: (.+)$", output),
    }
}

/// Map the raw status onto the three known states; anything else is fatal
/// and carries the unexpected literal.
fn classify(info: &VerdictInfo) -> Result<Verdict, NotaryError> {
    match info.status.as_deref() {
        Some("in progress") => Ok(Verdict::Pending),
        Some("success") => Ok(Verdict::Approved),
        Some("invalid") => Ok(Verdict::Rejected {
            status_code: info.status_code,
            status_message: info.status_message.clone(),
            log_url: info.log_url.clone(),
        }),
        other => Err(NotaryError::UnrecognizedStatus(
            other.unwrap_or("").to_string(),
        )),
    }
}

/// Drive status checks until a terminal verdict.
///
/// A non-zero exit from the check itself is a retryable transport failure:
/// wait the fixed delay and re-issue, indefinitely. `Pending` likewise loops
/// with the fixed delay, unbounded by design (Apple can legitimately take
/// many minutes). Only a started-but-unstartable process escapes the loop.
pub async fn poll_until_verdict<F, Fut>(mut check: F) -> Result<(), NotaryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ProcessResult, ProcessError>>,
{
    loop {
        let result = check().await?;
        if !result.success() {
            debug!(code = ?result.code, "status check failed, retrying after delay");
            sleep(POLL_DELAY).await;
            continue;
        }
        match classify(&parse_verdict(&result.output))? {
            Verdict::Pending => {
                debug!("still in progress, waiting");
                sleep(POLL_DELAY).await;
            }
            Verdict::Approved => {
                info!("notarization successful");
                return Ok(());
            }
            Verdict::Rejected {
                status_code,
                status_message,
                log_url,
            } => {
                return Err(NotaryError::NotarizationRejected {
                    status_code,
                    status_message,
                    log_url,
                })
            }
        }
    }
}

/// Like [`poll_until_verdict`], but tolerant of the eventual-consistency
/// window right after upload: sleeps `initial_delay` before the first check,
/// and allows up to 10 checks that report the request id as not found before
/// giving up.
pub async fn poll_until_verdict_bounded<F, Fut>(
    initial_delay: Duration,
    mut check: F,
) -> Result<(), NotaryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ProcessResult, ProcessError>>,
{
    sleep(initial_delay).await;

    let mut not_found_left = NOT_FOUND_ATTEMPTS;
    loop {
        let result = check().await?;

        if result.output.to_lowercase().contains(NOT_FOUND_MARKER) {
            not_found_left -= 1;
            if not_found_left == 0 {
                return Err(NotaryError::TransportFailure {
                    output: result.output,
                });
            }
            debug!(remaining = not_found_left, "request not visible yet, retrying");
            sleep(POLL_DELAY).await;
            continue;
        }

        if !result.success() {
            debug!(code = ?result.code, "status check failed, retrying after delay");
            sleep(POLL_DELAY).await;
            continue;
        }

        match classify(&parse_verdict(&result.output))? {
            Verdict::Pending => {
                debug!("still in progress, waiting");
                sleep(POLL_DELAY).await;
            }
            Verdict::Approved => {
                info!("notarization successful");
                return Ok(());
            }
            Verdict::Rejected {
                status_code,
                status_message,
                log_url,
            } => {
                return Err(NotaryError::NotarizationRejected {
                    status_code,
                    status_message,
                    log_url,
                })
            }
        }
    }
}

/// Zip the artifact and upload it with `altool --notarize-app`, returning
/// the request id to poll.
pub async fn upload(
    artifact: &Path,
    bundle_id: &str,
    credentials: &Credentials,
) -> Result<String, NotaryError> {
    let auth = credentials.altool_args()?;

    let (dir, name) = crate::staple::artifact_parts(artifact)?;
    let stem = artifact
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| NotaryError::InvalidArtifact(artifact.display().to_string()))?;

    let staging = tempfile::tempdir()?;
    let zip_path = staging.path().join(format!("{stem}.zip"));
    debug!(zip = %zip_path.display(), "zipping application");

    let mut cmd = CommandLine::new("zip");
    cmd.arg("-r")
        .arg("-y")
        .arg(zip_path.display().to_string())
        .arg(name)
        .current_dir(dir);
    let result = run(&cmd).await?;
    if !result.success() {
        return Err(NotaryError::ArchiveFailed {
            code: result.code,
            output: result.output,
        });
    }

    info!(artifact = %artifact.display(), "uploading to notarization service");
    let mut cmd = CommandLine::new("xcrun");
    cmd.arg("altool")
        .arg("--notarize-app")
        .arg("-f")
        .arg(zip_path.display().to_string())
        .arg("--primary-bundle-id")
        .arg(bundle_id);
    cmd.args(auth);

    let result = run(&cmd).await?;
    if !result.success() {
        return Err(NotaryError::SubmissionRejected {
            output: result.output,
            log: None,
        });
    }

    match capture(r"(?m)^RequestUUID = (.+)$", &result.output) {
        Some(uuid) => {
            debug!(%uuid, "upload acknowledged");
            Ok(uuid)
        }
        None => Err(NotaryError::UnparseableResult {
            output: result.output,
        }),
    }
}

/// Poll `altool --notarization-info` for `request_id` until terminal.
pub async fn wait_for_verdict(
    request_id: &str,
    credentials: &Credentials,
) -> Result<(), NotaryError> {
    let auth = credentials.altool_args()?;
    poll_until_verdict(|| {
        let mut cmd = CommandLine::new("xcrun");
        cmd.arg("altool").arg("--notarization-info").arg(request_id);
        cmd.args(auth.iter().cloned());
        async move { run(&cmd).await }
    })
    .await
}

/// [`wait_for_verdict`] with the bounded not-found grace window, for use
/// immediately after [`upload`].
pub async fn wait_for_verdict_after(
    initial_delay: Duration,
    request_id: &str,
    credentials: &Credentials,
) -> Result<(), NotaryError> {
    let auth = credentials.altool_args()?;
    poll_until_verdict_bounded(initial_delay, || {
        let mut cmd = CommandLine::new("xcrun");
        cmd.arg("altool").arg("--notarization-info").arg(request_id);
        cmd.args(auth.iter().cloned());
        async move { run(&cmd).await }
    })
    .await
}
