//! Attach the notarization ticket with `stapler`

use std::path::Path;

use tracing::{debug, info};

use gantry_core::{run, CommandLine};

use crate::error::NotaryError;

/// Total staple attempts before the failure is surfaced. The ticket can lag
/// behind the verdict at the distribution point stapler queries.
pub const STAPLE_ATTEMPTS: u32 = 3;

pub(crate) fn artifact_parts(artifact: &Path) -> Result<(&Path, &str), NotaryError> {
    let name = artifact
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| NotaryError::InvalidArtifact(artifact.display().to_string()))?;
    let dir = match artifact.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((dir, name))
}

/// Staple the approval ticket to the artifact.
///
/// One attempt; the orchestration layer wraps this in
/// [`with_retry`](gantry_core::with_retry) with [`STAPLE_ATTEMPTS`].
pub async fn staple(artifact: &Path) -> Result<(), NotaryError> {
    let (dir, name) = artifact_parts(artifact)?;
    info!(artifact = %artifact.display(), "stapling notarization ticket");

    let mut cmd = CommandLine::new("xcrun");
    cmd.arg("stapler")
        .arg("staple")
        .arg("-v")
        .arg(name)
        .current_dir(dir);

    let result = run(&cmd).await?;
    if !result.success() {
        return Err(NotaryError::StapleFailed {
            code: result.code,
            output: result.output,
        });
    }

    debug!("staple succeeded");
    Ok(())
}

/// Whether the artifact already carries a valid ticket (`stapler validate`).
pub async fn validate_staple(artifact: &Path) -> Result<bool, NotaryError> {
    let (dir, name) = artifact_parts(artifact)?;

    let mut cmd = CommandLine::new("xcrun");
    cmd.arg("stapler")
        .arg("validate")
        .arg(name)
        .current_dir(dir);

    let result = run(&cmd).await?;
    Ok(result.success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn artifact_parts_splits_path() {
        let artifact = PathBuf::from("/builds/out/MyApp.app");
        let (dir, name) = artifact_parts(&artifact).unwrap();
        assert_eq!(dir, Path::new("/builds/out"));
        assert_eq!(name, "MyApp.app");
    }

    #[test]
    fn bare_file_name_runs_from_current_dir() {
        let (dir, name) = artifact_parts(Path::new("MyApp.app")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "MyApp.app");
    }
}
