//! Notarization error types

use thiserror::Error;

use gantry_core::ProcessError;

/// Result type for notarization operations
pub type Result<T> = std::result::Result<T, NotaryError>;

/// Credential validation failures. Always fatal, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Fields from more than one credential strategy were supplied
    #[error("cannot combine password, API key and keychain credentials; supply exactly one strategy")]
    Ambiguous,

    /// One strategy was selected but a mandatory field is missing
    #[error("the `{field}` field is required when authenticating with {strategy} credentials")]
    MissingField {
        field: &'static str,
        strategy: &'static str,
    },

    /// No credential fields at all
    #[error("no authentication fields provided (e.g. apple_id, key_path, profile)")]
    NoCredentials,
}

/// Errors raised by the notarization workflow
#[derive(Debug, Error)]
pub enum NotaryError {
    /// Credential validation failed
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The selected credential strategy cannot be used with this tool
    #[error("{strategy} credentials are not supported by {tool}")]
    UnsupportedCredentials {
        strategy: &'static str,
        tool: &'static str,
    },

    /// Required tool missing; checked once before submission
    #[error("required tool not available: {0}")]
    ToolUnavailable(String),

    /// The artifact path has no usable file name or parent directory
    #[error("invalid artifact path: {0}")]
    InvalidArtifact(String),

    /// Archiving the artifact for upload failed
    #[error("failed to archive application, exited with code {code:?}\n\n{output}")]
    ArchiveFailed { code: Option<i32>, output: String },

    /// The tool produced no parseable structured result
    #[error("could not parse notarization tool output:\n\n{output}")]
    UnparseableResult { output: String },

    /// The notarytool submission did not terminate in `Accepted`
    #[error("failed to notarize via notarytool\n\n{output}")]
    SubmissionRejected {
        output: String,
        /// Best-effort diagnostic log fetched for the submission id
        log: Option<String>,
    },

    /// The legacy poll loop reached a rejected verdict
    #[error("notarization was rejected\n\nStatus Code: {status_code:?}\nMessage: {status_message:?}\nLogs: {log_url:?}")]
    NotarizationRejected {
        status_code: Option<i64>,
        status_message: Option<String>,
        log_url: Option<String>,
    },

    /// The status check reported a verdict outside the known set
    #[error("unrecognized notarization status: \"{0}\"")]
    UnrecognizedStatus(String),

    /// The bounded not-found retry window was exhausted
    #[error("status check kept failing after repeated attempts\n\n{output}")]
    TransportFailure { output: String },

    /// Stapling failed after its retry budget
    #[error("failed to staple, exited with code {code:?}\n\n{output}")]
    StapleFailed { code: Option<i32>, output: String },

    /// Pre-flight codesign/spctl checks failed
    #[error("{0}")]
    SignatureCheckFailed(String),

    /// Process-layer failure (spawn or IO)
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
