//! Exit codes for the CLI

#![allow(dead_code)]

use gantry_notary::{CredentialError, NotaryError};

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Credential validation failure
pub const VALIDATION_ERROR: i32 = 2;

/// Signature pre-flight failure
pub const SIGNATURE_ERROR: i32 = 3;

/// Submission rejected or its result unusable
pub const SUBMISSION_ERROR: i32 = 4;

/// Staple failure
pub const STAPLE_ERROR: i32 = 5;

/// Required tool unavailable
pub const TOOL_ERROR: i32 = 6;

/// Map an error chain onto the exit-code convention.
pub fn for_error(err: &anyhow::Error) -> i32 {
    if let Some(notary) = err.downcast_ref::<NotaryError>() {
        return match notary {
            NotaryError::Credential(_) => VALIDATION_ERROR,
            NotaryError::SignatureCheckFailed(_) => SIGNATURE_ERROR,
            NotaryError::SubmissionRejected { .. }
            | NotaryError::NotarizationRejected { .. }
            | NotaryError::UnparseableResult { .. }
            | NotaryError::UnrecognizedStatus(_)
            | NotaryError::TransportFailure { .. }
            | NotaryError::ArchiveFailed { .. } => SUBMISSION_ERROR,
            NotaryError::StapleFailed { .. } => STAPLE_ERROR,
            NotaryError::ToolUnavailable(_) | NotaryError::UnsupportedCredentials { .. } => {
                TOOL_ERROR
            }
            NotaryError::InvalidArtifact(_)
            | NotaryError::Process(_)
            | NotaryError::Io(_) => ERROR,
        };
    }
    if err.downcast_ref::<CredentialError>().is_some() {
        return VALIDATION_ERROR;
    }
    ERROR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_errors_map_to_validation_code() {
        let err = anyhow::Error::new(NotaryError::Credential(CredentialError::Ambiguous));
        assert_eq!(for_error(&err), VALIDATION_ERROR);
        let bare = anyhow::Error::new(CredentialError::NoCredentials);
        assert_eq!(for_error(&bare), VALIDATION_ERROR);
    }

    #[test]
    fn rejection_classes_map_to_submission_code() {
        let err = anyhow::Error::new(NotaryError::SubmissionRejected {
            output: "{\"status\":\"Invalid\"}".into(),
            log: None,
        });
        assert_eq!(for_error(&err), SUBMISSION_ERROR);
        let err = anyhow::Error::new(NotaryError::UnrecognizedStatus("sideways".into()));
        assert_eq!(for_error(&err), SUBMISSION_ERROR);
    }

    #[test]
    fn staple_and_tool_codes_are_distinct() {
        let staple = anyhow::Error::new(NotaryError::StapleFailed {
            code: Some(65),
            output: String::new(),
        });
        let tool = anyhow::Error::new(NotaryError::ToolUnavailable("notarytool".into()));
        assert_eq!(for_error(&staple), STAPLE_ERROR);
        assert_eq!(for_error(&tool), TOOL_ERROR);
        assert_ne!(for_error(&staple), for_error(&tool));
    }

    #[test]
    fn unknown_errors_fall_back_to_general_code() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(for_error(&err), ERROR);
    }
}
