//! Shared credential flags
//!
//! Every submitting command takes the same loose credential surface: flags,
//! environment variables, or a JSON file. Which of the three strategies was
//! meant is decided by `RawCredentials::validate`, not here.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use gantry_notary::RawCredentials;

/// Credential input flags, all optional at the CLI layer
#[derive(Debug, Args)]
pub struct CredentialArgs {
    /// Apple Developer account login
    #[arg(long, env = "APPLE_ID")]
    pub apple_id: Option<String>,

    /// App-specific password (not the account password)
    #[arg(long, env = "APPLE_APP_PASSWORD", hide_env_values = true)]
    pub app_password: Option<String>,

    /// Developer team identifier
    #[arg(long, env = "APPLE_TEAM_ID")]
    pub team_id: Option<String>,

    /// Path to the App Store Connect API .p8 private key
    #[arg(long, env = "APPLE_API_KEY")]
    pub key_path: Option<PathBuf>,

    /// App Store Connect API key identifier
    #[arg(long, env = "APPLE_API_KEY_ID")]
    pub key_id: Option<String>,

    /// App Store Connect API issuer identifier
    #[arg(long, env = "APPLE_API_ISSUER")]
    pub issuer_id: Option<String>,

    /// Keychain profile stored via `notarytool store-credentials`
    #[arg(long, env = "APPLE_KEYCHAIN_PROFILE")]
    pub profile: Option<String>,

    /// Keychain name or path holding the profile
    #[arg(long, env = "APPLE_KEYCHAIN")]
    pub keychain: Option<String>,

    /// Read credentials from a JSON file; flags and environment override it
    #[arg(long, value_name = "FILE")]
    pub credentials: Option<PathBuf>,
}

impl CredentialArgs {
    /// Merge file, environment and flag inputs into one loose credential set.
    pub fn to_raw(&self) -> anyhow::Result<RawCredentials> {
        let mut raw = match &self.credentials {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading credentials file {}", path.display()))?;
                tracing::debug!(path = %path.display(), "loaded credentials file");
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing credentials file {}", path.display()))?
            }
            None => RawCredentials::default(),
        };

        if self.apple_id.is_some() {
            raw.apple_id = self.apple_id.clone();
        }
        if self.app_password.is_some() {
            raw.app_password = self.app_password.clone();
        }
        if self.team_id.is_some() {
            raw.team_id = self.team_id.clone();
        }
        if self.key_path.is_some() {
            raw.key_path = self.key_path.clone();
        }
        if self.key_id.is_some() {
            raw.key_id = self.key_id.clone();
        }
        if self.issuer_id.is_some() {
            raw.issuer_id = self.issuer_id.clone();
        }
        if self.profile.is_some() {
            raw.profile = self.profile.clone();
        }
        if self.keychain.is_some() {
            raw.keychain = self.keychain.clone();
        }

        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn empty_args() -> CredentialArgs {
        CredentialArgs {
            apple_id: None,
            app_password: None,
            team_id: None,
            key_path: None,
            key_id: None,
            issuer_id: None,
            profile: None,
            keychain: None,
            credentials: None,
        }
    }

    #[test]
    fn flags_override_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"apple_id":"file@example.com","app_password":"from-file","team_id":"FILETEAM"}}"#
        )
        .unwrap();

        let mut args = empty_args();
        args.credentials = Some(file.path().to_path_buf());
        args.apple_id = Some("flag@example.com".into());

        let raw = args.to_raw().unwrap();
        assert_eq!(raw.apple_id.as_deref(), Some("flag@example.com"));
        assert_eq!(raw.app_password.as_deref(), Some("from-file"));
        assert_eq!(raw.team_id.as_deref(), Some("FILETEAM"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let mut args = empty_args();
        args.credentials = Some(file.path().to_path_buf());
        assert!(args.to_raw().is_err());
    }
}
