//! Credential strategies accepted by the notarization tools
//!
//! Three mutually exclusive strategies exist: an Apple ID with app-specific
//! password, an App Store Connect API key, and a keychain profile stored via
//! `notarytool store-credentials`. Callers that know which strategy they want
//! construct [`Credentials`] directly; loose inputs (flag/env/JSON) go
//! through [`RawCredentials::validate`], which infers the strategy from field
//! presence and checks completeness.

use std::path::PathBuf;

use serde::Deserialize;

use gantry_core::{Arg, Secret};

use crate::error::{CredentialError, NotaryError};

/// Loose, untagged credential input.
///
/// All fields optional; [`validate`](Self::validate) determines which strategy
/// was supplied. Ambiguity is checked before completeness, so fragments of two
/// strategies report as ambiguity rather than as a missing field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCredentials {
    /// Apple Developer account login
    pub apple_id: Option<String>,
    /// App-specific password (not the account password)
    pub app_password: Option<String>,
    /// Developer team identifier
    pub team_id: Option<String>,

    /// Path to the App Store Connect API `.p8` private key
    pub key_path: Option<PathBuf>,
    /// App Store Connect API key identifier
    pub key_id: Option<String>,
    /// App Store Connect API issuer identifier
    pub issuer_id: Option<String>,

    /// Keychain profile name stored via `notarytool store-credentials`
    pub profile: Option<String>,
    /// Keychain name or path; the default keychain when omitted
    pub keychain: Option<String>,
}

impl RawCredentials {
    fn has_password_fields(&self) -> bool {
        self.apple_id.is_some() || self.app_password.is_some() || self.team_id.is_some()
    }

    fn has_api_key_fields(&self) -> bool {
        self.key_path.is_some() || self.key_id.is_some() || self.issuer_id.is_some()
    }

    fn has_keychain_fields(&self) -> bool {
        self.profile.is_some() || self.keychain.is_some()
    }

    /// Resolve the loose input into exactly one validated strategy.
    ///
    /// Pure function: the same input always yields the same result.
    pub fn validate(&self) -> Result<Credentials, CredentialError> {
        let is_password = self.has_password_fields();
        let is_api_key = self.has_api_key_fields();
        let is_keychain = self.has_keychain_fields();

        let present = usize::from(is_password) + usize::from(is_api_key) + usize::from(is_keychain);
        if present > 1 {
            return Err(CredentialError::Ambiguous);
        }

        if is_password {
            let apple_id = self.apple_id.clone().ok_or(CredentialError::MissingField {
                field: "apple_id",
                strategy: "password",
            })?;
            let app_password = self.app_password.clone().ok_or(CredentialError::MissingField {
                field: "app_password",
                strategy: "password",
            })?;
            let team_id = self.team_id.clone().ok_or(CredentialError::MissingField {
                field: "team_id",
                strategy: "password",
            })?;
            return Ok(Credentials::Password {
                apple_id: Secret::new(apple_id),
                app_password: Secret::new(app_password),
                team_id: Secret::new(team_id),
            });
        }

        if is_api_key {
            let key_path = self.key_path.clone().ok_or(CredentialError::MissingField {
                field: "key_path",
                strategy: "API key",
            })?;
            let key_id = self.key_id.clone().ok_or(CredentialError::MissingField {
                field: "key_id",
                strategy: "API key",
            })?;
            let issuer_id = self.issuer_id.clone().ok_or(CredentialError::MissingField {
                field: "issuer_id",
                strategy: "API key",
            })?;
            return Ok(Credentials::ApiKey {
                key_path,
                key_id: Secret::new(key_id),
                issuer_id: Secret::new(issuer_id),
            });
        }

        if is_keychain {
            let profile = self.profile.clone().ok_or(CredentialError::MissingField {
                field: "profile",
                strategy: "keychain",
            })?;
            return Ok(Credentials::KeychainProfile {
                profile,
                keychain: self.keychain.clone(),
            });
        }

        Err(CredentialError::NoCredentials)
    }
}

/// A validated credential strategy
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Apple ID with app-specific password and team id
    Password {
        apple_id: Secret,
        app_password: Secret,
        team_id: Secret,
    },
    /// App Store Connect API key
    ApiKey {
        key_path: PathBuf,
        key_id: Secret,
        issuer_id: Secret,
    },
    /// Credentials stored in the keychain under a profile name
    KeychainProfile {
        profile: String,
        /// Keychain to search; notarytool uses the default when absent
        keychain: Option<String>,
    },
}

impl Credentials {
    /// Short strategy name for error reporting
    pub fn strategy(&self) -> &'static str {
        match self {
            Credentials::Password { .. } => "password",
            Credentials::ApiKey { .. } => "API key",
            Credentials::KeychainProfile { .. } => "keychain",
        }
    }

    /// Authorization arguments for `notarytool`, secrets wrapped for masking.
    pub fn notarytool_args(&self) -> Vec<Arg> {
        match self {
            Credentials::Password {
                apple_id,
                app_password,
                team_id,
            } => vec![
                Arg::from("--apple-id"),
                Arg::Secret(apple_id.clone()),
                Arg::from("--password"),
                Arg::Secret(app_password.clone()),
                Arg::from("--team-id"),
                Arg::Secret(team_id.clone()),
            ],
            Credentials::ApiKey {
                key_path,
                key_id,
                issuer_id,
            } => vec![
                Arg::from("--key"),
                Arg::Secret(Secret::new(key_path.display().to_string())),
                Arg::from("--key-id"),
                Arg::Secret(key_id.clone()),
                Arg::from("--issuer"),
                Arg::Secret(issuer_id.clone()),
            ],
            Credentials::KeychainProfile { profile, keychain } => {
                let mut args = Vec::new();
                if let Some(keychain) = keychain {
                    args.push(Arg::from("--keychain"));
                    args.push(Arg::from(keychain.clone()));
                }
                args.push(Arg::from("--keychain-profile"));
                args.push(Arg::from(profile.clone()));
                args
            }
        }
    }

    /// Authorization arguments for legacy `altool`.
    ///
    /// altool never supported keychain profiles, so that strategy is refused.
    pub fn altool_args(&self) -> Result<Vec<Arg>, NotaryError> {
        match self {
            Credentials::Password {
                apple_id,
                app_password,
                ..
            } => Ok(vec![
                Arg::from("-u"),
                Arg::Secret(apple_id.clone()),
                Arg::from("-p"),
                Arg::Secret(app_password.clone()),
            ]),
            Credentials::ApiKey {
                key_id, issuer_id, ..
            } => Ok(vec![
                Arg::from("--apiKey"),
                Arg::Secret(key_id.clone()),
                Arg::from("--apiIssuer"),
                Arg::Secret(issuer_id.clone()),
            ]),
            Credentials::KeychainProfile { .. } => Err(NotaryError::UnsupportedCredentials {
                strategy: self.strategy(),
                tool: "altool",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn password_input() -> RawCredentials {
        RawCredentials {
            apple_id: Some("dev@example.com".into()),
            app_password: Some("abcd-efgh-ijkl-mnop".into()),
            team_id: Some("TEAM123456".into()),
            ..Default::default()
        }
    }

    #[test]
    fn password_credentials_validate() {
        let creds = password_input().validate().unwrap();
        assert!(matches!(creds, Credentials::Password { .. }));
    }

    #[test]
    fn api_key_credentials_validate() {
        let raw = RawCredentials {
            key_path: Some("/keys/AuthKey_T9GPZ92M7K.p8".into()),
            key_id: Some("T9GPZ92M7K".into()),
            issuer_id: Some("c055ca8c-e5a8-4836-b61d-aa5794eeb3f4".into()),
            ..Default::default()
        };
        let creds = raw.validate().unwrap();
        assert!(matches!(creds, Credentials::ApiKey { .. }));
    }

    #[test]
    fn keychain_profile_validates_without_keychain() {
        let raw = RawCredentials {
            profile: Some("gantry-profile".into()),
            ..Default::default()
        };
        match raw.validate().unwrap() {
            Credentials::KeychainProfile { profile, keychain } => {
                assert_eq!(profile, "gantry-profile");
                assert!(keychain.is_none());
            }
            other => panic!("unexpected strategy: {}", other.strategy()),
        }
    }

    #[test]
    fn mixed_strategies_are_ambiguous() {
        let raw = RawCredentials {
            apple_id: Some("dev@example.com".into()),
            key_path: Some("/keys/key.p8".into()),
            ..Default::default()
        };
        assert_eq!(raw.validate().unwrap_err(), CredentialError::Ambiguous);
    }

    #[test]
    fn ambiguity_beats_missing_field() {
        // Fragments of two strategies, both incomplete: reported as ambiguity,
        // not as either strategy's missing field.
        let raw = RawCredentials {
            app_password: Some("abcd-efgh-ijkl-mnop".into()),
            profile: Some("gantry-profile".into()),
            ..Default::default()
        };
        assert_eq!(raw.validate().unwrap_err(), CredentialError::Ambiguous);
    }

    #[test]
    fn all_three_strategies_are_ambiguous() {
        let mut raw = password_input();
        raw.key_id = Some("T9GPZ92M7K".into());
        raw.profile = Some("gantry-profile".into());
        assert_eq!(raw.validate().unwrap_err(), CredentialError::Ambiguous);
    }

    #[test]
    fn empty_input_reports_no_credentials() {
        let raw = RawCredentials::default();
        assert_eq!(raw.validate().unwrap_err(), CredentialError::NoCredentials);
    }

    #[test]
    fn missing_team_id_is_named() {
        let mut raw = password_input();
        raw.team_id = None;
        assert_eq!(
            raw.validate().unwrap_err(),
            CredentialError::MissingField {
                field: "team_id",
                strategy: "password",
            }
        );
    }

    #[test]
    fn missing_issuer_id_is_named() {
        let raw = RawCredentials {
            key_path: Some("/keys/key.p8".into()),
            key_id: Some("T9GPZ92M7K".into()),
            ..Default::default()
        };
        assert_eq!(
            raw.validate().unwrap_err(),
            CredentialError::MissingField {
                field: "issuer_id",
                strategy: "API key",
            }
        );
    }

    #[test]
    fn validation_is_idempotent() {
        let raw = password_input();
        let first = format!("{:?}", raw.validate());
        let second = format!("{:?}", raw.validate());
        assert_eq!(first, second);
    }

    #[test]
    fn notarytool_args_mask_secrets() {
        let creds = password_input().validate().unwrap();
        let rendered: Vec<String> = creds
            .notarytool_args()
            .iter()
            .map(|a| a.to_string())
            .collect();
        assert_eq!(
            rendered,
            vec!["--apple-id", "******", "--password", "******", "--team-id", "******"]
        );
    }

    #[test]
    fn keychain_args_include_keychain_when_set() {
        let creds = Credentials::KeychainProfile {
            profile: "gantry-profile".into(),
            keychain: Some("/Users/dev/Library/Keychains/login.keychain-db".into()),
        };
        let rendered: Vec<String> = creds
            .notarytool_args()
            .iter()
            .map(|a| a.to_string())
            .collect();
        assert_eq!(rendered[0], "--keychain");
        assert_eq!(rendered[2], "--keychain-profile");
        assert_eq!(rendered[3], "gantry-profile");
    }

    #[test]
    fn altool_refuses_keychain_profiles() {
        let creds = Credentials::KeychainProfile {
            profile: "gantry-profile".into(),
            keychain: None,
        };
        assert!(matches!(
            creds.altool_args().unwrap_err(),
            NotaryError::UnsupportedCredentials { .. }
        ));
    }

    #[test]
    fn loose_json_input_deserializes() {
        let raw: RawCredentials = serde_json::from_str(
            r#"{"apple_id":"dev@example.com","app_password":"pw","team_id":"TEAM123456"}"#,
        )
        .unwrap();
        assert!(raw.validate().is_ok());
    }
}
