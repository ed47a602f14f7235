//! Apple notarization workflow for Gantry
//!
//! This crate drives Apple's notarization tooling end to end: validate one of
//! three mutually exclusive credential strategies, submit an artifact with
//! `xcrun notarytool` (or the legacy `altool` upload-and-poll protocol), wait
//! for the verdict, and staple the approval ticket with `stapler`.
//!
//! ## Usage
//!
//! ```ignore
//! use gantry_notary::{notarize, NotarizeMode, NotarizeOptions, RawCredentials};
//!
//! let options = NotarizeOptions::new("MyApp.app", credentials);
//! notarize(&options).await?;
//! ```
//!
//! The individual stages (`check_signatures`, `submit_and_wait`, `staple`)
//! are public so callers can run a partial pipeline.

pub mod credentials;
pub mod error;
pub mod legacy;
pub mod notarize;
pub mod notarytool;
pub mod signature;
pub mod staple;

pub use credentials::{Credentials, RawCredentials};
pub use error::{CredentialError, NotaryError, Result};
pub use notarize::{notarize, NotarizeMode, NotarizeOptions};
pub use notarytool::{is_notarytool_available, submit_and_wait, SubmissionRequest};
pub use signature::check_signatures;
pub use staple::{staple, validate_staple};
