//! Core plumbing for Gantry: external process execution and secret handling
//!
//! Everything Gantry does happens through external Apple tooling, so this
//! crate concentrates the two pieces every other crate depends on:
//!
//! - [`process`]: spawning a command, capturing its combined output and exit
//!   status, and tracing the invocation with secret arguments masked.
//! - [`secret`]: an opaque string wrapper that renders as `******` on any
//!   formatting path and only reveals its value when explicitly exposed.
//!
//! ## Usage
//!
//! ```ignore
//! use gantry_core::process::{run, CommandLine};
//! use gantry_core::secret::Secret;
//!
//! let mut cmd = CommandLine::new("xcrun");
//! cmd.arg("notarytool").arg("submit").secret_arg(Secret::new(password));
//! let result = run(&cmd).await?;
//! ```

pub mod process;
pub mod retry;
pub mod secret;

pub use process::{run, Arg, CommandLine, ProcessError, ProcessResult};
pub use retry::with_retry;
pub use secret::Secret;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, ProcessError>;
