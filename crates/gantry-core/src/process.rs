//! External process execution with secret-aware tracing
//!
//! Every tool Gantry drives (`xcrun`, `ditto`, `codesign`, `spctl`) is run
//! through [`run`]: the caller is suspended until the child exits, stdout and
//! stderr are merged into one text stream in the order chunks arrive, and a
//! non-zero or absent exit code is an inspectable result rather than an
//! error. Only failure to start the process at all is an error here.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

use crate::secret::{Secret, MASK};

/// Errors from the process layer
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The process could not be spawned at all (binary missing, permission
    /// denied). Distinct from a process that started and exited non-zero.
    #[error("failed to start `{program}`: {source}")]
    StartFailure {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error while draining output or waiting for exit
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a finished external command
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Exit code; `None` when the process was terminated by a signal
    pub code: Option<i32>,

    /// Combined stdout and stderr, in arrival order
    pub output: String,
}

impl ProcessResult {
    /// True only for a clean zero exit
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// One process argument, plain or secret
#[derive(Debug, Clone)]
pub enum Arg {
    /// Ordinary argument, logged as-is
    Plain(String),
    /// Credential argument, masked on every logging path
    Secret(Secret),
}

impl Arg {
    /// The real value handed to the spawned process
    pub fn value(&self) -> &str {
        match self {
            Arg::Plain(s) => s,
            Arg::Secret(s) => s.expose(),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Plain(s) => f.write_str(s),
            Arg::Secret(_) => f.write_str(MASK),
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Plain(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Plain(value)
    }
}

impl From<Secret> for Arg {
    fn from(value: Secret) -> Self {
        Arg::Secret(value)
    }
}

/// A command invocation under construction
#[derive(Debug, Clone)]
pub struct CommandLine {
    program: String,
    args: Vec<Arg>,
    cwd: Option<PathBuf>,
}

impl CommandLine {
    /// Start building an invocation of `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Append one argument
    pub fn arg(&mut self, arg: impl Into<Arg>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, A>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a secret argument
    pub fn secret_arg(&mut self, secret: impl Into<Secret>) -> &mut Self {
        self.args.push(Arg::Secret(secret.into()));
        self
    }

    /// Run the command from `dir` instead of the current directory
    pub fn current_dir(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// The program name
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The command line with secret arguments masked, for logging
    pub fn redacted(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string());
        }
        line
    }
}

/// Run a command to completion, capturing combined output and exit status.
///
/// Non-zero and absent exit codes are normal results; the only error is a
/// process that could not be started or whose output could not be drained.
pub async fn run(cmd: &CommandLine) -> Result<ProcessResult, ProcessError> {
    debug!(command = %cmd.redacted(), "spawning");

    let mut command = Command::new(&cmd.program);
    for arg in &cmd.args {
        command.arg(arg.value());
    }
    if let Some(dir) = &cmd.cwd {
        command.current_dir(dir);
    }
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|source| ProcessError::StartFailure {
        program: cmd.program.clone(),
        source,
    })?;

    // Both pipes are drained into one buffer as chunks arrive, so the merged
    // text reflects OS delivery order rather than stream identity.
    let mut stdout = child.stdout.take().expect("stdout piped");
    let mut stderr = child.stderr.take().expect("stderr piped");

    let mut merged = Vec::new();
    let mut out_chunk = [0u8; 4096];
    let mut err_chunk = [0u8; 4096];
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        tokio::select! {
            read = stdout.read(&mut out_chunk), if out_open => {
                let n = read?;
                if n == 0 {
                    out_open = false;
                } else {
                    merged.extend_from_slice(&out_chunk[..n]);
                }
            }
            read = stderr.read(&mut err_chunk), if err_open => {
                let n = read?;
                if n == 0 {
                    err_open = false;
                } else {
                    merged.extend_from_slice(&err_chunk[..n]);
                }
            }
        }
    }

    let status = child.wait().await?;
    debug!(command = %cmd.program, code = ?status.code(), "command exited");

    Ok(ProcessResult {
        code: status.code(),
        output: String::from_utf8_lossy(&merged).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacted_masks_secret_args() {
        let mut cmd = CommandLine::new("xcrun");
        cmd.arg("notarytool")
            .arg("--password")
            .secret_arg(Secret::new("hunter2"))
            .arg("--team-id")
            .secret_arg(Secret::new("TEAM123"));

        let line = cmd.redacted();
        assert_eq!(line, "xcrun notarytool --password ****** --team-id ******");
        assert!(!line.contains("hunter2"));
        assert!(!line.contains("TEAM123"));
    }

    #[test]
    fn secret_arg_value_is_passed_through() {
        let arg = Arg::Secret(Secret::new("hunter2"));
        assert_eq!(arg.value(), "hunter2");
        assert_eq!(arg.to_string(), "******");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_merged_output_and_exit_code() {
        let mut cmd = CommandLine::new("/bin/sh");
        cmd.arg("-c").arg("echo visible; echo hidden 1>&2; exit 3");

        let result = run(&cmd).await.unwrap();
        assert_eq!(result.code, Some(3));
        assert!(!result.success());
        assert!(result.output.contains("visible"));
        assert!(result.output.contains("hidden"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn zero_exit_is_success() {
        let mut cmd = CommandLine::new("/bin/sh");
        cmd.arg("-c").arg("true");

        let result = run(&cmd).await.unwrap();
        assert_eq!(result.code, Some(0));
        assert!(result.success());
    }

    #[tokio::test]
    async fn missing_binary_is_start_failure() {
        let cmd = CommandLine::new("definitely-not-a-real-tool-xyz");
        let err = run(&cmd).await.unwrap_err();
        assert!(matches!(err, ProcessError::StartFailure { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_in_requested_directory() {
        let mut cmd = CommandLine::new("/bin/sh");
        cmd.arg("-c").arg("pwd").current_dir("/");

        let result = run(&cmd).await.unwrap();
        assert_eq!(result.output.trim(), "/");
    }
}
