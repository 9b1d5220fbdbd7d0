// src/types.rs

use std::fmt;
use std::process::ExitStatus;

/// Captured output of a one-shot command, whitespace-trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
}

impl ExecResult {
    pub fn new(stdout: impl AsRef<str>, stderr: impl AsRef<str>) -> Self {
        Self {
            stdout: stdout.as_ref().trim().to_string(),
            stderr: stderr.as_ref().trim().to_string(),
        }
    }
}

/// Exit code / terminating signal of a finished process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitInfo {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl From<ExitStatus> for ExitInfo {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {code}"),
            (None, Some(signal)) => write!(f, "signal {signal}"),
            (None, None) => write!(f, "unknown exit status"),
        }
    }
}

/// Options for [`crate::NodeSupervisor::stop`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopOptions {
    /// Send SIGKILL instead of SIGTERM.
    pub force_kill: bool,
}

impl StopOptions {
    pub fn graceful() -> Self {
        Self { force_kill: false }
    }

    pub fn kill() -> Self {
        Self { force_kill: true }
    }
}

/// Result of a successful stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopOutcome {
    pub exit_code: Option<i32>,
    pub exit_signal: Option<i32>,
}

impl From<ExitInfo> for StopOutcome {
    fn from(info: ExitInfo) -> Self {
        Self {
            exit_code: info.code,
            exit_signal: info.signal,
        }
    }
}
