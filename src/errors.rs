// src/errors.rs

//! Crate-wide error type and result alias.

use std::ffi::OsString;
use std::fmt;

use thiserror::Error;

use crate::types::ExitInfo;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("unable to find node binary '{0}' in PATH")]
    BinaryNotFound(String),

    #[error("already running")]
    AlreadyRunning,

    #[error("not started")]
    NotStarted,

    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionFailure),

    #[error("node failed to start ({exit}):\n{output}")]
    Startup {
        output: String,
        exit: StartupExit,
    },

    #[error("unable to fetch account info from output: {output:?}")]
    AccountParse { output: String },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Why a one-shot command did not produce a result.
///
/// Kept as data so callers can tell a missing binary apart from a command
/// that ran and failed.
#[derive(Error, Debug)]
pub enum ExecutionFailure {
    #[error("could not spawn {program:?}: {source}")]
    Spawn {
        program: OsString,
        #[source]
        source: std::io::Error,
    },

    #[error("{program:?} exited with status {code:?}: {stderr}")]
    NonZeroExit {
        program: OsString,
        code: Option<i32>,
        stderr: String,
    },
}

/// How the startup window was vetoed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupExit {
    /// Output matched the fatal pattern while the process was still alive.
    FatalOutput,
    /// The process exited before the window elapsed.
    Exited(ExitInfo),
}

impl fmt::Display for StartupExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupExit::FatalOutput => write!(f, "fatal output"),
            StartupExit::Exited(info) => write!(f, "exited early, {info}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, NodeError>;
