// src/exec/executor.rs

//! One-shot command execution.
//!
//! The supervisor talks to a `CommandExecutor` instead of spawning processes
//! directly, which makes it easy to swap in a recording fake in tests.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tracing::debug;

use crate::errors::{ExecutionFailure, Result};
use crate::exec::command_line::Invocation;
use crate::logging::NodeLogger;
use crate::types::ExecResult;

/// Runs a command to completion and returns its captured output.
///
/// Implementations must fail with [`ExecutionFailure::Spawn`] when the
/// program cannot be started and [`ExecutionFailure::NonZeroExit`] when it
/// exits unsuccessfully.
pub trait CommandExecutor: Send + Sync {
    fn run<'a>(
        &'a self,
        invocation: &'a Invocation,
    ) -> Pin<Box<dyn Future<Output = Result<ExecResult>> + Send + 'a>>;
}

/// Real executor backed by `tokio::process`.
pub struct ProcessExecutor {
    logger: Arc<dyn NodeLogger>,
}

impl ProcessExecutor {
    pub fn new(logger: Arc<dyn NodeLogger>) -> Self {
        Self { logger }
    }
}

impl CommandExecutor for ProcessExecutor {
    fn run<'a>(
        &'a self,
        invocation: &'a Invocation,
    ) -> Pin<Box<dyn Future<Output = Result<ExecResult>> + Send + 'a>> {
        Box::pin(async move {
            self.logger
                .info(&format!("Executing command: {invocation}"));

            let output = Command::new(&invocation.program)
                .args(&invocation.args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|source| ExecutionFailure::Spawn {
                    program: invocation.program.clone().into_os_string(),
                    source,
                })?;

            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);

            debug!(
                program = %invocation.program.display(),
                exit_code = ?output.status.code(),
                "one-shot command finished"
            );

            if !output.status.success() {
                return Err(ExecutionFailure::NonZeroExit {
                    program: invocation.program.clone().into_os_string(),
                    code: output.status.code(),
                    stderr: stderr.trim().to_string(),
                }
                .into());
            }

            Ok(ExecResult::new(stdout, stderr))
        })
    }
}
