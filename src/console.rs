// src/console.rs

//! One-shot console evaluation against the running node.
//!
//! Each call spawns `<binary> … --exec <cmd> attach ipc://<endpoint>` and
//! returns its trimmed stdout. Nothing is sent to the node's own stdin.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::Result;
use crate::supervisor::SupervisorShared;

/// Anything that can evaluate a console command and return its output.
///
/// The mining loop is written against this trait so it can be driven by a
/// scripted console in tests.
pub trait ConsoleExec: Send + Sync {
    fn exec<'a>(
        &'a self,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}

/// Console access bound to a supervisor.
///
/// Cheap to clone. Calls made while the supervisor is not running fail with
/// `NotStarted` without spawning anything.
#[derive(Clone)]
pub struct ConsoleBridge {
    shared: Arc<SupervisorShared>,
}

impl ConsoleBridge {
    pub(crate) fn new(shared: Arc<SupervisorShared>) -> Self {
        Self { shared }
    }

    pub async fn execute(&self, command: &str) -> Result<String> {
        let target = self.shared.console_target()?;
        self.shared
            .logger()
            .info(&format!("Executing console command: {command}"));
        let invocation = target.commands.console_exec(&target.endpoint, command);
        let result = self.shared.executor().run(&invocation).await?;
        Ok(result.stdout)
    }
}

impl ConsoleExec for ConsoleBridge {
    fn exec<'a>(
        &'a self,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(self.execute(command))
    }
}
