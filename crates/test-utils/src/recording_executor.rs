use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use nodevisor::errors::Result;
use nodevisor::exec::{CommandExecutor, Invocation};
use nodevisor::types::ExecResult;

/// A fake executor that:
/// - records every invocation it is asked to run
/// - answers each with the same canned stdout.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    stdout: String,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl RecordingExecutor {
    pub fn new(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            invocations: Arc::default(),
        }
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }
}

impl CommandExecutor for RecordingExecutor {
    fn run<'a>(
        &'a self,
        invocation: &'a Invocation,
    ) -> Pin<Box<dyn Future<Output = Result<ExecResult>> + Send + 'a>> {
        self.invocations.lock().unwrap().push(invocation.clone());
        let result = ExecResult::new(&self.stdout, "");
        Box::pin(async move { Ok(result) })
    }
}
