// src/exec/long_running.rs

//! Launching the long-running node and deciding whether it started.
//!
//! The node never reports readiness, so startup is judged by a window: the
//! process has to survive `startup.window` without printing a line that
//! matches `startup.fatal_pattern`. Output is scanned on both stdout and
//! stderr; once the window closes the monitors keep draining the pipes and
//! log at debug.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::config::StartupSettings;
use crate::errors::{ExecutionFailure, NodeError, Result, StartupExit};
use crate::exec::command_line::Invocation;
use crate::exec::signal::{Termination, send_signal};
use crate::types::ExitInfo;

/// How long to keep collecting output after an early exit.
const EXIT_DRAIN: Duration = Duration::from_millis(100);

/// Owns a launched node process.
///
/// The `Child` itself lives in a waiter task; this handle observes its exit
/// through a watch channel and requests termination by signal.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: u32,
    exit_rx: watch::Receiver<Option<ExitInfo>>,
    kill_tx: mpsc::UnboundedSender<()>,
}

impl ProcessHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn is_alive(&self) -> bool {
        self.exit_rx.borrow().is_none()
    }

    /// Subscribe to the exit event. The value turns `Some` exactly once.
    pub fn exit_events(&self) -> watch::Receiver<Option<ExitInfo>> {
        self.exit_rx.clone()
    }

    /// Request termination. A no-op if the process already exited.
    pub fn terminate(&self, termination: Termination) -> io::Result<()> {
        if !self.is_alive() {
            return Ok(());
        }
        match send_signal(self.pid, termination) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::Unsupported => {
                let _ = self.kill_tx.send(());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// A handle that looks alive but whose pid no process can own, so every
    /// signal fails with `ESRCH`.
    #[cfg(test)]
    pub(crate) fn unsignalable() -> Self {
        let (_exit_tx, exit_rx) = watch::channel(None);
        let (kill_tx, _kill_rx) = mpsc::unbounded_channel();
        Self {
            pid: i32::MAX as u32,
            exit_rx,
            kill_tx,
        }
    }

    /// Wait for the exit event.
    pub async fn wait_for_exit(&self) -> ExitInfo {
        let mut rx = self.exit_rx.clone();
        match rx.wait_for(|state| state.is_some()).await {
            Ok(state) => state.unwrap_or_default(),
            // Waiter task gone without reporting: treat as exited.
            Err(_) => ExitInfo::default(),
        }
    }
}

/// Spawn the node and run the startup-detection window.
///
/// Resolves only once the window has elapsed cleanly (returning the handle)
/// or the start has definitively failed. On failure the process is killed
/// and reaped before the error is returned.
pub async fn launch(invocation: &Invocation, startup: &StartupSettings) -> Result<ProcessHandle> {
    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ExecutionFailure::Spawn {
            program: invocation.program.clone().into_os_string(),
            source,
        })?;

    let pid = child.id().unwrap_or_default();
    debug!(pid, cmd = %invocation, "node process spawned");

    let (line_tx, line_rx) = mpsc::channel::<String>(256);
    if let Some(stdout) = child.stdout.take() {
        spawn_output_monitor(stdout, "stdout", pid, line_tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_output_monitor(stderr, "stderr", pid, line_tx);
    }

    let handle = spawn_waiter(child, pid);

    match await_startup(&handle, line_rx, startup).await {
        Ok(()) => Ok(handle),
        Err(err) => {
            if handle.is_alive() {
                if let Err(e) = handle.terminate(Termination::Forced) {
                    warn!(pid, error = %e, "failed to kill node after failed startup");
                }
                handle.wait_for_exit().await;
            }
            Err(err)
        }
    }
}

fn spawn_waiter(mut child: Child, pid: u32) -> ProcessHandle {
    let (exit_tx, exit_rx) = watch::channel(None);
    let (kill_tx, mut kill_rx) = mpsc::unbounded_channel::<()>();

    tokio::spawn(async move {
        let status = tokio::select! {
            status = child.wait() => status,
            Some(()) = kill_rx.recv() => {
                if let Err(e) = child.start_kill() {
                    warn!(pid, error = %e, "failed to kill node process");
                }
                child.wait().await
            }
        };

        let info = match status {
            Ok(status) => ExitInfo::from(status),
            Err(e) => {
                warn!(pid, error = %e, "failed to wait for node process");
                ExitInfo::default()
            }
        };
        debug!(pid, exit_code = ?info.code, signal = ?info.signal, "node process exited");
        let _ = exit_tx.send(Some(info));
    });

    ProcessHandle {
        pid,
        exit_rx,
        kill_tx,
    }
}

/// Forward lines to the startup watcher while it listens; always log them.
fn spawn_output_monitor<R>(stream: R, label: &'static str, pid: u32, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        let mut tx = Some(tx);

        while let Ok(Some(line)) = lines.next_line().await {
            debug!(pid, stream = label, "{}", line);
            if let Some(sender) = &tx {
                if sender.send(line).await.is_err() {
                    // Startup decided; nobody is listening any more.
                    tx = None;
                }
            }
        }

        debug!(pid, stream = label, "output monitor ended");
    });
}

async fn await_startup(
    handle: &ProcessHandle,
    mut lines: mpsc::Receiver<String>,
    startup: &StartupSettings,
) -> Result<()> {
    let deadline = sleep(startup.window);
    tokio::pin!(deadline);

    let mut exit_rx = handle.exit_events();
    let mut captured: Vec<String> = Vec::new();
    let mut streams_open = true;

    loop {
        tokio::select! {
            biased;

            line = lines.recv(), if streams_open => match line {
                Some(line) => {
                    let fatal = startup.fatal_pattern.is_match(&line);
                    captured.push(line);
                    if fatal {
                        return Err(NodeError::Startup {
                            output: captured.join("\n"),
                            exit: StartupExit::FatalOutput,
                        });
                    }
                    if deadline.is_elapsed() {
                        return Ok(());
                    }
                }
                None => streams_open = false,
            },

            _ = exit_rx.changed() => {
                let info = exit_rx.borrow().unwrap_or_default();
                if streams_open {
                    while let Ok(Some(line)) = timeout(EXIT_DRAIN, lines.recv()).await {
                        captured.push(line);
                    }
                }
                return Err(NodeError::Startup {
                    output: captured.join("\n"),
                    exit: StartupExit::Exited(info),
                });
            }

            _ = &mut deadline => return Ok(()),
        }
    }
}
