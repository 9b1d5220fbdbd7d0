// src/supervisor/mod.rs

//! Node lifecycle supervision.
//!
//! - [`state`] is the pure lifecycle state machine.
//! - [`binary`] resolves the node executable.
//! - [`account`] parses `account list` output.
//!
//! [`NodeSupervisor`] ties these to workspace provisioning, one-shot
//! commands, the long-running process and the mining loop. All public
//! operations take `&self`; state transitions are claimed under a mutex so
//! the supervisor can be shared behind an `Arc`.

pub mod account;
pub mod binary;
pub mod state;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::NodeConfig;
use crate::console::ConsoleBridge;
use crate::errors::{NodeError, Result};
use crate::exec::command_line::{CommandLineBuilder, Invocation};
use crate::exec::executor::{CommandExecutor, ProcessExecutor};
use crate::exec::long_running::{self, ProcessHandle};
use crate::exec::signal::Termination;
use crate::logging::{NodeLogger, default_logger};
use crate::mining;
use crate::types::{ExitInfo, StopOptions, StopOutcome};
use crate::workspace::{self, ResolvedWorkspace, genesis};

use self::account::parse_account_list;
use self::binary::resolve_binary;
use self::state::LifecycleState;

/// Supervises one node process at a time.
///
/// A temporary data directory is deleted by a successful `stop()`. After a
/// failed start or an unexpected exit it is kept for inspection; call
/// [`cleanup`](Self::cleanup) once idle to remove it and any temporary
/// directories left by earlier runs.
pub struct NodeSupervisor {
    config: Arc<NodeConfig>,
    shared: Arc<SupervisorShared>,
}

/// State reachable from background tasks (exit watcher, console bridge).
pub(crate) struct SupervisorShared {
    inner: Mutex<Inner>,
    executor: Arc<dyn CommandExecutor>,
    logger: Arc<dyn NodeLogger>,
}

#[derive(Default)]
struct Inner {
    state: LifecycleState,
    session: Option<Session>,
    workspace: Option<ResolvedWorkspace>,
    /// Temporary workspaces from earlier runs that were never cleaned up.
    abandoned: Vec<ResolvedWorkspace>,
    account: Option<String>,
    next_generation: u64,
}

/// Everything tied to one launched process.
struct Session {
    generation: u64,
    handle: Arc<ProcessHandle>,
    commands: CommandLineBuilder,
    endpoint: PathBuf,
    mining: Option<CancellationToken>,
}

/// Snapshot the console bridge needs for one exec call.
pub(crate) struct ConsoleTarget {
    pub commands: CommandLineBuilder,
    pub endpoint: PathBuf,
}

impl SupervisorShared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn executor(&self) -> &dyn CommandExecutor {
        self.executor.as_ref()
    }

    pub(crate) fn logger(&self) -> &dyn NodeLogger {
        self.logger.as_ref()
    }

    /// Fails with `NotStarted` unless a process is confirmed running.
    pub(crate) fn console_target(&self) -> Result<ConsoleTarget> {
        let inner = self.lock();
        inner.state.require_running()?;
        let session = inner.session.as_ref().ok_or(NodeError::NotStarted)?;
        Ok(ConsoleTarget {
            commands: session.commands.clone(),
            endpoint: session.endpoint.clone(),
        })
    }

    fn on_process_exit(&self, generation: u64, info: ExitInfo) {
        let mut inner = self.lock();
        let current = inner
            .session
            .as_ref()
            .is_some_and(|s| s.generation == generation);
        if !current || !inner.state.process_exited() {
            return;
        }
        if let Some(session) = inner.session.take() {
            if let Some(token) = session.mining {
                token.cancel();
            }
        }
        drop(inner);
        self.logger
            .error(&format!("Node exited unexpectedly ({info})"));
    }
}

impl NodeSupervisor {
    /// Supervisor with the default logger for `config.node.verbose`.
    pub fn new(config: NodeConfig) -> Self {
        let logger = default_logger(config.node.verbose);
        Self::with_logger(config, logger)
    }

    pub fn with_logger(config: NodeConfig, logger: Arc<dyn NodeLogger>) -> Self {
        let executor = Arc::new(ProcessExecutor::new(Arc::clone(&logger)));
        Self::with_executor(config, logger, executor)
    }

    /// Supervisor running one-shot commands through `executor`.
    pub fn with_executor(
        config: NodeConfig,
        logger: Arc<dyn NodeLogger>,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            shared: Arc::new(SupervisorShared {
                inner: Mutex::new(Inner::default()),
                executor,
                logger,
            }),
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Provision, initialise and launch the node.
    ///
    /// Resolves once the node survived the startup window. Fails with
    /// `AlreadyRunning` unless idle; any other failure returns the
    /// supervisor to idle and leaves the data directory in place.
    pub async fn start(&self) -> Result<()> {
        self.shared.lock().state.begin_start()?;
        self.shared.logger.info("Starting...");

        let prepared = self.prepare_and_launch().await;

        let mut inner = self.shared.lock();
        let session = match prepared {
            Ok(session) => session,
            Err(err) => {
                inner.state.finish_start(false);
                drop(inner);
                self.shared.logger.error(&format!("Start failed: {err}"));
                return Err(err);
            }
        };

        let generation = session.generation;
        let handle = Arc::clone(&session.handle);
        let mining_token = session.mining.clone();
        let account = inner.account.clone().unwrap_or_default();
        inner.session = Some(session);
        inner.state.finish_start(true);
        drop(inner);

        self.shared
            .logger
            .info(&format!("Node running with pid {}", handle.pid()));
        self.spawn_exit_watcher(handle, generation);

        if let Some(token) = mining_token {
            if let Some(target) = self.config.mining.target_balance {
                self.shared.logger.info(&format!(
                    "Auto-mining until balance of {target} is achieved..."
                ));
            }
            mining::spawn_controller(
                ConsoleBridge::new(Arc::clone(&self.shared)),
                account,
                self.config.mining.clone(),
                Arc::clone(&self.shared.logger),
                token,
            );
        }

        Ok(())
    }

    async fn prepare_and_launch(&self) -> Result<Session> {
        let logger = self.shared.logger.as_ref();

        let binary = resolve_binary(self.config.node.binary.as_deref())?;
        let workspace = workspace::provision(self.config.node.datadir.as_deref(), logger)?;
        {
            let mut inner = self.shared.lock();
            if let Some(previous) = inner.workspace.replace(workspace.clone()) {
                if previous.is_temporary() && previous.path().exists() && previous != workspace {
                    inner.abandoned.push(previous);
                }
            }
        }

        let commands = CommandLineBuilder::new(&binary, &self.config.network, workspace.path());
        let account = self.prepare_chain(&workspace, &commands).await?;
        self.shared.lock().account = Some(account);

        logger.info("Starting node long-running process...");
        let handle = long_running::launch(&commands.long_running(), &self.config.startup).await?;

        let generation = {
            let mut inner = self.shared.lock();
            inner.next_generation += 1;
            inner.next_generation
        };

        Ok(Session {
            generation,
            handle: Arc::new(handle),
            endpoint: workspace.control_endpoint(&self.config.node.control_socket),
            commands,
            mining: self
                .config
                .mining
                .is_enabled()
                .then(CancellationToken::new),
        })
    }

    /// Initialise a fresh workspace and discover the account.
    async fn prepare_chain(
        &self,
        workspace: &ResolvedWorkspace,
        commands: &CommandLineBuilder,
    ) -> Result<String> {
        let logger = self.shared.logger.as_ref();
        let executor = self.shared.executor.as_ref();
        let genesis_file = workspace.genesis_file();
        logger.info(&format!("Genesis file: {}", genesis_file.display()));

        if workspace.is_fresh() {
            logger.info("Creating genesis file...");
            genesis::write_genesis_if_absent(&genesis_file, &self.config.genesis)?;

            logger.info("Creating genesis chain data...");
            executor.run(&commands.init(&genesis_file)).await?;

            logger.info("Creating account...");
            let password_file = workspace.password_file();
            std::fs::write(&password_file, &self.config.node.account_password)?;
            executor.run(&commands.account_new(&password_file)).await?;
            workspace.mark_initialised()?;
        }

        logger.info("Loading account info...");
        let listing = executor.run(&commands.account_list()).await?;
        let account = parse_account_list(&listing.stdout)?;
        logger.info(&format!("Account: {account}"));
        Ok(account)
    }

    fn spawn_exit_watcher(&self, handle: Arc<ProcessHandle>, generation: u64) {
        let shared: Weak<SupervisorShared> = Arc::downgrade(&self.shared);
        tokio::spawn(async move {
            let info = handle.wait_for_exit().await;
            debug!(pid = handle.pid(), generation, "exit watcher observed node exit");
            if let Some(shared) = shared.upgrade() {
                shared.on_process_exit(generation, info);
            }
        });
    }

    /// Terminate the node and wait for it to exit.
    ///
    /// The mining loop is cancelled once the signal is sent; if signalling
    /// fails the supervisor stays running with the loop intact. A temporary data directory is deleted
    /// before this resolves. Fails with `NotStarted` unless running.
    pub async fn stop(&self, options: StopOptions) -> Result<StopOutcome> {
        let session = {
            let mut inner = self.shared.lock();
            inner.state.begin_stop()?;
            match inner.session.take() {
                Some(session) => session,
                None => {
                    inner.state.finish_stop();
                    return Err(NodeError::NotStarted);
                }
            }
        };

        self.shared.logger.info("Stopping...");
        if let Err(e) = session
            .handle
            .terminate(Termination::from_force(options.force_kill))
        {
            if session.handle.is_alive() {
                self.shared
                    .logger
                    .error(&format!("Failed to signal node: {e}"));
                let mut inner = self.shared.lock();
                inner.session = Some(session);
                inner.state = LifecycleState::Running;
                return Err(e.into());
            }
        }

        // The node is going away; the loop must not outlive it.
        if let Some(token) = &session.mining {
            token.cancel();
        }

        let info = self.wait_for_exit(&session.handle).await;
        self.shared.logger.info("Stopped.");

        let workspace = self.shared.lock().workspace.clone();
        let cleaned = match &workspace {
            Some(ws) => workspace::cleanup(ws, self.shared.logger.as_ref()).await,
            None => Ok(false),
        };

        self.shared.lock().state.finish_stop();
        cleaned?;

        Ok(StopOutcome::from(info))
    }

    /// Remove temporary data directories left behind by failed starts or
    /// unexpected exits.
    ///
    /// Fails with `AlreadyRunning` unless idle. Returns how many directories
    /// were removed; caller-supplied directories are never touched.
    pub async fn cleanup(&self) -> Result<usize> {
        let pending: Vec<ResolvedWorkspace> = {
            let mut inner = self.shared.lock();
            if inner.state != LifecycleState::Idle {
                return Err(NodeError::AlreadyRunning);
            }
            let mut pending = std::mem::take(&mut inner.abandoned);
            pending.extend(inner.workspace.iter().filter(|ws| ws.is_temporary()).cloned());
            pending
        };

        let mut removed = 0;
        for ws in &pending {
            if workspace::cleanup(ws, self.shared.logger.as_ref()).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn wait_for_exit(&self, handle: &ProcessHandle) -> ExitInfo {
        let Some(grace) = self.config.stop_timeout() else {
            return handle.wait_for_exit().await;
        };
        match timeout(grace, handle.wait_for_exit()).await {
            Ok(info) => info,
            Err(_) => {
                self.shared.logger.error(&format!(
                    "Node did not exit within {} ms; killing",
                    grace.as_millis()
                ));
                if let Err(e) = handle.terminate(Termination::Forced) {
                    debug!(error = %e, "forced kill failed; waiting anyway");
                }
                handle.wait_for_exit().await
            }
        }
    }

    /// Evaluate one command in the running node's console.
    pub async fn exec_in_console(&self, command: &str) -> Result<String> {
        ConsoleBridge::new(Arc::clone(&self.shared))
            .execute(command)
            .await
    }

    /// Console bridge for callers that want to drive the node themselves.
    pub fn console(&self) -> ConsoleBridge {
        ConsoleBridge::new(Arc::clone(&self.shared))
    }

    /// The default account; resolved by the most recent `start()`.
    pub fn account(&self) -> Option<String> {
        self.shared.lock().account.clone()
    }

    /// The resolved data directory, once provisioned.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.shared
            .lock()
            .workspace
            .as_ref()
            .map(|ws| ws.path().to_path_buf())
    }

    pub fn genesis_file_path(&self) -> Option<PathBuf> {
        self.shared
            .lock()
            .workspace
            .as_ref()
            .map(ResolvedWorkspace::genesis_file)
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().state.is_running()
    }

    pub fn state(&self) -> LifecycleState {
        self.shared.lock().state
    }

    pub fn pid(&self) -> Option<u32> {
        self.shared
            .lock()
            .session
            .as_ref()
            .map(|s| s.handle.pid())
    }

    /// `http://localhost:<port>` when an RPC port is configured.
    pub fn rpc_endpoint(&self) -> Option<String> {
        self.config
            .rpc_port()
            .map(|port| format!("http://localhost:{port}"))
    }

    /// The long-running invocation `start()` would use, without side effects.
    ///
    /// An unset data directory is shown as `<temporary>`.
    pub fn launch_command_line(&self) -> Result<Invocation> {
        let binary = resolve_binary(self.config.node.binary.as_deref())?;
        let datadir = self
            .config
            .node
            .datadir
            .clone()
            .unwrap_or_else(|| PathBuf::from("<temporary>"));
        Ok(CommandLineBuilder::new(binary, &self.config.network, &datadir).long_running())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::RawNodeConfig;
    use crate::logging::SilentLogger;

    #[tokio::test]
    async fn failed_signal_keeps_running_and_mining() {
        let config = NodeConfig::try_from(RawNodeConfig::default()).unwrap();
        let sup = NodeSupervisor::with_logger(config, Arc::new(SilentLogger));
        let token = CancellationToken::new();
        let dir = tempfile::tempdir().unwrap();

        {
            let mut inner = sup.shared.lock();
            inner.state = LifecycleState::Running;
            inner.session = Some(Session {
                generation: 1,
                handle: Arc::new(ProcessHandle::unsignalable()),
                commands: CommandLineBuilder::new("geth", &Default::default(), dir.path()),
                endpoint: dir.path().join("geth.ipc"),
                mining: Some(token.clone()),
            });
        }

        let err = sup.stop(StopOptions::graceful()).await.unwrap_err();
        assert!(matches!(err, NodeError::IoError(_)), "got {err:?}");
        assert!(sup.is_running());
        assert!(!token.is_cancelled(), "mining loop must survive a failed stop");
    }
}
