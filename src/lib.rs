// src/lib.rs

pub mod cli;
pub mod config;
pub mod console;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod mining;
pub mod supervisor;
pub mod types;
pub mod workspace;

pub use config::{NodeConfig, RawNodeConfig};
pub use console::{ConsoleBridge, ConsoleExec};
pub use errors::{NodeError, Result};
pub use supervisor::NodeSupervisor;
pub use supervisor::state::LifecycleState;
pub use types::{ExecResult, ExitInfo, StopOptions, StopOutcome};

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_from_path};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - supervisor start
/// - `--exec` console commands, or waiting for Ctrl-C
/// - graceful stop
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    let mut raw = load_raw_config(&args)?;
    args.apply_overrides(&mut raw);
    let cfg = NodeConfig::try_from(raw)?;

    let supervisor = NodeSupervisor::new(cfg);

    if args.dry_run {
        print_dry_run(&supervisor)?;
        return Ok(());
    }

    supervisor.start().await?;
    print_node_info(&supervisor);

    let exec_result = if args.exec.is_empty() {
        info!("node running; press Ctrl-C to stop");
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
        }
        Ok(())
    } else {
        run_console_commands(&supervisor, &args.exec).await
    };

    if supervisor.is_running() {
        let outcome = supervisor.stop(StopOptions::graceful()).await?;
        debug!(?outcome, "node stopped");
    } else {
        info!("node is no longer running; nothing to stop");
        let removed = supervisor.cleanup().await?;
        debug!(removed, "cleaned up temporary data directories");
    }

    exec_result
}

fn load_raw_config(args: &CliArgs) -> anyhow::Result<RawNodeConfig> {
    match &args.config {
        Some(path) => Ok(load_from_path(path)?),
        None => {
            let path = default_config_path();
            if path.exists() {
                Ok(load_from_path(&path)?)
            } else {
                debug!(path = %path.display(), "no config file; using defaults");
                Ok(RawNodeConfig::default())
            }
        }
    }
}

async fn run_console_commands(supervisor: &NodeSupervisor, commands: &[String]) -> anyhow::Result<()> {
    for command in commands {
        let output = supervisor.exec_in_console(command).await?;
        println!("{output}");
    }
    Ok(())
}

fn print_node_info(supervisor: &NodeSupervisor) {
    if let Some(account) = supervisor.account() {
        println!("account: 0x{account}");
    }
    if let Some(dir) = supervisor.data_dir() {
        println!("datadir: {}", dir.display());
    }
    if let Some(pid) = supervisor.pid() {
        println!("pid:     {pid}");
    }
    if let Some(endpoint) = supervisor.rpc_endpoint() {
        println!("rpc:     {endpoint}");
    }
}

/// Dry-run output: the resolved launch command and the policies in effect.
fn print_dry_run(supervisor: &NodeSupervisor) -> anyhow::Result<()> {
    let cfg = supervisor.config();
    println!("nodevisor dry-run");
    println!("  launch: {}", supervisor.launch_command_line()?);
    println!("  startup.window_ms = {}", cfg.startup.window.as_millis());
    println!("  startup.fatal_pattern = {}", cfg.startup.fatal_pattern);
    match cfg.mining.target_balance {
        Some(target) => println!("  mining.target_balance = {target}"),
        None => println!("  mining.target_balance = (none)"),
    }
    println!("  mining.auto_mine = {}", cfg.mining.auto_mine);

    debug!("dry-run complete (no execution)");
    Ok(())
}
