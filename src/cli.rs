// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::RawNodeConfig;

/// Command-line arguments for `nodevisor`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "nodevisor",
    version,
    about = "Supervise a private geth-style blockchain node.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Nodevisor.toml` in the current working directory. A missing
    /// default file is not an error; built-in defaults are used instead.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Data directory. Omit to use a temporary one deleted on stop.
    #[arg(long, value_name = "DIR")]
    pub datadir: Option<PathBuf>,

    /// Node binary (bare name searched on PATH, or a path).
    #[arg(long, value_name = "PATH")]
    pub binary: Option<PathBuf>,

    /// Mine until the account holds at least this balance.
    #[arg(long, value_name = "AMOUNT")]
    pub balance: Option<f64>,

    /// Keep mining indefinitely.
    #[arg(long)]
    pub auto_mine: bool,

    /// Report node lifecycle progress.
    #[arg(short, long)]
    pub verbose: bool,

    /// Console command to run once the node is up (repeatable).
    ///
    /// When given, the node is stopped after the last command.
    #[arg(long = "exec", value_name = "CMD")]
    pub exec: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `NODEVISOR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the config and print the launch command, but don't run it.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Apply flag overrides on top of a raw config.
    pub fn apply_overrides(&self, raw: &mut RawNodeConfig) {
        if let Some(dir) = &self.datadir {
            raw.node.datadir = Some(dir.clone());
        }
        if let Some(bin) = &self.binary {
            raw.node.binary = Some(bin.clone());
        }
        if let Some(balance) = self.balance {
            raw.mining.target_balance = Some(balance);
        }
        if self.auto_mine {
            raw.mining.auto_mine = true;
        }
        if self.verbose {
            raw.node.verbose = true;
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
