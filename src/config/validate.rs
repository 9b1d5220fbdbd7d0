// src/config/validate.rs

use std::time::Duration;

use regex::Regex;

use crate::config::model::{
    MiningCommands, MiningSettings, NodeConfig, RawNodeConfig, StartupSettings,
    default_network_options,
};
use crate::errors::{NodeError, Result};

impl TryFrom<RawNodeConfig> for NodeConfig {
    type Error = crate::errors::NodeError;

    fn try_from(raw: RawNodeConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        let fatal_pattern = Regex::new(&raw.startup.fatal_pattern).map_err(|e| {
            NodeError::ConfigError(format!(
                "[startup].fatal_pattern is not a valid regex: {e}"
            ))
        })?;
        let startup = StartupSettings {
            window: Duration::from_millis(raw.startup.window_ms),
            fatal_pattern,
        };

        let mining = MiningSettings {
            target_balance: raw.mining.target_balance,
            auto_mine: raw.mining.auto_mine,
            poll_interval: Duration::from_millis(raw.mining.poll_interval_ms),
            commands: MiningCommands {
                balance_query: raw.mining.balance_query,
                mining_query: raw.mining.mining_query,
                start: raw.mining.start_command,
                stop: raw.mining.stop_command,
            },
        };

        let mut network = default_network_options();
        network.extend(raw.network);

        Ok(NodeConfig::new_unchecked(
            raw.node,
            network,
            raw.genesis,
            mining,
            startup,
        ))
    }
}

fn validate_raw_config(cfg: &RawNodeConfig) -> Result<()> {
    validate_node_section(cfg)?;
    validate_network_options(cfg)?;
    validate_mining(cfg)?;
    validate_startup(cfg)?;
    Ok(())
}

fn validate_node_section(cfg: &RawNodeConfig) -> Result<()> {
    let socket = cfg.node.control_socket.trim();
    if socket.is_empty() {
        return Err(NodeError::ConfigError(
            "[node].control_socket must not be empty".to_string(),
        ));
    }
    if socket.contains('/') || socket.contains('\\') {
        return Err(NodeError::ConfigError(format!(
            "[node].control_socket must be a file name, not a path (got '{socket}')"
        )));
    }
    if cfg.node.stop_timeout_ms == Some(0) {
        return Err(NodeError::ConfigError(
            "[node].stop_timeout_ms must be >= 1 when set (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_network_options(cfg: &RawNodeConfig) -> Result<()> {
    for key in cfg.network.keys() {
        if key.is_empty() || key.starts_with('-') {
            return Err(NodeError::ConfigError(format!(
                "[network] option '{key}' must be a bare name without leading dashes"
            )));
        }
        if key == "datadir" {
            return Err(NodeError::ConfigError(
                "[network].datadir is managed by the supervisor; set [node].datadir instead"
                    .to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_mining(cfg: &RawNodeConfig) -> Result<()> {
    if let Some(target) = cfg.mining.target_balance {
        if !target.is_finite() || target < 0.0 {
            return Err(NodeError::ConfigError(format!(
                "[mining].target_balance must be a non-negative number (got {target})"
            )));
        }
    }

    if cfg.mining.poll_interval_ms == 0 {
        return Err(NodeError::ConfigError(
            "[mining].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    for (name, value) in [
        ("balance_query", &cfg.mining.balance_query),
        ("mining_query", &cfg.mining.mining_query),
        ("start_command", &cfg.mining.start_command),
        ("stop_command", &cfg.mining.stop_command),
    ] {
        if value.trim().is_empty() {
            return Err(NodeError::ConfigError(format!(
                "[mining].{name} must not be empty"
            )));
        }
    }

    Ok(())
}

fn validate_startup(cfg: &RawNodeConfig) -> Result<()> {
    if cfg.startup.window_ms == 0 {
        return Err(NodeError::ConfigError(
            "[startup].window_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
