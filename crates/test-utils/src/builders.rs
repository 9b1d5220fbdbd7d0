#![allow(dead_code)]

use std::path::{Path, PathBuf};

use nodevisor::config::{NodeConfig, OptionValue, RawNodeConfig};

/// Builder for `NodeConfig` to simplify test setup.
///
/// Starts from the built-in defaults with a short startup window and a fast
/// mining poll so lifecycle tests stay quick.
pub struct RawNodeConfigBuilder {
    config: RawNodeConfig,
}

impl RawNodeConfigBuilder {
    pub fn new() -> Self {
        let mut config = RawNodeConfig::default();
        config.startup.window_ms = 300;
        config.mining.poll_interval_ms = 20;
        Self { config }
    }

    pub fn binary(mut self, path: impl AsRef<Path>) -> Self {
        self.config.node.binary = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn datadir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.node.datadir = Some(path.into());
        self
    }

    pub fn verbose(mut self) -> Self {
        self.config.node.verbose = true;
        self
    }

    pub fn network_option(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
        self.config.network.insert(key.to_string(), value.into());
        self
    }

    pub fn target_balance(mut self, balance: f64) -> Self {
        self.config.mining.target_balance = Some(balance);
        self
    }

    pub fn auto_mine(mut self) -> Self {
        self.config.mining.auto_mine = true;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.mining.poll_interval_ms = ms;
        self
    }

    pub fn startup_window_ms(mut self, ms: u64) -> Self {
        self.config.startup.window_ms = ms;
        self
    }

    pub fn stop_timeout_ms(mut self, ms: u64) -> Self {
        self.config.node.stop_timeout_ms = Some(ms);
        self
    }

    pub fn raw(self) -> RawNodeConfig {
        self.config
    }

    pub fn build(self) -> NodeConfig {
        NodeConfig::try_from(self.config).expect("test config must validate")
    }
}

impl Default for RawNodeConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
