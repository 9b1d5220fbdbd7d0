// src/config/model.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [node]
/// binary = "/usr/local/bin/geth"
/// datadir = "chain-data"
/// verbose = true
///
/// [network]
/// identity = "testnode123"
/// port = 44323
/// rpcport = 8545
///
/// [genesis]
/// difficulty = "0x400"
///
/// [mining]
/// target_balance = 10.0
///
/// [startup]
/// window_ms = 3000
/// ```
///
/// Every section is optional. Construct a [`NodeConfig`] from this with
/// `NodeConfig::try_from(raw)`, which merges defaults and validates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNodeConfig {
    #[serde(default)]
    pub node: NodeSection,

    /// Options forwarded verbatim to the node as `--key [value]` flags.
    ///
    /// Merged over [`default_network_options`]; an explicit `false` removes a
    /// default flag.
    #[serde(default)]
    pub network: BTreeMap<String, OptionValue>,

    /// Top-level keys merged over [`default_genesis`].
    #[serde(default)]
    pub genesis: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub mining: MiningSection,

    #[serde(default)]
    pub startup: StartupSection,
}

/// `[node]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSection {
    /// Path to the node binary. If absent, `geth` is looked up on `PATH`.
    #[serde(default)]
    pub binary: Option<PathBuf>,

    /// Data directory. If absent a temporary one is allocated and deleted
    /// again on a successful stop.
    #[serde(default)]
    pub datadir: Option<PathBuf>,

    /// Log lifecycle progress through the default logger.
    #[serde(default)]
    pub verbose: bool,

    /// File name of the node's IPC endpoint inside the data directory.
    #[serde(default = "default_control_socket")]
    pub control_socket: String,

    /// Password for the account created on a fresh data directory.
    #[serde(default = "default_account_password")]
    pub account_password: String,

    /// Escalate to SIGKILL if the node has not exited this long after a
    /// graceful stop. Unset means wait indefinitely.
    #[serde(default)]
    pub stop_timeout_ms: Option<u64>,
}

fn default_control_socket() -> String {
    "geth.ipc".to_string()
}

fn default_account_password() -> String {
    "1234".to_string()
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            binary: None,
            datadir: None,
            verbose: false,
            control_socket: default_control_socket(),
            account_password: default_account_password(),
            stop_timeout_ms: None,
        }
    }
}

/// `[mining]` section.
///
/// The four command strings are opaque to the supervisor; they default to
/// geth's JS console API. `{account}` in `balance_query` is replaced by the
/// account address.
#[derive(Debug, Clone, Deserialize)]
pub struct MiningSection {
    /// Mine until this balance is reached, then stop mining.
    #[serde(default)]
    pub target_balance: Option<f64>,

    /// Keep mining regardless of balance.
    #[serde(default)]
    pub auto_mine: bool,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_balance_query")]
    pub balance_query: String,

    #[serde(default = "default_mining_query")]
    pub mining_query: String,

    #[serde(default = "default_start_command")]
    pub start_command: String,

    #[serde(default = "default_stop_command")]
    pub stop_command: String,
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_balance_query() -> String {
    "web3.fromWei(eth.getBalance('0x{account}'), 'ether')".to_string()
}

fn default_mining_query() -> String {
    "eth.mining".to_string()
}

fn default_start_command() -> String {
    "miner.start()".to_string()
}

fn default_stop_command() -> String {
    "miner.stop()".to_string()
}

impl Default for MiningSection {
    fn default() -> Self {
        Self {
            target_balance: None,
            auto_mine: false,
            poll_interval_ms: default_poll_interval_ms(),
            balance_query: default_balance_query(),
            mining_query: default_mining_query(),
            start_command: default_start_command(),
            stop_command: default_stop_command(),
        }
    }
}

/// `[startup]` section: the startup-detection window.
#[derive(Debug, Clone, Deserialize)]
pub struct StartupSection {
    /// How long the process must run without fatal output to count as started.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Regex matched against each stdout/stderr line during the window.
    #[serde(default = "default_fatal_pattern")]
    pub fatal_pattern: String,
}

fn default_window_ms() -> u64 {
    3000
}

fn default_fatal_pattern() -> String {
    "Fatal:".to_string()
}

impl Default for StartupSection {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            fatal_pattern: default_fatal_pattern(),
        }
    }
}

/// A single network option value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Number(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Flag(b) => write!(f, "{b}"),
            OptionValue::Number(n) => write!(f, "{n}"),
            OptionValue::Float(x) => write!(f, "{x}"),
            OptionValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Flag(b)
    }
}

impl From<i64> for OptionValue {
    fn from(n: i64) -> Self {
        OptionValue::Number(n)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

/// Network flags every private node gets unless overridden.
pub fn default_network_options() -> BTreeMap<String, OptionValue> {
    BTreeMap::from([
        ("networkid".to_string(), "33333".into()),
        ("rpccorsdomain".to_string(), "*".into()),
        ("rpc".to_string(), true.into()),
        (
            "rpcapi".to_string(),
            "admin,db,eth,debug,miner,net,shh,txpool,personal,web3".into(),
        ),
        ("maxpeers".to_string(), OptionValue::Number(0)),
        ("nodiscover".to_string(), true.into()),
    ])
}

/// Genesis document written to a fresh data directory before overrides.
pub fn default_genesis() -> serde_json::Map<String, serde_json::Value> {
    let zero_hash = format!("0x{}", "0".repeat(64));
    let mut doc = serde_json::Map::new();
    doc.insert("nonce".into(), "0xdeadbeefdeadbeef".into());
    doc.insert("timestamp".into(), "0x0".into());
    doc.insert("parentHash".into(), zero_hash.clone().into());
    doc.insert("extraData".into(), "0x0".into());
    doc.insert("gasLimit".into(), "0x8000000".into());
    doc.insert("difficulty".into(), "0xf0000".into());
    doc.insert("mixhash".into(), zero_hash.into());
    doc.insert(
        "coinbase".into(),
        "0x3333333333333333333333333333333333333333".into(),
    );
    doc.insert("alloc".into(), serde_json::Value::Object(Default::default()));
    doc
}

/// Validated, immutable node configuration.
///
/// Only obtainable through `TryFrom<RawNodeConfig>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub node: NodeSection,
    /// Defaults merged with `[network]`, `false` entries retained.
    pub network: BTreeMap<String, OptionValue>,
    pub genesis: BTreeMap<String, serde_json::Value>,
    pub mining: MiningSettings,
    pub startup: StartupSettings,
}

#[derive(Debug, Clone)]
pub struct MiningSettings {
    pub target_balance: Option<f64>,
    pub auto_mine: bool,
    pub poll_interval: Duration,
    pub commands: MiningCommands,
}

impl MiningSettings {
    /// Whether any policy asks for the mining loop at all.
    pub fn is_enabled(&self) -> bool {
        self.auto_mine || self.target_balance.is_some()
    }
}

/// Console commands the mining loop submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningCommands {
    pub balance_query: String,
    pub mining_query: String,
    pub start: String,
    pub stop: String,
}

impl MiningCommands {
    pub fn balance_query_for(&self, account: &str) -> String {
        self.balance_query.replace("{account}", account)
    }
}

#[derive(Debug, Clone)]
pub struct StartupSettings {
    pub window: Duration,
    pub fatal_pattern: Regex,
}

impl NodeConfig {
    pub(crate) fn new_unchecked(
        node: NodeSection,
        network: BTreeMap<String, OptionValue>,
        genesis: BTreeMap<String, serde_json::Value>,
        mining: MiningSettings,
        startup: StartupSettings,
    ) -> Self {
        Self {
            node,
            network,
            genesis,
            mining,
            startup,
        }
    }

    /// Port of the HTTP RPC interface, if one was configured.
    pub fn rpc_port(&self) -> Option<u16> {
        ["rpcport", "http.port"]
            .iter()
            .filter_map(|key| self.network.get(*key))
            .find_map(|value| match value {
                OptionValue::Number(n) => u16::try_from(*n).ok(),
                OptionValue::Text(s) => s.trim().parse().ok(),
                _ => None,
            })
    }

    pub fn stop_timeout(&self) -> Option<Duration> {
        self.node.stop_timeout_ms.map(Duration::from_millis)
    }
}
