// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use nodevisor::NodeError;
use nodevisor::config::{OptionValue, load_and_validate, load_from_path};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_config_is_loaded_and_merged() {
    let file = write_config(
        r#"
[node]
binary = "/opt/geth/bin/geth"
datadir = "chain"
verbose = true
stop_timeout_ms = 5000

[network]
identity = "testnode123"
port = 44323
rpcport = 58545
nodiscover = false

[genesis]
difficulty = "0x400"

[mining]
target_balance = 10.5
poll_interval_ms = 250
balance_query = "huc.getBalance('0x{account}')"
mining_query = "huc.mining"

[startup]
window_ms = 1500
fatal_pattern = "^(Fatal|panic):"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.node.binary, Some(PathBuf::from("/opt/geth/bin/geth")));
    assert_eq!(cfg.node.datadir, Some(PathBuf::from("chain")));
    assert_eq!(cfg.stop_timeout(), Some(Duration::from_secs(5)));

    assert_eq!(cfg.network.get("identity"), Some(&OptionValue::from("testnode123")));
    assert_eq!(cfg.network.get("nodiscover"), Some(&OptionValue::Flag(false)));
    assert_eq!(cfg.network.get("maxpeers"), Some(&OptionValue::Number(0)));
    assert_eq!(cfg.rpc_port(), Some(58545));

    assert_eq!(cfg.genesis.get("difficulty"), Some(&serde_json::json!("0x400")));

    assert_eq!(cfg.mining.target_balance, Some(10.5));
    assert_eq!(cfg.mining.poll_interval, Duration::from_millis(250));
    assert_eq!(
        cfg.mining.commands.balance_query_for("ab12"),
        "huc.getBalance('0xab12')"
    );
    assert_eq!(cfg.mining.commands.start, "miner.start()");

    assert_eq!(cfg.startup.window, Duration::from_millis(1500));
    assert!(cfg.startup.fatal_pattern.is_match("panic: oh no"));
    assert!(!cfg.startup.fatal_pattern.is_match("INFO Fatal: not at start"));
}

#[test]
fn empty_file_uses_defaults() {
    let file = write_config("");
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.node.binary, None);
    assert_eq!(cfg.node.control_socket, "geth.ipc");
    assert_eq!(cfg.network.get("rpc"), Some(&OptionValue::Flag(true)));
    assert!(!cfg.mining.is_enabled());
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = write_config("[node\nbinary = ");
    assert!(matches!(
        load_from_path(file.path()),
        Err(NodeError::TomlError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        load_and_validate("/definitely/not/here/Nodevisor.toml"),
        Err(NodeError::IoError(_))
    ));
}

#[test]
fn out_of_range_values_are_config_errors() {
    for (contents, needle) in [
        ("[mining]\ntarget_balance = -2.0\n", "target_balance"),
        ("[mining]\npoll_interval_ms = 0\n", "poll_interval_ms"),
        ("[startup]\nwindow_ms = 0\n", "window_ms"),
        ("[network]\n\"--rpc\" = true\n", "leading dashes"),
        ("[mining]\nstart_command = \"  \"\n", "start_command"),
    ] {
        let file = write_config(contents);
        match load_and_validate(file.path()) {
            Err(NodeError::ConfigError(msg)) => {
                assert!(msg.contains(needle), "{contents:?}: unexpected message {msg}")
            }
            other => panic!("{contents:?}: expected ConfigError, got {other:?}"),
        }
    }
}
