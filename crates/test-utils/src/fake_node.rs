#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// How the emulated node behaves once launched in long-running mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    /// Creates `geth.ipc`, runs until SIGTERM, exits 0.
    Healthy,
    /// Prints a `Fatal:` line on stderr and keeps running.
    Fatal,
    /// Exits with status 1 straight away.
    ExitsEarly,
    /// Like `Healthy` but ignores SIGTERM.
    IgnoresTerm,
    /// Survives the startup window, then exits with status 3.
    DiesAfterStartup,
}

/// A shell-script stand-in for the node binary.
///
/// Understands the subcommands the supervisor uses:
/// - `init <genesis>` creates `<datadir>/chaindata`;
/// - `account new` writes a random address to `<datadir>/keystore/account`;
/// - `account list` prints `Account #0: {<address>} keystore://…`;
/// - `--exec <cmd> attach ipc://<path>` answers `eth.mining`,
///   `miner.start()`, `miner.stop()` and balance queries from state files in
///   the data directory (the balance grows by 5 per query while mining), and
///   echoes anything else. Each command is appended to `<datadir>/console.log`.
pub struct FakeNode {
    _dir: Option<TempDir>,
    path: PathBuf,
}

impl FakeNode {
    /// Install as `fakegeth` in a fresh temporary directory.
    pub fn new(behaviour: Behaviour) -> Self {
        let dir = tempfile::tempdir().expect("create fake node dir");
        let path = write_script(dir.path(), "fakegeth", behaviour);
        Self {
            _dir: Some(dir),
            path,
        }
    }

    /// Install under `name` in an existing directory.
    pub fn install(dir: &Path, name: &str, behaviour: Behaviour) -> Self {
        let path = write_script(dir, name, behaviour);
        Self { _dir: None, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Console commands the fake node received in `datadir`.
pub fn console_log(datadir: &Path) -> Vec<String> {
    fs::read_to_string(datadir.join("console.log"))
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

fn write_script(dir: &Path, name: &str, behaviour: Behaviour) -> PathBuf {
    let path = dir.join(name);
    let script = format!("{COMMON}\n{}", run_mode(behaviour));
    fs::write(&path, script).expect("write fake node script");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("make fake node executable");
    }
    path
}

const COMMON: &str = r#"#!/bin/sh
datadir=""
exec_cmd=""
mode="run"
target=""
while [ $# -gt 0 ]; do
  case "$1" in
    --datadir) datadir="$2"; shift 2; continue ;;
    --exec) exec_cmd="$2"; shift 2; continue ;;
    --password) shift 2; continue ;;
    init) mode="init"; target="$2"; shift 2; continue ;;
    account) mode="account-$2"; shift 2; continue ;;
    attach) mode="attach"; target="${2#ipc://}"; shift 2; continue ;;
  esac
  shift
done

if [ -z "$datadir" ]; then
  echo "Fatal: no datadir" >&2
  exit 2
fi

case "$mode" in
  init)
    if [ ! -f "$target" ]; then
      echo "Fatal: failed to read genesis file: $target" >&2
      exit 1
    fi
    mkdir -p "$datadir/chaindata"
    echo "Successfully wrote genesis state"
    exit 0
    ;;
  account-new)
    mkdir -p "$datadir/keystore"
    id=$(od -An -N20 -tx1 /dev/urandom | tr -d ' \n')
    echo "$id" > "$datadir/keystore/account"
    echo "Address: {$id}"
    exit 0
    ;;
  account-list)
    if [ -f "$datadir/keystore/account" ]; then
      id=$(cat "$datadir/keystore/account")
      echo "Account #0: {$id} keystore://$datadir/keystore/UTC--$id"
    fi
    exit 0
    ;;
  attach)
    if [ ! -e "$target" ]; then
      echo "Fatal: Unable to attach to remote geth: dial unix $target: no such file or directory" >&2
      exit 1
    fi
    echo "$exec_cmd" >> "$datadir/console.log"
    case "$exec_cmd" in
      eth.mining)
        cat "$datadir/mining" 2>/dev/null || echo false
        ;;
      "miner.start()")
        echo true > "$datadir/mining"
        echo null
        ;;
      "miner.stop()")
        echo false > "$datadir/mining"
        echo null
        ;;
      *getBalance*)
        b=$(cat "$datadir/balance" 2>/dev/null || echo 0)
        if [ "$(cat "$datadir/mining" 2>/dev/null)" = "true" ]; then
          b=$((b + 5))
        fi
        echo "$b" > "$datadir/balance"
        echo "$b"
        ;;
      *)
        echo "$exec_cmd"
        ;;
    esac
    exit 0
    ;;
esac
"#;

fn run_mode(behaviour: Behaviour) -> &'static str {
    match behaviour {
        Behaviour::Healthy => {
            r#"ipc="$datadir/geth.ipc"
echo "INFO Starting peer-to-peer node" >&2
touch "$ipc"
sp=""
trap 'kill $sp 2>/dev/null; rm -f "$ipc"; exit 0' TERM INT
while :; do
  sleep 1 >/dev/null 2>&1 &
  sp=$!
  wait $sp
done
"#
        }
        Behaviour::Fatal => {
            r#"echo "INFO Starting peer-to-peer node" >&2
echo "Fatal: Error starting protocol stack: listen tcp :30303: bind: address already in use" >&2
while :; do
  sleep 1 >/dev/null 2>&1
done
"#
        }
        Behaviour::ExitsEarly => {
            r#"echo "INFO Starting peer-to-peer node" >&2
echo "ERROR could not open database" >&2
exit 1
"#
        }
        Behaviour::IgnoresTerm => {
            r#"ipc="$datadir/geth.ipc"
touch "$ipc"
trap '' TERM
while :; do
  sleep 1 >/dev/null 2>&1
done
"#
        }
        Behaviour::DiesAfterStartup => {
            r#"ipc="$datadir/geth.ipc"
touch "$ipc"
sleep 1
rm -f "$ipc"
exit 3
"#
        }
    }
}
