// src/exec/command_line.rs

//! Translate configuration into node invocations.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::OptionValue;

/// A fully-formed program + argument vector.
///
/// Arguments are handed to the OS as-is (no shell), so values containing
/// spaces or quotes need no escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Render network options as command-line flags.
///
/// - `true` becomes a bare `--key`
/// - `false` omits the flag
/// - anything else becomes `--key value`
pub fn option_flags(options: &BTreeMap<String, OptionValue>) -> Vec<OsString> {
    let mut flags = Vec::new();
    for (key, value) in options {
        match value {
            OptionValue::Flag(false) => {}
            OptionValue::Flag(true) => flags.push(OsString::from(format!("--{key}"))),
            other => {
                flags.push(OsString::from(format!("--{key}")));
                flags.push(OsString::from(other.to_string()));
            }
        }
    }
    flags
}

/// Builds every invocation of the node binary for one data directory.
///
/// Each invocation has the shape `<binary> <flags…> --datadir <dir> <subcommand…>`.
#[derive(Debug, Clone)]
pub struct CommandLineBuilder {
    binary: PathBuf,
    base_args: Vec<OsString>,
}

impl CommandLineBuilder {
    pub fn new(
        binary: impl Into<PathBuf>,
        options: &BTreeMap<String, OptionValue>,
        datadir: &Path,
    ) -> Self {
        let mut base_args = option_flags(options);
        base_args.push(OsString::from("--datadir"));
        base_args.push(datadir.as_os_str().to_owned());
        Self {
            binary: binary.into(),
            base_args,
        }
    }

    fn base(&self) -> Invocation {
        Invocation::new(&self.binary).args(self.base_args.iter().cloned())
    }

    /// The long-running node itself (no subcommand).
    pub fn long_running(&self) -> Invocation {
        self.base()
    }

    pub fn init(&self, genesis_file: &Path) -> Invocation {
        self.base().arg("init").arg(genesis_file)
    }

    pub fn account_new(&self, password_file: &Path) -> Invocation {
        self.base()
            .arg("account")
            .arg("new")
            .arg("--password")
            .arg(password_file)
    }

    pub fn account_list(&self) -> Invocation {
        self.base().arg("account").arg("list")
    }

    /// Attach to the IPC endpoint, evaluate `command` once, and detach.
    pub fn console_exec(&self, endpoint: &Path, command: &str) -> Invocation {
        let mut target = OsString::from("ipc://");
        target.push(endpoint.as_os_str());
        self.base().arg("--exec").arg(command).arg("attach").arg(target)
    }
}
