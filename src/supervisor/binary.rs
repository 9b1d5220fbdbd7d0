// src/supervisor/binary.rs

//! Node binary resolution.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::errors::{NodeError, Result};

/// Binary looked up on `PATH` when none is configured.
pub const DEFAULT_BINARY: &str = "geth";

/// Resolve the node binary.
///
/// A configured value containing a directory component is used verbatim; if
/// it does not exist the first one-shot command reports it as an execution
/// failure. A bare name (configured or the default) is searched on `PATH`.
pub fn resolve_binary(configured: Option<&Path>) -> Result<PathBuf> {
    let name = configured.unwrap_or_else(|| Path::new(DEFAULT_BINARY));
    if name.components().count() > 1 || name.is_absolute() {
        return Ok(name.to_path_buf());
    }
    which::which(name).map_err(|_| NodeError::BinaryNotFound(name.display().to_string()))
}

/// Find `name` in a `PATH`-style list of directories.
pub fn search_path(name: &OsStr, path_var: &OsStr) -> Option<PathBuf> {
    let cwd = env::current_dir().ok()?;
    which::which_in(name, Some(path_var), cwd).ok()
}
