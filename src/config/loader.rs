// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{NodeConfig, RawNodeConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawNodeConfig`.
///
/// This only performs TOML deserialization; it does **not** merge defaults or
/// validate. Use [`load_and_validate`] for that, or apply overrides to the
/// returned value first and convert with `NodeConfig::try_from`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawNodeConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawNodeConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// - Reads TOML.
/// - Applies section defaults (handled by `serde` + `Default` impls).
/// - Merges network options over the built-in private-network flags.
/// - Checks value ranges and compiles the startup fatal pattern.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<NodeConfig> {
    let raw_config = load_from_path(&path)?;
    let config = NodeConfig::try_from(raw_config)?;
    Ok(config)
}

/// Default config path: `Nodevisor.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Nodevisor.toml")
}
