// src/config/mod.rs

//! Configuration loading and validation for nodevisor.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Merge defaults and validate ranges (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    MiningCommands, MiningSection, MiningSettings, NodeConfig, NodeSection, OptionValue,
    RawNodeConfig, StartupSection, StartupSettings, default_genesis, default_network_options,
};
