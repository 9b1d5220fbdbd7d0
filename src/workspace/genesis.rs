// src/workspace/genesis.rs

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::default_genesis;
use crate::errors::Result;

/// Render the genesis document: defaults with top-level overrides applied.
pub fn render_genesis(overrides: &BTreeMap<String, serde_json::Value>) -> Result<String> {
    let mut doc = default_genesis();
    for (key, value) in overrides {
        doc.insert(key.clone(), value.clone());
    }
    Ok(serde_json::to_string_pretty(&serde_json::Value::Object(doc))?)
}

/// Write the genesis file unless one already exists.
///
/// Returns `true` when a new file was written.
pub fn write_genesis_if_absent(
    path: &Path,
    overrides: &BTreeMap<String, serde_json::Value>,
) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    std::fs::write(path, render_genesis(overrides)?)?;
    Ok(true)
}
