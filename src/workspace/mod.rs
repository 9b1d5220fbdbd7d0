// src/workspace/mod.rs

//! Data-directory provisioning.
//!
//! The configuration is never mutated: provisioning yields a
//! [`ResolvedWorkspace`] that records where the data lives and whether the
//! supervisor allocated it (and may therefore delete it).

pub mod genesis;

use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::logging::NodeLogger;

const TEMP_PREFIX: &str = "nodevisor-";
const GENESIS_FILE: &str = "genesis.json";
const PASSWORD_FILE: &str = "account-password.txt";
const INIT_MARKER: &str = ".nodevisor-initialised";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWorkspace {
    path: PathBuf,
    is_temporary: bool,
}

impl ResolvedWorkspace {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.is_temporary
    }

    pub fn genesis_file(&self) -> PathBuf {
        self.path.join(GENESIS_FILE)
    }

    pub fn password_file(&self) -> PathBuf {
        self.path.join(PASSWORD_FILE)
    }

    pub fn control_endpoint(&self, socket_name: &str) -> PathBuf {
        self.path.join(socket_name)
    }

    /// A workspace whose chain and account setup has not completed yet.
    ///
    /// Only the marker written by [`mark_initialised`](Self::mark_initialised)
    /// counts; a genesis file left behind by a failed setup does not.
    pub fn is_fresh(&self) -> bool {
        !self.path.join(INIT_MARKER).exists()
    }

    /// Record that `init` and `account new` both succeeded.
    pub fn mark_initialised(&self) -> Result<()> {
        std::fs::write(self.path.join(INIT_MARKER), "")?;
        Ok(())
    }
}

/// Resolve (and create if needed) the data directory.
///
/// - No directory configured: allocate a temporary one.
/// - Relative path: resolved against the current working directory.
/// - Missing directory: created, including parents.
pub fn provision(datadir: Option<&Path>, logger: &dyn NodeLogger) -> Result<ResolvedWorkspace> {
    match datadir {
        None => {
            let path = tempfile::Builder::new()
                .prefix(TEMP_PREFIX)
                .tempdir()?
                .keep();
            logger.info(&format!("Created temporary data dir: {}", path.display()));
            Ok(ResolvedWorkspace {
                path,
                is_temporary: true,
            })
        }
        Some(dir) => {
            let path = absolutize(dir)?;
            if !path.exists() {
                logger.info(&format!("Creating data dir: {}", path.display()));
                std::fs::create_dir_all(&path)?;
            }
            Ok(ResolvedWorkspace {
                path,
                is_temporary: false,
            })
        }
    }
}

/// Delete the workspace if (and only if) the supervisor allocated it.
///
/// Returns whether anything was removed.
pub async fn cleanup(workspace: &ResolvedWorkspace, logger: &dyn NodeLogger) -> Result<bool> {
    if !workspace.is_temporary {
        return Ok(false);
    }
    logger.info(&format!("Destroying data dir: {}", workspace.path.display()));
    match tokio::fs::remove_dir_all(&workspace.path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn absolutize(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        Ok(dir.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(dir))
    }
}
