// src/supervisor/state.rs

//! Pure lifecycle state machine.
//!
//! No Tokio, no processes: just the legal transitions. The supervisor keeps
//! one of these behind its mutex and claims a transition before doing any
//! work, so a second caller observing an in-flight transition fails fast
//! instead of queuing.

use std::fmt;

use crate::errors::{NodeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// No process. `start()` allowed.
    #[default]
    Idle,
    /// Provisioning, initialising or inside the startup window.
    Starting,
    /// Process confirmed started. `stop()` and console exec allowed.
    Running,
    /// Termination requested; waiting for the exit event and cleanup.
    Stopping,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
        }
    }
}

impl LifecycleState {
    /// `Idle -> Starting`.
    pub fn begin_start(&mut self) -> Result<()> {
        match self {
            Self::Idle => {
                *self = Self::Starting;
                Ok(())
            }
            _ => Err(NodeError::AlreadyRunning),
        }
    }

    /// `Starting -> Running` on success, `Starting -> Idle` on failure.
    pub fn finish_start(&mut self, started: bool) {
        debug_assert_eq!(*self, Self::Starting);
        *self = if started { Self::Running } else { Self::Idle };
    }

    /// `Running -> Stopping`.
    pub fn begin_stop(&mut self) -> Result<()> {
        match self {
            Self::Running => {
                *self = Self::Stopping;
                Ok(())
            }
            _ => Err(NodeError::NotStarted),
        }
    }

    /// `Stopping -> Idle` once the exit event fired and cleanup ran.
    pub fn finish_stop(&mut self) {
        debug_assert_eq!(*self, Self::Stopping);
        *self = Self::Idle;
    }

    /// The process went away on its own while running.
    ///
    /// Returns whether the transition applied; during `Starting` and
    /// `Stopping` the in-flight operation owns the outcome instead.
    pub fn process_exited(&mut self) -> bool {
        if *self == Self::Running {
            *self = Self::Idle;
            true
        } else {
            false
        }
    }

    pub fn is_running(&self) -> bool {
        *self == Self::Running
    }

    /// Console exec precondition.
    pub fn require_running(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(NodeError::NotStarted)
        }
    }
}
