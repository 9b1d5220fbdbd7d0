// src/exec/signal.rs

//! Termination signals for the long-running node.

use std::io;

#[cfg(unix)]
use libc::{SIGKILL, SIGTERM, kill};

/// Which signal a stop request sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// SIGTERM: let the node flush state and exit on its own.
    Graceful,
    /// SIGKILL: immediate.
    Forced,
}

impl Termination {
    pub fn from_force(force: bool) -> Self {
        if force {
            Termination::Forced
        } else {
            Termination::Graceful
        }
    }
}

/// Sends the requested signal to `pid`.
///
/// On non-Unix platforms this returns `Unsupported`; callers fall back to
/// `Child::start_kill`, which is always forced.
pub fn send_signal(pid: u32, termination: Termination) -> io::Result<()> {
    #[cfg(unix)]
    {
        let signal = match termination {
            Termination::Graceful => SIGTERM,
            Termination::Forced => SIGKILL,
        };
        // SAFETY: `kill(2)` is memory-safe even when the PID is invalid; the
        // kernel simply returns an error.
        let result = unsafe { kill(pid as libc::pid_t, signal) };
        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
    #[cfg(not(unix))]
    {
        let _ = (pid, termination);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "process signals are not supported on this platform",
        ))
    }
}
