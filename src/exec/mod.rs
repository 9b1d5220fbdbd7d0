// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command_line`] builds node invocations from the merged options.
//! - [`executor`] runs one-shot commands to completion behind the
//!   [`CommandExecutor`] trait, which tests replace with a recording fake.
//! - [`long_running`] launches the node and runs the startup window.
//! - [`signal`] sends termination signals to a pid.

pub mod command_line;
pub mod executor;
pub mod long_running;
pub mod signal;

pub use command_line::{CommandLineBuilder, Invocation, option_flags};
pub use executor::{CommandExecutor, ProcessExecutor};
pub use long_running::{ProcessHandle, launch};
pub use signal::Termination;
