// src/mining/mod.rs

//! Auto-mining convergence loop.
//!
//! - `policy`: pure decision step over one observation.
//! - `controller`: the cancellable async loop driving a [`ConsoleExec`].
//!
//! [`ConsoleExec`]: crate::console::ConsoleExec

pub mod controller;
pub mod policy;

pub use controller::{LoopExit, MiningReport, run_mining_loop, spawn_controller};
pub use policy::{Decision, MiningAction, MiningPolicy, Observation, decide};
