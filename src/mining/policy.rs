// src/mining/policy.rs

//! Pure mining decisions.
//!
//! Given one consistent observation (balance and mining flag from the same
//! poll) this decides what to submit and whether to keep polling. It has no
//! IO so the convergence behaviour can be tested exhaustively.

use std::fmt;

/// The policy the loop converges towards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiningPolicy {
    /// Mine until the balance reaches this value.
    pub target_balance: Option<f64>,
    /// Mine indefinitely, ignoring the balance.
    pub auto_mine: bool,
}

impl MiningPolicy {
    /// Whether the node should be mining at `balance`.
    pub fn keep_going(&self, balance: f64) -> bool {
        self.auto_mine || self.target_balance.is_some_and(|target| balance < target)
    }
}

/// One poll's worth of remote state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub balance: f64,
    pub mining: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningAction {
    Start,
    Stop,
}

impl fmt::Display for MiningAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start mining"),
            Self::Stop => write!(f, "stop mining"),
        }
    }
}

/// Result of one decision step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub action: Option<MiningAction>,
    pub reschedule: bool,
}

pub fn decide(policy: &MiningPolicy, observation: Observation) -> Decision {
    match (policy.keep_going(observation.balance), observation.mining) {
        (true, false) => Decision {
            action: Some(MiningAction::Start),
            reschedule: true,
        },
        (true, true) => Decision {
            action: None,
            reschedule: true,
        },
        (false, true) => Decision {
            action: Some(MiningAction::Stop),
            reschedule: false,
        },
        (false, false) => Decision {
            action: None,
            reschedule: false,
        },
    }
}

/// Parse a console balance reply such as `12.5`.
pub fn parse_balance(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_matches('"')
        .parse::<f64>()
        .ok()
        .filter(|b| b.is_finite())
}

/// Parse a console boolean reply. Anything but `true`/`false` is rejected.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
