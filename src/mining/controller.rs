// src/mining/controller.rs

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::MiningSettings;
use crate::console::ConsoleExec;
use crate::logging::NodeLogger;

use super::policy::{MiningAction, MiningPolicy, Observation, decide, parse_balance, parse_flag};

/// How a mining loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The policy was satisfied and polling stopped.
    Converged,
    /// The token fired first.
    Cancelled,
}

/// Summary returned when the loop ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningReport {
    pub polls: usize,
    pub actions: Vec<MiningAction>,
    pub exit: LoopExit,
}

/// Run the convergence loop until the policy is satisfied or `token` fires.
///
/// Each iteration sleeps for the poll interval, then queries the balance and
/// the mining flag together. Failed or unparsable queries are logged and
/// retried on the next iteration; they never end the loop.
pub async fn run_mining_loop<C>(
    console: &C,
    account: &str,
    settings: &MiningSettings,
    logger: &dyn NodeLogger,
    token: &CancellationToken,
) -> MiningReport
where
    C: ConsoleExec + ?Sized,
{
    let policy = MiningPolicy {
        target_balance: settings.target_balance,
        auto_mine: settings.auto_mine,
    };
    let balance_query = settings.commands.balance_query_for(account);
    let mut report = MiningReport {
        polls: 0,
        actions: Vec::new(),
        exit: LoopExit::Cancelled,
    };

    loop {
        if token.is_cancelled() {
            break;
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(settings.poll_interval) => {}
        }

        let replies = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            replies = async {
                tokio::join!(
                    console.exec(&balance_query),
                    console.exec(&settings.commands.mining_query),
                )
            } => replies,
        };
        report.polls += 1;

        let (balance, mining) = match replies {
            (Ok(balance), Ok(mining)) => (balance, mining),
            (Err(e), _) | (_, Err(e)) => {
                logger.error(&format!("Error fetching account balance: {e}"));
                continue;
            }
        };

        let observation = match (parse_balance(&balance), parse_flag(&mining)) {
            (Some(balance), Some(mining)) => Observation { balance, mining },
            _ => {
                logger.error(&format!(
                    "Unexpected console reply (balance: {balance:?}, mining: {mining:?})"
                ));
                continue;
            }
        };

        let decision = decide(&policy, observation);
        log_observation(logger, &policy, observation);
        debug!(?observation, ?decision, "mining decision");

        if let Some(action) = decision.action {
            logger.info(&format!("{}...", capitalize(&action.to_string())));
            let command = match action {
                MiningAction::Start => &settings.commands.start,
                MiningAction::Stop => &settings.commands.stop,
            };
            // Dispatched commands run to completion; cancellation is checked
            // once they return.
            let sent = console.exec(command).await;
            if token.is_cancelled() {
                break;
            }
            match sent {
                Ok(_) => report.actions.push(action),
                Err(e) => {
                    logger.error(&format!("Failed to {action}: {e}"));
                    continue;
                }
            }
        }

        if !decision.reschedule {
            report.exit = LoopExit::Converged;
            break;
        }
    }

    debug!(polls = report.polls, exit = ?report.exit, "mining loop finished");
    report
}

fn log_observation(logger: &dyn NodeLogger, policy: &MiningPolicy, observation: Observation) {
    let Some(target) = policy.target_balance else {
        return;
    };
    if observation.balance < target {
        logger.info(&format!(
            "Account balance ({}) is < limit ({target}).",
            observation.balance
        ));
    } else {
        logger.info(&format!(
            "Account balance ({}) is >= limit ({target}).",
            observation.balance
        ));
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Spawn [`run_mining_loop`] as a background task owning its inputs.
pub fn spawn_controller<C>(
    console: C,
    account: String,
    settings: MiningSettings,
    logger: Arc<dyn NodeLogger>,
    token: CancellationToken,
) -> JoinHandle<MiningReport>
where
    C: ConsoleExec + 'static,
{
    tokio::spawn(async move {
        run_mining_loop(&console, &account, &settings, logger.as_ref(), &token).await
    })
}
