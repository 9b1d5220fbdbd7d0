use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use nodevisor::config::MiningCommands;
use nodevisor::console::ConsoleExec;
use nodevisor::errors::{NodeError, Result};

/// One scripted answer to a balance query.
#[derive(Debug, Clone)]
pub enum BalanceReply {
    Value(String),
    /// The console call itself fails.
    Fail,
}

impl From<f64> for BalanceReply {
    fn from(balance: f64) -> Self {
        BalanceReply::Value(balance.to_string())
    }
}

impl From<&str> for BalanceReply {
    fn from(raw: &str) -> Self {
        BalanceReply::Value(raw.to_string())
    }
}

#[derive(Debug)]
struct State {
    balances: VecDeque<BalanceReply>,
    last_balance: BalanceReply,
    mining: bool,
    sent: Vec<String>,
}

/// A scripted node console.
///
/// - Balance queries pop the next scripted reply; the last one repeats.
/// - The mining flag starts `false` and follows start/stop commands.
/// - Every command is recorded in order.
#[derive(Debug, Clone)]
pub struct FakeConsole {
    commands: MiningCommands,
    state: Arc<Mutex<State>>,
}

impl FakeConsole {
    pub fn new(commands: MiningCommands) -> Self {
        Self {
            commands,
            state: Arc::new(Mutex::new(State {
                balances: VecDeque::new(),
                last_balance: BalanceReply::from(0.0),
                mining: false,
                sent: Vec::new(),
            })),
        }
    }

    pub fn with_balances<I, R>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<BalanceReply>,
    {
        {
            let mut state = self.state.lock().unwrap();
            state.balances = replies.into_iter().map(Into::into).collect();
        }
        self
    }

    pub fn mining(self, mining: bool) -> Self {
        self.state.lock().unwrap().mining = mining;
        self
    }

    pub fn is_mining(&self) -> bool {
        self.state.lock().unwrap().mining
    }

    /// Every command received, in order.
    pub fn sent(&self) -> Vec<String> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Only the start/stop commands, in order.
    pub fn actions(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|c| *c == self.commands.start || *c == self.commands.stop)
            .collect()
    }

    /// Number of balance queries answered.
    pub fn balance_polls(&self) -> usize {
        self.sent()
            .iter()
            .filter(|c| !self.is_known(c))
            .count()
    }

    fn is_known(&self, command: &str) -> bool {
        command == self.commands.start
            || command == self.commands.stop
            || command == self.commands.mining_query
    }

    fn answer(&self, command: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(command.to_string());

        if command == self.commands.start {
            state.mining = true;
            return Ok("null".to_string());
        }
        if command == self.commands.stop {
            state.mining = false;
            return Ok("null".to_string());
        }
        if command == self.commands.mining_query {
            return Ok(state.mining.to_string());
        }

        let reply = match state.balances.pop_front() {
            Some(reply) => {
                state.last_balance = reply.clone();
                reply
            }
            None => state.last_balance.clone(),
        };
        match reply {
            BalanceReply::Value(v) => Ok(v),
            BalanceReply::Fail => Err(NodeError::Other(anyhow::anyhow!(
                "scripted console failure"
            ))),
        }
    }
}

impl ConsoleExec for FakeConsole {
    fn exec<'a>(
        &'a self,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        let reply = self.answer(command);
        Box::pin(async move {
            tokio::task::yield_now().await;
            reply
        })
    }
}
