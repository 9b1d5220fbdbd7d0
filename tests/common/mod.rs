#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use nodevisor::NodeSupervisor;
use nodevisor::config::NodeConfig;
use nodevisor::logging::NodeLogger;

/// Logger that keeps every message for later assertions.
#[derive(Debug, Default)]
pub struct CapturingLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

impl CapturingLogger {
    pub fn errors(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(level, _)| *level == Level::Error)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .any(|(_, msg)| msg.contains(needle))
    }
}

impl NodeLogger for CapturingLogger {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
        self.lines
            .lock()
            .unwrap()
            .push((Level::Info, message.to_string()));
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
        self.lines
            .lock()
            .unwrap()
            .push((Level::Error, message.to_string()));
    }
}

/// Supervisor whose progress messages land in the returned logger.
pub fn supervisor(config: NodeConfig) -> (NodeSupervisor, Arc<CapturingLogger>) {
    nodevisor_test_utils::init_tracing();
    let logger = Arc::new(CapturingLogger::default());
    let supervisor = NodeSupervisor::with_logger(config, logger.clone());
    (supervisor, logger)
}
