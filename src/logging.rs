// src/logging.rs

//! Logging for `nodevisor`.
//!
//! Two layers:
//! - [`init_logging`] installs the global `tracing-subscriber` used by the
//!   binary. Priority for determining the log level:
//!   1. `--log-level` CLI flag (if provided)
//!   2. `NODEVISOR_LOG` environment variable (e.g. "info", "debug")
//!   3. default to `info`
//! - [`NodeLogger`] is the sink the supervisor reports lifecycle progress to.
//!   Library callers can inject their own; the default forwards to `tracing`
//!   when the config is verbose and drops everything otherwise.
//!
//! Logs are sent to STDERR so that stdout stays free for command output.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("NODEVISOR_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

/// Sink for supervisor progress messages.
pub trait NodeLogger: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards to `tracing` under the `nodevisor::node` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl NodeLogger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "nodevisor::node", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "nodevisor::node", "{message}");
    }
}

/// Drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentLogger;

impl NodeLogger for SilentLogger {
    fn info(&self, _message: &str) {}

    fn error(&self, _message: &str) {}
}

/// Logger used when none is injected.
pub fn default_logger(verbose: bool) -> Arc<dyn NodeLogger> {
    if verbose {
        Arc::new(TracingLogger)
    } else {
        Arc::new(SilentLogger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_accepts_common_spellings() {
        assert_eq!(parse_level_str(" Warning "), Some(tracing::Level::WARN));
        assert_eq!(parse_level_str("DEBUG"), Some(tracing::Level::DEBUG));
        assert_eq!(parse_level_str("loud"), None);
    }
}
