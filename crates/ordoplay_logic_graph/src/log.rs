// SPDX-License-Identifier: MIT OR Apache-2.0
//! Log sink injected into the engine.

use serde::{Deserialize, Serialize};

/// Severity of a log message, ordered from quiet to verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum LogLevel {
    /// Nothing is logged
    Off,
    /// Failed operations
    Error,
    /// Suspicious but accepted state
    Warn,
    /// Periodic statistics
    #[default]
    Info,
    /// Node and link lifecycle
    Debug,
    /// Per-update details
    Trace,
}

/// Destination for engine log messages
pub trait LogSink {
    /// Receive one message
    fn log(&self, level: LogLevel, message: &str);
}

/// Forwards messages to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Off => {}
            LogLevel::Error => tracing::error!(target: "ordoplay_logic", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "ordoplay_logic", "{message}"),
            LogLevel::Info => tracing::info!(target: "ordoplay_logic", "{message}"),
            LogLevel::Debug => tracing::debug!(target: "ordoplay_logic", "{message}"),
            LogLevel::Trace => tracing::trace!(target: "ordoplay_logic", "{message}"),
        }
    }
}
