// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.

use crate::log::LogLevel;
use serde::{Deserialize, Serialize};

/// Settings of a [`LogicEngine`](crate::LogicEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Skip nodes whose inputs did not change since their last update
    pub skip_clean_nodes: bool,
    /// Collect an [`UpdateReport`](crate::UpdateReport) on every update
    pub update_report: bool,
    /// Log update statistics every N updates (0 disables)
    pub statistics_interval: u32,
    /// Most verbose level passed to the log sink
    pub log_level: LogLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            skip_clean_nodes: true,
            update_report: false,
            statistics_interval: 0,
            log_level: LogLevel::Info,
        }
    }
}

impl EngineConfig {
    /// Parse from RON text; missing fields keep their defaults
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// Serialize to pretty RON text
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = EngineConfig::from_ron("(update_report: true, log_level: Debug)").unwrap();
        assert!(config.update_report);
        assert!(config.skip_clean_nodes);
        assert_eq!(config.statistics_interval, 0);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_ron_roundtrip() {
        let config = EngineConfig {
            skip_clean_nodes: false,
            statistics_interval: 60,
            ..Default::default()
        };
        let text = config.to_ron().unwrap();
        assert_eq!(EngineConfig::from_ron(&text).unwrap(), config);
    }
}
