// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-update reports and rolling statistics.

use crate::node::NodeId;
use std::time::Duration;

/// What happened during one `update()`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    /// Nodes that ran, in execution order, with their run time
    pub executed: Vec<(NodeId, Duration)>,
    /// Nodes skipped because nothing changed
    pub skipped: Vec<NodeId>,
    /// Time spent recomputing the execution order (zero when cached)
    pub sort_time: Duration,
    /// Wall time of the whole update
    pub total_time: Duration,
    /// Number of links that delivered at least one changed value
    pub link_activations: usize,
}

impl UpdateReport {
    /// Slowest executed node
    pub fn slowest(&self) -> Option<(NodeId, Duration)> {
        self.executed.iter().copied().max_by_key(|(_, time)| *time)
    }
}

/// Aggregates of the updates since the last flush
#[derive(Debug, Clone, Default)]
pub(crate) struct UpdateStatistics {
    updates: u32,
    min_time: Option<Duration>,
    max_time: Duration,
    total_time: Duration,
    nodes_executed: usize,
    link_activations: usize,
}

impl UpdateStatistics {
    pub(crate) fn record(&mut self, time: Duration, nodes_executed: usize, link_activations: usize) {
        self.updates += 1;
        self.min_time = Some(self.min_time.map_or(time, |min| min.min(time)));
        self.max_time = self.max_time.max(time);
        self.total_time += time;
        self.nodes_executed += nodes_executed;
        self.link_activations += link_activations;
    }

    pub(crate) fn updates(&self) -> u32 {
        self.updates
    }

    /// Summary line of the current window; resets the window
    pub(crate) fn flush(&mut self) -> String {
        let updates = self.updates.max(1);
        let summary = format!(
            "update time min/max/avg: {:?}/{:?}/{:?}, nodes executed avg: {:.1}, link activations avg: {:.1} (over {} updates)",
            self.min_time.unwrap_or_default(),
            self.max_time,
            self.total_time / updates,
            self.nodes_executed as f64 / f64::from(updates),
            self.link_activations as f64 / f64::from(updates),
            self.updates,
        );
        *self = Self::default();
        summary
    }
}
