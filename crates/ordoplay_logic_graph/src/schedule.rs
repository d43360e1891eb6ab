// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node-level dependency graph and execution order.
//!
//! Strong links contribute edges `source node -> target node`; several links
//! between the same pair of nodes are counted, so removing one of them keeps
//! the dependency alive. The order is a Kahn topological sort whose ready set
//! is drained by ascending [`NodeId`], which makes it deterministic and
//! biased towards creation order.

use crate::node::NodeId;
use std::collections::{BTreeMap, BTreeSet};

/// Whether the cached execution order is up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    /// Order reflects the current nodes and links
    Clean,
    /// Order is recomputed on the next update
    Dirty,
}

/// Strong dependencies between nodes with edge multiplicity
#[derive(Debug, Clone, Default)]
pub(crate) struct DependencyGraph {
    edges: BTreeMap<NodeId, BTreeMap<NodeId, usize>>,
}

impl DependencyGraph {
    pub(crate) fn add_node(&mut self, node: NodeId) {
        self.edges.entry(node).or_default();
    }

    /// Remove a node together with every edge touching it
    pub(crate) fn remove_node(&mut self, node: NodeId) {
        self.edges.remove(&node);
        for targets in self.edges.values_mut() {
            targets.remove(&node);
        }
    }

    pub(crate) fn add_edge(&mut self, from: NodeId, to: NodeId) {
        *self.edges.entry(from).or_default().entry(to).or_insert(0) += 1;
        self.add_node(to);
    }

    pub(crate) fn remove_edge(&mut self, from: NodeId, to: NodeId) {
        let Some(targets) = self.edges.get_mut(&from) else {
            return;
        };
        if let Some(count) = targets.get_mut(&to) {
            *count -= 1;
            if *count == 0 {
                targets.remove(&to);
            }
        }
    }

    /// Execution order, or `None` if the edges contain a cycle
    pub(crate) fn sort(&self) -> Option<Vec<NodeId>> {
        self.sort_with(None)
    }

    /// Whether adding `from -> to` would close a cycle
    pub(crate) fn would_create_cycle(&self, from: NodeId, to: NodeId) -> bool {
        from == to || self.sort_with(Some((from, to))).is_none()
    }

    fn sort_with(&self, extra: Option<(NodeId, NodeId)>) -> Option<Vec<NodeId>> {
        let mut in_degree: BTreeMap<NodeId, usize> = self.edges.keys().map(|&n| (n, 0)).collect();
        for targets in self.edges.values() {
            for (&target, &count) in targets {
                *in_degree.entry(target).or_insert(0) += count;
            }
        }
        if let Some((from, to)) = extra {
            in_degree.entry(from).or_insert(0);
            *in_degree.entry(to).or_insert(0) += 1;
        }

        let mut ready: BTreeSet<NodeId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(&node, _)| node)
            .collect();
        let mut order = Vec::with_capacity(in_degree.len());

        while let Some(node) = ready.pop_first() {
            order.push(node);

            let successors = self
                .edges
                .get(&node)
                .into_iter()
                .flat_map(|targets| targets.iter().map(|(&t, &c)| (t, c)))
                .chain(extra.filter(|&(from, _)| from == node).map(|(_, to)| (to, 1)));

            for (target, count) in successors {
                if let Some(degree) = in_degree.get_mut(&target) {
                    *degree -= count;
                    if *degree == 0 {
                        ready.insert(target);
                    }
                }
            }
        }

        (order.len() == in_degree.len()).then_some(order)
    }
}

/// Cached execution order over a [`DependencyGraph`]
#[derive(Debug, Clone, Default)]
pub(crate) struct Schedule {
    graph: DependencyGraph,
    cached: Option<Vec<NodeId>>,
}

impl Schedule {
    pub(crate) fn state(&self) -> ScheduleState {
        if self.cached.is_some() {
            ScheduleState::Clean
        } else {
            ScheduleState::Dirty
        }
    }

    pub(crate) fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub(crate) fn add_node(&mut self, node: NodeId) {
        self.graph.add_node(node);
        self.cached = None;
    }

    /// Drop a link-free node; the remaining order stays valid
    pub(crate) fn remove_node(&mut self, node: NodeId) {
        self.graph.remove_node(node);
        if let Some(order) = &mut self.cached {
            order.retain(|&n| n != node);
        }
    }

    pub(crate) fn add_edge(&mut self, from: NodeId, to: NodeId) {
        self.graph.add_edge(from, to);
        self.cached = None;
    }

    pub(crate) fn remove_edge(&mut self, from: NodeId, to: NodeId) {
        self.graph.remove_edge(from, to);
        self.cached = None;
    }

    pub(crate) fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Recompute the order if it is dirty; `None` on a cycle
    pub(crate) fn order(&mut self) -> Option<&[NodeId]> {
        if self.cached.is_none() {
            self.cached = Some(self.graph.sort()?);
        }
        self.cached.as_deref()
    }

    #[cfg(test)]
    fn cached(&self) -> Option<&[NodeId]> {
        self.cached.as_deref()
    }
}
