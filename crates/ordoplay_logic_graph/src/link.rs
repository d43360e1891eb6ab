// SPDX-License-Identifier: MIT OR Apache-2.0
//! Links between node properties.

use crate::node::NodeId;
use crate::property::PropertyRef;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Whether a link takes part in ordering and cycle detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LinkStrength {
    /// Orders the target node after the source node
    #[default]
    Strong,
    /// Only carries values; the target sees the source's last written value
    Weak,
}

/// A directed edge from an output property to an input property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// Output property
    pub source: PropertyRef,
    /// Input property
    pub target: PropertyRef,
    /// Link strength
    #[serde(default)]
    pub strength: LinkStrength,
}

impl Link {
    /// Check if this link involves a specific node
    pub fn involves_node(&self, node: NodeId) -> bool {
        self.source.node == node || self.target.node == node
    }

    /// Whether the link orders its nodes
    pub fn is_strong(&self) -> bool {
        self.strength == LinkStrength::Strong
    }
}

#[derive(Debug, Clone)]
struct LinkEntry {
    link: Link,
    // Set until the first value transfer after creation
    pending: bool,
}

/// All links, keyed by target property (inputs accept one incoming link)
#[derive(Debug, Clone, Default)]
pub(crate) struct LinkTable {
    by_target: IndexMap<PropertyRef, LinkEntry>,
}

impl LinkTable {
    pub(crate) fn insert(&mut self, link: Link) {
        self.by_target.insert(link.target, LinkEntry { link, pending: true });
    }

    /// Remove the link `source -> target`, if it exists
    pub(crate) fn remove(&mut self, source: PropertyRef, target: PropertyRef) -> Option<Link> {
        match self.by_target.get(&target) {
            Some(entry) if entry.link.source == source => {
                self.by_target.shift_remove(&target).map(|e| e.link)
            }
            _ => None,
        }
    }

    pub(crate) fn incoming(&self, target: PropertyRef) -> Option<&Link> {
        self.by_target.get(&target).map(|e| &e.link)
    }

    /// Links leaving any property of `node`, in creation order
    pub(crate) fn outgoing(&self, node: NodeId) -> Vec<Link> {
        self.by_target
            .values()
            .filter(|e| e.link.source.node == node)
            .map(|e| e.link)
            .collect()
    }

    pub(crate) fn involves_node(&self, node: NodeId) -> bool {
        self.by_target.values().any(|e| e.link.involves_node(node))
    }

    pub(crate) fn is_pending(&self, target: PropertyRef) -> bool {
        self.by_target.get(&target).is_some_and(|e| e.pending)
    }

    pub(crate) fn clear_pending(&mut self, target: PropertyRef) {
        if let Some(entry) = self.by_target.get_mut(&target) {
            entry.pending = false;
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Link> {
        self.by_target.values().map(|e| &e.link)
    }

    pub(crate) fn len(&self) -> usize {
        self.by_target.len()
    }
}
