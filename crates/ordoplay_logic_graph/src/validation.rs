// SPDX-License-Identifier: MIT OR Apache-2.0
//! Content checks that point at probable mistakes in a graph.

use crate::engine::LogicEngine;
use crate::log::LogLevel;
use crate::node::{NodeId, NodeKindTag};
use crate::property::PropertyRef;
use std::fmt;

/// Suspicious but valid graph content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// Node produces outputs nobody consumes
    UnusedOutputs {
        /// Node id
        node: NodeId,
        /// Node name
        name: String,
    },
    /// Binding has neither incoming links nor values set on it
    UnboundBinding {
        /// Node id
        node: NodeId,
        /// Node name
        name: String,
    },
    /// Binding inputs were set but not yet forwarded by an update
    PendingBindingValues {
        /// Node id
        node: NodeId,
        /// Node name
        name: String,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnusedOutputs { node, name } => {
                write!(f, "Node '{name}' ({node}) has no outgoing links")
            }
            Self::UnboundBinding { node, name } => {
                write!(f, "Binding '{name}' ({node}) has no incoming links and no values set")
            }
            Self::PendingBindingValues { node, name } => write!(
                f,
                "Binding '{name}' ({node}) has values set which were not passed on yet; call update()"
            ),
        }
    }
}

impl LogicEngine {
    /// Check the graph for dangling nodes and unforwarded binding values
    pub fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        for node in self.nodes() {
            let id = node.id();
            let name = node.name().to_string();
            let tree = node.properties();
            let has_outgoing = self.links().any(|link| link.source.node == id);
            let has_incoming = self.links().any(|link| link.target.node == id);

            if node.kind_tag() == NodeKindTag::Binding {
                let Some(root) = tree.input_root() else { continue };
                if tree.is_changed(root) {
                    warnings.push(ValidationWarning::PendingBindingValues { node: id, name });
                } else if !has_incoming && !self.has_set_values(PropertyRef::new(id, root)) {
                    warnings.push(ValidationWarning::UnboundBinding { node: id, name });
                }
            } else if tree.output_root().is_some_and(|root| tree.child_count(root) > 0) && !has_outgoing {
                warnings.push(ValidationWarning::UnusedOutputs { node: id, name });
            }
        }

        for warning in &warnings {
            self.log(LogLevel::Warn, &warning.to_string());
        }
        warnings
    }

    // Any leaf holding something other than its type's default
    fn has_set_values(&self, root: PropertyRef) -> bool {
        let Some(tree) = self.find_node_by_id(root.node).map(|n| n.properties()) else {
            return false;
        };
        tree.leaves(root.slot).into_iter().any(|slot| {
            let default = tree.property_type(slot).and_then(|t| t.default_value());
            tree.value(slot) != default.as_ref()
        })
    }
}
