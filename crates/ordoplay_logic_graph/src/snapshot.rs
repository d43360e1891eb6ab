// SPDX-License-Identifier: MIT OR Apache-2.0
//! Saving and restoring a whole engine.
//!
//! A [`GraphSnapshot`] stores node ids, names, user ids, property values
//! and links. Host-owned parts (script bodies, binding targets and anchor
//! projectors) are not serializable; a [`SnapshotResolver`] supplies them
//! again when the snapshot is loaded.

use crate::config::EngineConfig;
use crate::engine::LogicEngine;
use crate::error::SnapshotError;
use crate::link::Link;
use crate::log::{LogSink, TracingSink};
use crate::node::{
    AnchorNode, AnchorProjector, AnimationNode, AnimationNodeConfig, BindingNode, BindingTarget,
    LogicFunction, LogicNode, NodeId, NodeKind, NodeKindTag, ScriptInterface, ScriptNode, TimerNode,
};
use crate::property::{PropertySnapshot, PropertyTree};
use crate::value::PropertyValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Current snapshot format version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Serializable state of a whole engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Format version
    pub format_version: u32,
    /// Id given to the next created node
    pub next_node_id: u64,
    /// Nodes in creation order
    pub nodes: Vec<NodeSnapshot>,
    /// Links in creation order
    pub links: Vec<Link>,
}

/// Serializable state of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Node id
    pub id: NodeId,
    /// Node name
    pub name: String,
    /// Host correlation id
    #[serde(default)]
    pub user_id: Option<Uuid>,
    /// Kind-specific state
    pub state: NodeState,
    /// Input tree
    #[serde(default)]
    pub inputs: Option<PropertySnapshot>,
    /// Output tree
    #[serde(default)]
    pub outputs: Option<PropertySnapshot>,
}

/// Kind-specific part of a [`NodeSnapshot`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeState {
    /// Script node; the body comes from the resolver
    Script,
    /// Animation node with its channels and play position
    Animation {
        /// Channels and timing
        config: AnimationNodeConfig,
        /// Play time in seconds
        elapsed: f32,
    },
    /// Timer node
    Timer,
    /// Anchor node; the projector comes from the resolver
    Anchor,
    /// Binding node; the target comes from the resolver
    Binding,
}

/// Supplies the host-owned parts of nodes when loading a snapshot
pub trait SnapshotResolver {
    /// Body for the script node `node`
    fn resolve_script(&mut self, _node: &str, _interface: &ScriptInterface) -> Option<Box<dyn LogicFunction>> {
        None
    }

    /// Target for the binding node `node`
    fn resolve_binding(&mut self, _node: &str) -> Option<Box<dyn BindingTarget>> {
        None
    }

    /// Projector for the anchor node `node`
    fn resolve_anchor(&mut self, _node: &str) -> Option<Box<dyn AnchorProjector>> {
        None
    }
}

/// Resolver for snapshots without scripts, bindings or anchors
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl SnapshotResolver for NoResolver {}

impl GraphSnapshot {
    /// Serialize to pretty RON text
    pub fn to_ron(&self) -> Result<String, SnapshotError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Parse RON text
    pub fn from_ron(text: &str) -> Result<Self, SnapshotError> {
        Ok(ron::from_str(text)?)
    }
}

fn zeroed(mut snapshot: PropertySnapshot) -> PropertySnapshot {
    if let Some(value) = &mut snapshot.value {
        *value = value.property_type().default_value().unwrap_or(PropertyValue::Int64(0));
    }
    snapshot.children = snapshot.children.into_iter().map(zeroed).collect();
    snapshot
}

impl LogicEngine {
    /// Capture all nodes, property values and links
    pub fn snapshot(&self) -> GraphSnapshot {
        let nodes = self
            .nodes()
            .map(|node| {
                let tree = node.properties();
                let inputs = tree.input_root().and_then(|root| tree.snapshot(root));
                let mut outputs = tree.output_root().and_then(|root| tree.snapshot(root));
                let state = match node.kind() {
                    NodeKind::Script(_) => NodeState::Script,
                    NodeKind::Animation(animation) => NodeState::Animation {
                        config: AnimationNodeConfig {
                            channels: animation.channels().to_vec(),
                            timing: animation.timing(),
                        },
                        elapsed: animation.elapsed(),
                    },
                    NodeKind::Timer(_) => {
                        // Clock readings are not persisted
                        outputs = outputs.map(zeroed);
                        NodeState::Timer
                    }
                    NodeKind::Anchor(_) => NodeState::Anchor,
                    NodeKind::Binding(_) => NodeState::Binding,
                };
                NodeSnapshot {
                    id: node.id(),
                    name: node.name().to_string(),
                    user_id: node.user_id(),
                    state,
                    inputs,
                    outputs,
                }
            })
            .collect();

        GraphSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            next_node_id: self.next_id(),
            nodes,
            links: self.links().copied().collect(),
        }
    }

    /// Rebuild an engine from a snapshot.
    ///
    /// Ids, property order and links are restored exactly, so the execution
    /// order matches the saved engine. Every node runs on the first update.
    pub fn from_snapshot(
        snapshot: &GraphSnapshot,
        config: EngineConfig,
        resolver: &mut dyn SnapshotResolver,
    ) -> Result<Self, SnapshotError> {
        Self::from_snapshot_with_sink(snapshot, config, Box::new(TracingSink), resolver)
    }

    /// Rebuild an engine from a snapshot, logging to `sink`
    pub fn from_snapshot_with_sink(
        snapshot: &GraphSnapshot,
        config: EngineConfig,
        sink: Box<dyn LogSink>,
        resolver: &mut dyn SnapshotResolver,
    ) -> Result<Self, SnapshotError> {
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.format_version));
        }

        let mut engine = LogicEngine::with_sink(config, sink);
        let mut seen = HashSet::new();
        for stored in &snapshot.nodes {
            if !seen.insert(stored.id) {
                return Err(SnapshotError::DuplicateId(stored.id));
            }
            let (mut properties, mut kind) = rebuild_node(stored, resolver)?;

            let invalid = |reason: String| SnapshotError::InvalidNode {
                node: stored.name.clone(),
                reason,
            };
            for (root, tree_snapshot) in [
                (properties.input_root(), &stored.inputs),
                (properties.output_root(), &stored.outputs),
            ] {
                match (root, tree_snapshot) {
                    (Some(root), Some(tree_snapshot)) => {
                        properties.restore(root, tree_snapshot).map_err(invalid)?;
                    }
                    (None, None) => {}
                    _ => return Err(invalid("stored properties do not match node kind".into())),
                }
            }
            if let (NodeKind::Animation(animation), NodeState::Animation { elapsed, .. }) =
                (&mut kind, &stored.state)
            {
                animation
                    .restore_elapsed(&mut properties, *elapsed)
                    .map_err(|err| invalid(err.message))?;
                if let Some(root) = properties.output_root() {
                    properties.take_changed(root);
                }
            }

            let mut node = LogicNode::new(stored.id, stored.name.clone(), properties, kind);
            node.set_user_id(stored.user_id);
            engine.insert_node(node);
        }
        engine.reserve_ids(snapshot.next_node_id);

        for link in &snapshot.links {
            engine.link_with(link.source, link.target, link.strength)?;
        }
        Ok(engine)
    }
}

fn rebuild_node(
    stored: &NodeSnapshot,
    resolver: &mut dyn SnapshotResolver,
) -> Result<(PropertyTree, NodeKind), SnapshotError> {
    let name = stored.name.as_str();
    let unresolved = |kind: NodeKindTag| SnapshotError::Unresolved {
        node: name.to_string(),
        kind,
    };
    let fields = |tree: &Option<PropertySnapshot>| tree.as_ref().map(|t| t.spec().children).unwrap_or_default();

    Ok(match &stored.state {
        NodeState::Script => {
            let interface = ScriptInterface {
                inputs: fields(&stored.inputs),
                outputs: fields(&stored.outputs),
            };
            let body = resolver
                .resolve_script(name, &interface)
                .ok_or_else(|| unresolved(NodeKindTag::Script))?;
            let properties = interface.build()?;
            (properties, NodeKind::Script(ScriptNode::new(interface, body)))
        }
        NodeState::Animation { config, .. } => {
            let (animation, properties) = AnimationNode::build(name, config.clone())?;
            (properties, NodeKind::Animation(animation))
        }
        NodeState::Timer => (TimerNode::build(), NodeKind::Timer(TimerNode)),
        NodeState::Anchor => {
            let projector = resolver
                .resolve_anchor(name)
                .ok_or_else(|| unresolved(NodeKindTag::Anchor))?;
            (AnchorNode::build(), NodeKind::Anchor(AnchorNode::new(projector)))
        }
        NodeState::Binding => {
            let target = resolver
                .resolve_binding(name)
                .ok_or_else(|| unresolved(NodeKindTag::Binding))?;
            let properties = BindingNode::build(&fields(&stored.inputs))?;
            (properties, NodeKind::Binding(BindingNode::new(target)))
        }
    })
}
