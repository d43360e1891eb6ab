// SPDX-License-Identifier: MIT OR Apache-2.0
//! The logic engine: node registry, link protocol and the update loop.

use crate::config::EngineConfig;
use crate::error::{EngineError, LinkError, NodeCreationError, PropertyError, UpdateError};
use crate::link::{Link, LinkStrength, LinkTable};
use crate::log::{LogLevel, LogSink, TracingSink};
use crate::node::{
    AnchorNode, AnchorProjector, AnimationNode, AnimationNodeConfig, BindingNode, BindingTarget,
    LogicFunction, LogicNode, NodeId, NodeKind, NodeKindTag, ScriptInterface, ScriptNode, TimerNode,
};
use crate::property::{Direction, PropertyRef, PropertySpec, PropertyTree};
use crate::report::{UpdateReport, UpdateStatistics};
use crate::schedule::{Schedule, ScheduleState};
use crate::value::{PropertyType, PropertyValue};
use indexmap::IndexMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Owns all nodes and links and runs them once per [`update`](Self::update).
///
/// Nodes run in topological order of their strong links. After each node
/// runs, changed outputs are copied along its outgoing links and the
/// receiving nodes are marked dirty. A weak link delivers the value its
/// source wrote most recently, so a consumer ordered before its weak
/// producer sees that value one update later.
pub struct LogicEngine {
    config: EngineConfig,
    nodes: IndexMap<NodeId, LogicNode>,
    links: LinkTable,
    schedule: Schedule,
    next_id: u64,
    sink: Box<dyn LogSink>,
    last_report: Option<UpdateReport>,
    statistics: UpdateStatistics,
}

impl LogicEngine {
    /// Create an empty engine logging through `tracing`
    pub fn new(config: EngineConfig) -> Self {
        Self::with_sink(config, Box::new(TracingSink))
    }

    /// Create an empty engine logging to `sink`
    pub fn with_sink(config: EngineConfig, sink: Box<dyn LogSink>) -> Self {
        Self {
            config,
            nodes: IndexMap::new(),
            links: LinkTable::default(),
            schedule: Schedule::default(),
            next_id: 1,
            sink,
            last_report: None,
            statistics: UpdateStatistics::default(),
        }
    }

    /// Current configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn log(&self, level: LogLevel, message: &str) {
        if level != LogLevel::Off && level <= self.config.log_level {
            self.sink.log(level, message);
        }
    }

    fn logged<T, E: std::fmt::Display>(&self, result: Result<T, E>) -> Result<T, E> {
        if let Err(err) = &result {
            self.log(LogLevel::Error, &err.to_string());
        }
        result
    }

    // ------------------------------------------------------------------
    // Node creation and removal
    // ------------------------------------------------------------------

    pub(crate) fn insert_node(&mut self, node: LogicNode) {
        let id = node.id();
        self.log(
            LogLevel::Debug,
            &format!("Created {} node '{}' ({id})", node.kind_tag(), node.name()),
        );
        self.nodes.insert(id, node);
        self.schedule.add_node(id);
        self.next_id = self.next_id.max(id.0 + 1);
    }

    fn register(&mut self, name: String, properties: PropertyTree, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.insert_node(LogicNode::new(id, name, properties, kind));
        id
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Never hand out ids below `next`
    pub(crate) fn reserve_ids(&mut self, next: u64) {
        self.next_id = self.next_id.max(next);
    }

    /// Create a script node with the given interface and update body
    pub fn create_script(
        &mut self,
        name: impl Into<String>,
        interface: ScriptInterface,
        body: Box<dyn LogicFunction>,
    ) -> Result<NodeId, NodeCreationError> {
        let properties = self.logged(interface.build())?;
        let kind = NodeKind::Script(ScriptNode::new(interface, body));
        Ok(self.register(name.into(), properties, kind))
    }

    /// Create an animation node over validated channels
    pub fn create_animation(
        &mut self,
        name: impl Into<String>,
        config: AnimationNodeConfig,
    ) -> Result<NodeId, NodeCreationError> {
        let name = name.into();
        let (animation, properties) = self.logged(AnimationNode::build(&name, config))?;
        Ok(self.register(name, properties, NodeKind::Animation(animation)))
    }

    /// Create a timer node
    pub fn create_timer(&mut self, name: impl Into<String>) -> NodeId {
        self.register(name.into(), TimerNode::build(), NodeKind::Timer(TimerNode))
    }

    /// Create an anchor node fed by `projector`
    pub fn create_anchor(&mut self, name: impl Into<String>, projector: Box<dyn AnchorProjector>) -> NodeId {
        self.register(
            name.into(),
            AnchorNode::build(),
            NodeKind::Anchor(AnchorNode::new(projector)),
        )
    }

    /// Create a binding node forwarding `inputs` to `target`
    pub fn create_binding(
        &mut self,
        name: impl Into<String>,
        inputs: &[PropertySpec],
        target: Box<dyn BindingTarget>,
    ) -> Result<NodeId, NodeCreationError> {
        let properties = self.logged(BindingNode::build(inputs))?;
        Ok(self.register(name.into(), properties, NodeKind::Binding(BindingNode::new(target))))
    }

    /// Destroy a node; its links must be removed first
    pub fn destroy(&mut self, id: NodeId) -> Result<(), EngineError> {
        let result = match self.nodes.get(&id) {
            None => Err(EngineError::NodeNotFound(id)),
            Some(node) if self.links.involves_node(id) => Err(EngineError::NodeStillLinked {
                node: id,
                name: node.name().to_string(),
            }),
            Some(_) => Ok(()),
        };
        self.logged(result)?;

        if let Some(node) = self.nodes.shift_remove(&id) {
            self.log(LogLevel::Debug, &format!("Destroyed node '{}' ({id})", node.name()));
        }
        self.schedule.remove_node(id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Node by id
    pub fn find_node_by_id(&self, id: NodeId) -> Option<&LogicNode> {
        self.nodes.get(&id)
    }

    /// First node (in creation order) with the given name
    pub fn find_node_by_name(&self, name: &str) -> Option<&LogicNode> {
        self.nodes.values().find(|n| n.name() == name)
    }

    /// All nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &LogicNode> {
        self.nodes.values()
    }

    /// Nodes of one kind in creation order
    pub fn nodes_of_kind(&self, kind: NodeKindTag) -> impl Iterator<Item = &LogicNode> {
        self.nodes.values().filter(move |n| n.kind_tag() == kind)
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Animation state of an animation node
    pub fn animation(&self, id: NodeId) -> Option<&AnimationNode> {
        match self.nodes.get(&id)?.kind() {
            NodeKind::Animation(animation) => Some(animation),
            _ => None,
        }
    }

    /// Attach a host correlation id to a node
    pub fn set_user_id(&mut self, id: NodeId, user_id: Option<Uuid>) -> Result<(), EngineError> {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.set_user_id(user_id);
                Ok(())
            }
            None => self.logged(Err(EngineError::NodeNotFound(id))),
        }
    }

    // ------------------------------------------------------------------
    // Property access
    // ------------------------------------------------------------------

    fn tree(&self, node: NodeId) -> Option<&PropertyTree> {
        self.nodes.get(&node).map(LogicNode::properties)
    }

    /// Input root of a node
    pub fn inputs(&self, node: NodeId) -> Option<PropertyRef> {
        let root = self.tree(node)?.input_root()?;
        Some(PropertyRef::new(node, root))
    }

    /// Output root of a node
    pub fn outputs(&self, node: NodeId) -> Option<PropertyRef> {
        let root = self.tree(node)?.output_root()?;
        Some(PropertyRef::new(node, root))
    }

    /// Input by dotted path below the input root
    pub fn input(&self, node: NodeId, path: &str) -> Option<PropertyRef> {
        let inputs = self.inputs(node)?;
        let slot = self.tree(node)?.resolve(inputs.slot, path)?;
        Some(PropertyRef::new(node, slot))
    }

    /// Output by dotted path below the output root
    pub fn output(&self, node: NodeId, path: &str) -> Option<PropertyRef> {
        let outputs = self.outputs(node)?;
        let slot = self.tree(node)?.resolve(outputs.slot, path)?;
        Some(PropertyRef::new(node, slot))
    }

    /// Child of a struct or array by position
    pub fn child(&self, property: PropertyRef, index: usize) -> Option<PropertyRef> {
        let slot = self.tree(property.node)?.child(property.slot, index)?;
        Some(PropertyRef::new(property.node, slot))
    }

    /// Child of a struct by name
    pub fn child_by_name(&self, property: PropertyRef, name: &str) -> Option<PropertyRef> {
        let slot = self.tree(property.node)?.child_by_name(property.slot, name)?;
        Some(PropertyRef::new(property.node, slot))
    }

    /// Number of children of a struct or array
    pub fn child_count(&self, property: PropertyRef) -> usize {
        self.tree(property.node)
            .map_or(0, |tree| tree.child_count(property.slot))
    }

    /// Property type
    pub fn property_type(&self, property: PropertyRef) -> Option<PropertyType> {
        self.tree(property.node)?.property_type(property.slot)
    }

    /// Value of a primitive property
    pub fn get(&self, property: PropertyRef) -> Option<&PropertyValue> {
        self.tree(property.node)?.value(property.slot)
    }

    /// `node:path` description of a property for messages
    pub fn describe(&self, property: PropertyRef) -> String {
        match self.nodes.get(&property.node) {
            Some(node) if node.properties().contains(property.slot) => {
                format!("{}:{}", node.name(), node.properties().path(property.slot))
            }
            _ => format!("{property:?}"),
        }
    }

    /// Write an unlinked primitive input
    pub fn set(&mut self, property: PropertyRef, value: impl Into<PropertyValue>) -> Result<(), PropertyError> {
        let result = self.set_value(property, value.into());
        self.logged(result)
    }

    fn set_value(&mut self, property: PropertyRef, value: PropertyValue) -> Result<(), PropertyError> {
        let node = self
            .nodes
            .get_mut(&property.node)
            .ok_or(PropertyError::NodeNotFound(property.node))?;
        let tree = node.properties();
        let direction = tree
            .direction(property.slot)
            .ok_or_else(|| PropertyError::NotFound(format!("{property:?}")))?;
        if direction == Direction::Output {
            return Err(PropertyError::NotAnInput(tree.path(property.slot)));
        }
        if tree.is_linked_input(property.slot) {
            return Err(PropertyError::LinkedInput(tree.path(property.slot)));
        }
        if node.properties_mut().write_external(property.slot, value)? {
            node.mark_dirty();
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------

    /// Link an output to an input; the input's node runs after the output's
    pub fn link(&mut self, source: PropertyRef, target: PropertyRef) -> Result<(), LinkError> {
        let result = self.link_with(source, target, LinkStrength::Strong);
        self.logged(result)
    }

    /// Link an output to an input without ordering the nodes
    pub fn link_weak(&mut self, source: PropertyRef, target: PropertyRef) -> Result<(), LinkError> {
        let result = self.link_with(source, target, LinkStrength::Weak);
        self.logged(result)
    }

    pub(crate) fn link_with(
        &mut self,
        source: PropertyRef,
        target: PropertyRef,
        strength: LinkStrength,
    ) -> Result<(), LinkError> {
        self.check_link(source, target, strength)?;

        self.links.insert(Link { source, target, strength });
        if let Some(node) = self.nodes.get_mut(&target.node) {
            node.properties_mut().set_linked(target.slot, true);
        }
        match strength {
            LinkStrength::Strong => self.schedule.add_edge(source.node, target.node),
            LinkStrength::Weak => self.schedule.invalidate(),
        }
        self.log(
            LogLevel::Debug,
            &format!("Linked '{}' to '{}' ({strength:?})", self.describe(source), self.describe(target)),
        );
        Ok(())
    }

    fn check_link(&self, source: PropertyRef, target: PropertyRef, strength: LinkStrength) -> Result<(), LinkError> {
        let source_node = self
            .nodes
            .get(&source.node)
            .ok_or(LinkError::NodeNotFound(source.node))?;
        let target_node = self
            .nodes
            .get(&target.node)
            .ok_or(LinkError::NodeNotFound(target.node))?;
        let source_tree = source_node.properties();
        let target_tree = target_node.properties();
        let (Some(source_spec), Some(target_spec)) = (source_tree.spec(source.slot), target_tree.spec(target.slot))
        else {
            let missing = if source_tree.contains(source.slot) { target } else { source };
            return Err(LinkError::PropertyNotFound(missing));
        };

        if source.node == target.node {
            return Err(LinkError::SameNode(source_node.name().to_string()));
        }
        if source_tree.direction(source.slot) != Some(Direction::Output)
            || target_tree.direction(target.slot) != Some(Direction::Input)
        {
            return Err(LinkError::Direction {
                output: self.describe(source),
                input: self.describe(target),
            });
        }
        if !source_spec.same_shape(&target_spec) {
            return Err(LinkError::TypeMismatch {
                output: self.describe(source),
                output_type: source_spec.property_type,
                input: self.describe(target),
                input_type: target_spec.property_type,
            });
        }
        if target_tree.is_linked_input(target.slot) || target_tree.subtree_linked(target.slot) {
            return Err(LinkError::AlreadyLinked(self.describe(target)));
        }
        if strength == LinkStrength::Strong
            && self.schedule.graph().would_create_cycle(source.node, target.node)
        {
            return Err(LinkError::WouldCreateCycle {
                output: self.describe(source),
                input: self.describe(target),
            });
        }
        Ok(())
    }

    /// Remove the link `source -> target`
    pub fn unlink(&mut self, source: PropertyRef, target: PropertyRef) -> Result<(), LinkError> {
        let Some(link) = self.links.remove(source, target) else {
            let err = LinkError::NotLinked {
                output: self.describe(source),
                input: self.describe(target),
            };
            return self.logged(Err(err));
        };

        if let Some(node) = self.nodes.get_mut(&target.node) {
            node.properties_mut().set_linked(target.slot, false);
        }
        match link.strength {
            LinkStrength::Strong => self.schedule.remove_edge(source.node, target.node),
            LinkStrength::Weak => self.schedule.invalidate(),
        }
        self.log(
            LogLevel::Debug,
            &format!("Unlinked '{}' from '{}'", self.describe(source), self.describe(target)),
        );
        Ok(())
    }

    /// Whether any property of the node takes part in a link
    pub fn is_linked(&self, node: NodeId) -> bool {
        self.links.involves_node(node)
    }

    /// Incoming link of an input
    pub fn incoming_link(&self, target: PropertyRef) -> Option<&Link> {
        self.links.incoming(target)
    }

    /// All links in creation order
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    /// Number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    // ------------------------------------------------------------------
    // Scheduling and update
    // ------------------------------------------------------------------

    /// Whether the execution order must be recomputed
    pub fn schedule_state(&self) -> ScheduleState {
        self.schedule.state()
    }

    /// Execution order, recomputed if links or nodes changed
    pub fn execution_order(&mut self) -> Result<Vec<NodeId>, UpdateError> {
        match self.schedule.order() {
            Some(order) => Ok(order.to_vec()),
            None => self.logged(Err(UpdateError::CycleDetected)),
        }
    }

    /// Report of the most recent update, if reports are enabled
    pub fn last_update_report(&self) -> Option<&UpdateReport> {
        self.last_report.as_ref()
    }

    /// Run every node that needs it, in execution order, propagating values along links.
    ///
    /// The first failing node aborts the update; values written before the
    /// failure stay applied.
    pub fn update(&mut self) -> Result<(), UpdateError> {
        let start = Instant::now();
        let sort_time = if self.schedule.state() == ScheduleState::Dirty {
            let sort_start = Instant::now();
            self.execution_order()?;
            sort_start.elapsed()
        } else {
            Duration::ZERO
        };
        let order = self.execution_order()?;

        let mut report = UpdateReport {
            sort_time,
            ..Default::default()
        };
        let skip_clean = self.config.skip_clean_nodes;

        for id in order {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            if node.needs_update(skip_clean) {
                let node_start = Instant::now();
                if let Err(err) = node.update() {
                    let error = UpdateError::Runtime {
                        node: id,
                        name: node.name().to_string(),
                        message: err.message,
                    };
                    return self.logged(Err(error));
                }
                report.executed.push((id, node_start.elapsed()));
            } else {
                report.skipped.push(id);
            }
            report.link_activations += match self.propagate(id) {
                Ok(activations) => activations,
                Err(err) => return self.logged(Err(err)),
            };
        }
        report.total_time = start.elapsed();

        self.log(
            LogLevel::Trace,
            &format!(
                "Update ran {} nodes, skipped {}, {} link activations",
                report.executed.len(),
                report.skipped.len(),
                report.link_activations
            ),
        );
        if self.config.statistics_interval > 0 {
            self.statistics
                .record(report.total_time, report.executed.len(), report.link_activations);
            if self.statistics.updates() >= self.config.statistics_interval {
                let summary = self.statistics.flush();
                self.log(LogLevel::Info, &summary);
            }
        }
        self.last_report = self.config.update_report.then_some(report);
        Ok(())
    }

    /// Copy changed (or never transferred) outputs of `id` along its links and
    /// consume the node's output change flags. Returns the number of links
    /// whose target received a new value.
    fn propagate(&mut self, id: NodeId) -> Result<usize, UpdateError> {
        let Some(node) = self.nodes.get(&id) else {
            return Ok(0);
        };
        let tree = node.properties();
        let transfers: Vec<(Link, Vec<PropertyValue>)> = self
            .links
            .outgoing(id)
            .into_iter()
            .filter(|link| tree.is_changed(link.source.slot) || self.links.is_pending(link.target))
            .map(|link| {
                let values = tree
                    .leaves(link.source.slot)
                    .into_iter()
                    .filter_map(|slot| tree.value(slot).cloned())
                    .collect();
                (link, values)
            })
            .collect();

        if let Some(node) = self.nodes.get_mut(&id) {
            if let Some(root) = node.properties().output_root() {
                node.properties_mut().take_changed(root);
            }
        }

        let mut activations = 0;
        for (link, values) in transfers {
            self.links.clear_pending(link.target);
            let Some(target) = self.nodes.get_mut(&link.target.node) else {
                continue;
            };
            let leaves = target.properties().leaves(link.target.slot);
            if leaves.len() != values.len() {
                return Err(propagation_error(&link, target, "source and target shapes differ".into()));
            }
            let mut changed = false;
            for (slot, value) in leaves.into_iter().zip(values) {
                match target.properties_mut().write(slot, value) {
                    Ok(written) => changed |= written,
                    Err(err) => {
                        if changed {
                            target.mark_dirty();
                        }
                        return Err(propagation_error(&link, target, err.to_string()));
                    }
                }
            }
            if changed {
                target.mark_dirty();
                activations += 1;
            }
        }
        Ok(activations)
    }
}

fn propagation_error(link: &Link, target: &LogicNode, message: String) -> UpdateError {
    UpdateError::Propagation {
        link: format!("{} -> {}", link.source.node, target.properties().path(link.target.slot)),
        node: target.id(),
        name: target.name().to_string(),
        message,
    }
}

impl Default for LogicEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for LogicEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicEngine")
            .field("config", &self.config)
            .field("nodes", &self.nodes.len())
            .field("links", &self.links.len())
            .field("schedule", &self.schedule.state())
            .finish_non_exhaustive()
    }
}
