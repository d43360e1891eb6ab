// SPDX-License-Identifier: MIT OR Apache-2.0
//! Logic nodes and their kinds.
//!
//! Every node owns a [`PropertyTree`] and kind-specific state. Kinds form a
//! closed set; the only open extension points are the trait objects supplied
//! by the host (script bodies, binding targets and anchor projectors).

mod anchor;
mod animation;
mod binding;
mod io;
mod script;
mod timer;

pub use anchor::{AnchorNode, AnchorProjector, Projection};
pub use animation::{AnimationNode, AnimationNodeConfig, AnimationTiming};
pub use binding::{BindingNode, BindingTarget, BindingUpdate, BindingValue};
pub use io::NodeIo;
pub use script::{logic_fn, LogicFunction, ScriptInterface, ScriptNode};
pub use timer::TimerNode;

use crate::error::NodeError;
use crate::property::PropertyTree;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node, assigned in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node kind without its state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKindTag {
    /// Host-supplied update body
    Script,
    /// Keyframe animation
    Animation,
    /// Clock source
    Timer,
    /// Projected position of an external object
    Anchor,
    /// Forwards inputs to an external object
    Binding,
}

impl NodeKindTag {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Script => "Script",
            Self::Animation => "Animation",
            Self::Timer => "Timer",
            Self::Anchor => "Anchor",
            Self::Binding => "Binding",
        }
    }
}

impl std::fmt::Display for NodeKindTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind-specific state of a node
#[derive(Debug)]
pub enum NodeKind {
    /// Script node
    Script(ScriptNode),
    /// Animation node
    Animation(AnimationNode),
    /// Timer node
    Timer(TimerNode),
    /// Anchor node
    Anchor(AnchorNode),
    /// Binding node
    Binding(BindingNode),
}

impl NodeKind {
    /// Get the kind tag
    pub fn tag(&self) -> NodeKindTag {
        match self {
            Self::Script(_) => NodeKindTag::Script,
            Self::Animation(_) => NodeKindTag::Animation,
            Self::Timer(_) => NodeKindTag::Timer,
            Self::Anchor(_) => NodeKindTag::Anchor,
            Self::Binding(_) => NodeKindTag::Binding,
        }
    }

    /// Nodes that produce new outputs every tick, whether or not inputs changed
    pub fn always_updates(&self) -> bool {
        match self {
            Self::Timer(_) | Self::Anchor(_) => true,
            Self::Animation(animation) => animation.timing() == AnimationTiming::SelfDriven,
            Self::Script(_) | Self::Binding(_) => false,
        }
    }

    fn update(&mut self, properties: &mut PropertyTree) -> Result<(), NodeError> {
        match self {
            Self::Script(script) => script.update(properties),
            Self::Animation(animation) => animation.update(properties),
            Self::Timer(timer) => timer.update(properties),
            Self::Anchor(anchor) => anchor.update(properties),
            Self::Binding(binding) => binding.update(properties),
        }
    }
}

/// A node registered in the engine
#[derive(Debug)]
pub struct LogicNode {
    id: NodeId,
    name: String,
    user_id: Option<Uuid>,
    properties: PropertyTree,
    kind: NodeKind,
    dirty: bool,
}

impl LogicNode {
    /// New nodes start dirty so their first update always runs
    pub(crate) fn new(id: NodeId, name: String, properties: PropertyTree, kind: NodeKind) -> Self {
        Self {
            id,
            name,
            user_id: None,
            properties,
            kind,
            dirty: true,
        }
    }

    /// Node id
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Node name (not necessarily unique)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Host-assigned correlation id
    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub(crate) fn set_user_id(&mut self, user_id: Option<Uuid>) {
        self.user_id = user_id;
    }

    /// Property tree of the node
    pub fn properties(&self) -> &PropertyTree {
        &self.properties
    }

    pub(crate) fn properties_mut(&mut self) -> &mut PropertyTree {
        &mut self.properties
    }

    /// Kind-specific state
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Kind tag
    pub fn kind_tag(&self) -> NodeKindTag {
        self.kind.tag()
    }

    /// Whether an input changed since the node last ran
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether `update` must run this tick
    pub(crate) fn needs_update(&self, skip_clean: bool) -> bool {
        !skip_clean || self.dirty || self.kind.always_updates()
    }

    /// Run the node's update and clear its dirty flag on success
    pub(crate) fn update(&mut self) -> Result<(), NodeError> {
        self.kind.update(&mut self.properties)?;
        self.dirty = false;
        Ok(())
    }
}
