// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reactive dataflow logic runtime for `OrdoPlay`.
//!
//! This crate wires independently authored logic units into a directed graph
//! and runs them once per tick:
//! - Typed property trees (primitives, structs, fixed-length arrays)
//! - Strong and weak links from outputs to inputs
//! - Deterministic topological scheduling with dirty-node skipping
//! - Script, animation, timer, anchor and binding nodes
//!
//! ## Architecture
//!
//! The [`LogicEngine`] owns every node. Each node owns a [`PropertyTree`]
//! arena whose slots are addressed by [`PropertyRef`] handles. Links are kept
//! in a table keyed by their input; strong links also feed the node-level
//! dependency graph the execution order is sorted from. Host code plugs in
//! through [`LogicFunction`], [`BindingTarget`], [`AnchorProjector`] and
//! [`LogSink`].

pub mod config;
pub mod engine;
pub mod error;
pub mod link;
pub mod log;
pub mod node;
pub mod property;
pub mod report;
pub mod schedule;
pub mod snapshot;
pub mod validation;
pub mod value;

pub use config::EngineConfig;
pub use engine::LogicEngine;
pub use error::{
    EngineError, LinkError, NodeCreationError, NodeError, PropertyError, SnapshotError, UpdateError,
};
pub use link::{Link, LinkStrength};
pub use log::{LogLevel, LogSink, TracingSink};
pub use node::{
    logic_fn, AnchorProjector, AnimationNode, AnimationNodeConfig, AnimationTiming, BindingTarget,
    BindingUpdate, BindingValue, LogicFunction, LogicNode, NodeId, NodeIo, NodeKind, NodeKindTag,
    Projection, ScriptInterface,
};
pub use property::{Direction, PropertyRef, PropertySnapshot, PropertySpec, PropertyTree};
pub use report::UpdateReport;
pub use schedule::ScheduleState;
pub use snapshot::{GraphSnapshot, NoResolver, NodeSnapshot, NodeState, SnapshotResolver};
pub use validation::ValidationWarning;
pub use value::{PropertyType, PropertyValue};

pub use ordoplay_logic_animation as animation;
