// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the logic graph.

use crate::node::{NodeId, NodeKindTag};
use crate::property::PropertyRef;
use crate::value::PropertyType;
use ordoplay_logic_animation::ChannelError;

/// Error when reading or writing a property
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Property not found
    #[error("Property not found: {0}")]
    NotFound(String),

    /// Value type differs from the property type
    #[error("Type mismatch on '{path}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// Property path
        path: String,
        /// Type of the property
        expected: PropertyType,
        /// Type of the rejected value
        actual: PropertyType,
    },

    /// Struct and array properties hold no value of their own
    #[error("Property '{0}' is a struct or array and holds no value")]
    NotPrimitive(String),

    /// Outputs are written by their node only
    #[error("Property '{0}' is an output and can only be written by its node")]
    NotAnInput(String),

    /// Inputs are written by the caller or a link only
    #[error("Property '{0}' is an input and can not be written by its node")]
    NotAnOutput(String),

    /// Linked inputs only receive values through their link
    #[error("Property '{0}' is linked and can not be set directly")]
    LinkedInput(String),
}

/// Error when creating or removing a link
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinkError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Property not found
    #[error("Property not found: {0:?}")]
    PropertyNotFound(PropertyRef),

    /// Output and input belong to the same node
    #[error("Output and input belong to the same node '{0}'")]
    SameNode(String),

    /// Only outputs can be linked to inputs
    #[error("Failed to link '{output}' to '{input}': only outputs can be linked to inputs")]
    Direction {
        /// Path of the property used as link source
        output: String,
        /// Path of the property used as link target
        input: String,
    },

    /// Types (or struct/array shapes) differ
    #[error("Types of output '{output}:{output_type}' and input '{input}:{input_type}' do not match")]
    TypeMismatch {
        /// Output path
        output: String,
        /// Output type
        output_type: PropertyType,
        /// Input path
        input: String,
        /// Input type
        input_type: PropertyType,
    },

    /// Input already has an incoming link
    #[error("Input '{0}' is already linked")]
    AlreadyLinked(String),

    /// Strong link would close a dependency cycle
    #[error("Linking '{output}' to '{input}' would create a dependency cycle")]
    WouldCreateCycle {
        /// Output path
        output: String,
        /// Input path
        input: String,
    },

    /// No such link exists
    #[error("No link from '{output}' to '{input}'")]
    NotLinked {
        /// Output path
        output: String,
        /// Input path
        input: String,
    },
}

/// Error when creating a node
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NodeCreationError {
    /// Property interface is malformed
    #[error("Invalid property interface: {0}")]
    InvalidInterface(String),

    /// Channel data rejected
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// Animation without channels
    #[error("Animation '{0}' needs at least one channel")]
    NoChannels(String),

    /// Two channels share a name
    #[error("Duplicate channel name '{0}'")]
    DuplicateChannel(String),

    /// Channel name collides with a built-in output
    #[error("Channel name '{0}' is reserved")]
    ReservedChannelName(String),
}

/// Error when destroying a node
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Links must be removed before the node is destroyed
    #[error("Node '{name}' ({node}) still has links")]
    NodeStillLinked {
        /// Node id
        node: NodeId,
        /// Node name
        name: String,
    },
}

/// Failure reported by a node's update body
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct NodeError {
    /// Human readable message
    pub message: String,
}

impl NodeError {
    /// Create a node error
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<PropertyError> for NodeError {
    fn from(err: PropertyError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<String> for NodeError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for NodeError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Error during `update()`
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UpdateError {
    /// A node's update failed; the tick was aborted after it
    #[error("Node '{name}' ({node}) failed to update: {message}")]
    Runtime {
        /// Failing node
        node: NodeId,
        /// Failing node name
        name: String,
        /// Message reported by the node
        message: String,
    },

    /// A linked value could not be written into its target
    #[error("Failed to propagate {link} into node '{name}' ({node}): {message}")]
    Propagation {
        /// Link being transferred, as `source -> target`
        link: String,
        /// Target node
        node: NodeId,
        /// Target node name
        name: String,
        /// Write error
        message: String,
    },

    /// Strong links contain a cycle
    #[error("Failed to sort logic nodes: strong links contain a cycle")]
    CycleDetected,
}

/// Error when saving or restoring a snapshot
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// RON serialization failed
    #[error("Failed to serialize snapshot: {0}")]
    Serialize(#[from] ron::Error),

    /// RON parsing failed
    #[error("Failed to parse snapshot: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Snapshot written by an incompatible version
    #[error("Unsupported snapshot format version {0}")]
    UnsupportedVersion(u32),

    /// Two nodes share an id
    #[error("Duplicate node id {0}")]
    DuplicateId(NodeId),

    /// Externally owned part of a node was not supplied
    #[error("No {kind:?} implementation supplied for node '{node}'")]
    Unresolved {
        /// Node name
        node: String,
        /// Node kind
        kind: NodeKindTag,
    },

    /// Stored node data is inconsistent
    #[error("Invalid data for node '{node}': {reason}")]
    InvalidNode {
        /// Node name
        node: String,
        /// What is wrong
        reason: String,
    },

    /// Node could not be recreated
    #[error(transparent)]
    Node(#[from] NodeCreationError),

    /// Link could not be recreated
    #[error(transparent)]
    Link(#[from] LinkError),
}
