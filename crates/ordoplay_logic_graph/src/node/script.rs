// SPDX-License-Identifier: MIT OR Apache-2.0
//! Script nodes: a declared property interface plus a host-supplied body.

use super::io::NodeIo;
use crate::error::{NodeCreationError, NodeError};
use crate::property::{validate_fields, PropertySpec, PropertyTree, INPUT_ROOT, OUTPUT_ROOT};
use serde::{Deserialize, Serialize};

/// Update body of a script node.
///
/// Closures of the form `FnMut(&mut NodeIo) -> Result<(), NodeError>` implement
/// this trait; [`logic_fn`] helps the compiler infer their signature.
pub trait LogicFunction {
    /// Compute outputs from inputs
    fn run(&mut self, io: &mut NodeIo<'_>) -> Result<(), NodeError>;
}

impl<F> LogicFunction for F
where
    F: FnMut(&mut NodeIo<'_>) -> Result<(), NodeError>,
{
    fn run(&mut self, io: &mut NodeIo<'_>) -> Result<(), NodeError> {
        self(io)
    }
}

/// Box a closure as a script body
pub fn logic_fn<F>(body: F) -> Box<dyn LogicFunction>
where
    F: FnMut(&mut NodeIo<'_>) -> Result<(), NodeError> + 'static,
{
    Box::new(body)
}

/// Declared inputs and outputs of a script
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScriptInterface {
    /// Fields of the input root
    pub inputs: Vec<PropertySpec>,
    /// Fields of the output root
    pub outputs: Vec<PropertySpec>,
}

impl ScriptInterface {
    /// Create an interface from input and output fields
    pub fn new(
        inputs: impl IntoIterator<Item = PropertySpec>,
        outputs: impl IntoIterator<Item = PropertySpec>,
    ) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
            outputs: outputs.into_iter().collect(),
        }
    }

    /// Validate the declaration and build the node's property tree
    pub fn build(&self) -> Result<PropertyTree, NodeCreationError> {
        validate_fields(INPUT_ROOT, &self.inputs).map_err(NodeCreationError::InvalidInterface)?;
        validate_fields(OUTPUT_ROOT, &self.outputs).map_err(NodeCreationError::InvalidInterface)?;
        Ok(PropertyTree::new(Some(&self.inputs), Some(&self.outputs)))
    }
}

/// State of a script node
pub struct ScriptNode {
    interface: ScriptInterface,
    body: Box<dyn LogicFunction>,
}

impl ScriptNode {
    /// Create a script node state
    pub fn new(interface: ScriptInterface, body: Box<dyn LogicFunction>) -> Self {
        Self { interface, body }
    }

    /// Declared interface
    pub fn interface(&self) -> &ScriptInterface {
        &self.interface
    }

    pub(crate) fn update(&mut self, properties: &mut PropertyTree) -> Result<(), NodeError> {
        self.body.run(&mut NodeIo::new(properties))?;
        // Inputs count as consumed once the body has seen them
        if let Some(root) = properties.input_root() {
            properties.take_changed(root);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ScriptNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptNode")
            .field("interface", &self.interface)
            .finish_non_exhaustive()
    }
}
