// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property access handed to node update bodies.

use crate::error::PropertyError;
use crate::property::{Direction, PropertyTree, INPUT_ROOT, OUTPUT_ROOT};
use crate::value::PropertyValue;

/// Read access to a node's inputs and write access to its outputs.
///
/// Properties are addressed by dotted paths relative to the input or output
/// root, e.g. `"transform.scale"` or `"weights.2"`.
pub struct NodeIo<'a> {
    tree: &'a mut PropertyTree,
}

impl<'a> NodeIo<'a> {
    pub(crate) fn new(tree: &'a mut PropertyTree) -> Self {
        Self { tree }
    }

    fn lookup(&self, direction: Direction, path: &str) -> Result<usize, PropertyError> {
        let root_name = match direction {
            Direction::Input => INPUT_ROOT,
            Direction::Output => OUTPUT_ROOT,
        };
        self.tree
            .root(direction)
            .and_then(|root| self.tree.resolve(root, path))
            .ok_or_else(|| PropertyError::NotFound(format!("{root_name}.{path}")))
    }

    fn read(&self, direction: Direction, path: &str) -> Result<&PropertyValue, PropertyError> {
        let slot = self.lookup(direction, path)?;
        self.tree
            .value(slot)
            .ok_or_else(|| PropertyError::NotPrimitive(self.tree.path(slot)))
    }

    /// Current value of a primitive input
    pub fn input(&self, path: &str) -> Result<&PropertyValue, PropertyError> {
        self.read(Direction::Input, path)
    }

    /// Current value of a primitive output
    pub fn output(&self, path: &str) -> Result<&PropertyValue, PropertyError> {
        self.read(Direction::Output, path)
    }

    /// Number of children of a struct or array input
    pub fn input_len(&self, path: &str) -> Result<usize, PropertyError> {
        let slot = self.lookup(Direction::Input, path)?;
        Ok(self.tree.child_count(slot))
    }

    /// Write a primitive output
    pub fn set_output(&mut self, path: &str, value: impl Into<PropertyValue>) -> Result<(), PropertyError> {
        let slot = match self.lookup(Direction::Output, path) {
            Ok(slot) => slot,
            Err(err) => {
                return match self.lookup(Direction::Input, path) {
                    Ok(input) => Err(PropertyError::NotAnOutput(self.tree.path(input))),
                    Err(_) => Err(err),
                }
            }
        };
        self.tree.write(slot, value.into()).map(|_| ())
    }

    /// Whether an input (or any of its children) changed since the node last ran
    pub fn is_changed(&self, path: &str) -> Result<bool, PropertyError> {
        let slot = self.lookup(Direction::Input, path)?;
        Ok(self.tree.is_changed(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ScriptInterface;
    use crate::property::PropertySpec;
    use crate::value::PropertyType;

    fn tree() -> PropertyTree {
        ScriptInterface::new(
            [
                PropertySpec::primitive("speed", PropertyType::Float),
                PropertySpec::array("steps", 2, PropertySpec::primitive("", PropertyType::Int32)),
            ],
            [PropertySpec::primitive("label", PropertyType::String)],
        )
        .build()
        .unwrap()
    }

    #[test]
    fn test_read_inputs_write_outputs() {
        let mut tree = tree();
        let mut io = NodeIo::new(&mut tree);
        assert_eq!(io.input("speed"), Ok(&PropertyValue::Float(0.0)));
        assert_eq!(io.input_len("steps"), Ok(2));
        assert!(matches!(io.input("steps"), Err(PropertyError::NotPrimitive(_))));

        io.set_output("label", "moving").unwrap();
        assert_eq!(io.output("label").unwrap().as_str(), Some("moving"));
    }

    #[test]
    fn test_rejects_wrong_direction_and_paths() {
        let mut tree = tree();
        let mut io = NodeIo::new(&mut tree);
        assert_eq!(
            io.set_output("speed", 1.0_f32),
            Err(PropertyError::NotAnOutput("IN.speed".into()))
        );
        assert_eq!(
            io.set_output("missing", 1.0_f32),
            Err(PropertyError::NotFound("OUT.missing".into()))
        );
        assert!(matches!(
            io.set_output("label", 3_i32),
            Err(PropertyError::TypeMismatch { .. })
        ));
    }
}
