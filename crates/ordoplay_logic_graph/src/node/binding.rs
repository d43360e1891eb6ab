// SPDX-License-Identifier: MIT OR Apache-2.0
//! Binding nodes forward their inputs to an external object.

use crate::error::{NodeCreationError, NodeError};
use crate::property::{validate_fields, PropertySpec, PropertyTree, INPUT_ROOT};
use crate::value::{PropertyType, PropertyValue};

/// New value for one bound property
#[derive(Debug, Clone, PartialEq)]
pub enum BindingValue {
    /// A primitive property
    Value(PropertyValue),
    /// A whole array of primitives, delivered at once
    Array(Vec<PropertyValue>),
}

/// Change delivered to a [`BindingTarget`]
#[derive(Debug, Clone, PartialEq)]
pub struct BindingUpdate {
    /// Dotted path relative to the input root
    pub path: String,
    /// New value
    pub value: BindingValue,
}

/// External object driven by a binding node
pub trait BindingTarget {
    /// Apply one changed input
    fn apply(&mut self, update: BindingUpdate) -> Result<(), NodeError>;
}

/// State of a binding node
pub struct BindingNode {
    target: Box<dyn BindingTarget>,
}

impl BindingNode {
    /// Validate the input declaration and build the node's property tree.
    ///
    /// Every external write to a binding input is forwarded, even when it
    /// stores an equal value.
    pub fn build(inputs: &[PropertySpec]) -> Result<PropertyTree, NodeCreationError> {
        validate_fields(INPUT_ROOT, inputs).map_err(NodeCreationError::InvalidInterface)?;
        Ok(PropertyTree::new(Some(inputs), None).flag_every_write())
    }

    /// Create a binding node state
    pub fn new(target: Box<dyn BindingTarget>) -> Self {
        Self { target }
    }

    pub(crate) fn update(&mut self, properties: &mut PropertyTree) -> Result<(), NodeError> {
        let Some(root) = properties.input_root() else {
            return Ok(());
        };
        let mut updates = Vec::new();
        collect_updates(properties, root, &mut updates);
        // A flag is consumed only once its value reached the target, so a
        // failed apply is retried with every undelivered value.
        for (slot, update) in updates {
            self.target.apply(update)?;
            properties.take_changed(slot);
        }
        properties.take_changed(root);
        Ok(())
    }
}

impl std::fmt::Debug for BindingNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingNode").finish_non_exhaustive()
    }
}

fn relative_path(properties: &PropertyTree, slot: usize) -> String {
    let path = properties.path(slot);
    match path.strip_prefix(INPUT_ROOT).and_then(|p| p.strip_prefix('.')) {
        Some(relative) => relative.to_string(),
        None => path,
    }
}

fn collect_updates(properties: &PropertyTree, slot: usize, out: &mut Vec<(usize, BindingUpdate)>) {
    let Some(property_type) = properties.property_type(slot) else {
        return;
    };
    let children: Vec<usize> = (0..properties.child_count(slot))
        .filter_map(|i| properties.child(slot, i))
        .collect();
    let primitive_array = property_type == PropertyType::Array
        && children
            .iter()
            .all(|&c| properties.property_type(c).is_some_and(|t| t.is_primitive()));

    if property_type.is_primitive() || primitive_array {
        if !properties.is_changed(slot) {
            return;
        }
        let value = if primitive_array {
            BindingValue::Array(
                children
                    .iter()
                    .filter_map(|&c| properties.value(c).cloned())
                    .collect(),
            )
        } else {
            match properties.value(slot) {
                Some(value) => BindingValue::Value(value.clone()),
                None => return,
            }
        };
        out.push((
            slot,
            BindingUpdate {
                path: relative_path(properties, slot),
                value,
            },
        ));
        return;
    }

    for child in children {
        collect_updates(properties, child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Recorder(Rc<RefCell<Vec<BindingUpdate>>>);

    impl BindingTarget for Recorder {
        fn apply(&mut self, update: BindingUpdate) -> Result<(), NodeError> {
            self.0.borrow_mut().push(update);
            Ok(())
        }
    }

    fn inputs() -> Vec<PropertySpec> {
        vec![
            PropertySpec::primitive("visible", PropertyType::Bool),
            PropertySpec::structure(
                "transform",
                [PropertySpec::primitive("scale", PropertyType::Vec3f)],
            ),
            PropertySpec::array("weights", 3, PropertySpec::primitive("", PropertyType::Float)),
        ]
    }

    #[test]
    fn test_forwards_changed_inputs_only() {
        let mut tree = BindingNode::build(&inputs()).unwrap();
        let recorder = Recorder::default();
        let mut binding = BindingNode::new(Box::new(recorder.clone()));

        let root = tree.input_root().unwrap();
        let scale = tree.resolve(root, "transform.scale").unwrap();
        tree.write(scale, PropertyValue::Vec3f([2.0; 3])).unwrap();
        binding.update(&mut tree).unwrap();

        assert_eq!(
            *recorder.0.borrow(),
            vec![BindingUpdate {
                path: "transform.scale".into(),
                value: BindingValue::Value(PropertyValue::Vec3f([2.0; 3])),
            }]
        );

        binding.update(&mut tree).unwrap();
        assert_eq!(recorder.0.borrow().len(), 1);
    }

    #[test]
    fn test_array_delivered_whole() {
        let mut tree = BindingNode::build(&inputs()).unwrap();
        let recorder = Recorder::default();
        let mut binding = BindingNode::new(Box::new(recorder.clone()));

        let element = tree.resolve(tree.input_root().unwrap(), "weights.1").unwrap();
        tree.write(element, PropertyValue::Float(0.5)).unwrap();
        binding.update(&mut tree).unwrap();

        let updates = recorder.0.borrow();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].path, "weights");
        assert_eq!(
            updates[0].value,
            BindingValue::Array(vec![
                PropertyValue::Float(0.0),
                PropertyValue::Float(0.5),
                PropertyValue::Float(0.0),
            ])
        );
    }

    /// Rejects the first update it sees, then records like [`Recorder`]
    #[derive(Default, Clone)]
    struct FailsOnce {
        failed: Rc<RefCell<bool>>,
        recorder: Recorder,
    }

    impl BindingTarget for FailsOnce {
        fn apply(&mut self, update: BindingUpdate) -> Result<(), NodeError> {
            if !self.failed.replace(true) {
                return Err(NodeError::new("target busy"));
            }
            self.recorder.apply(update)
        }
    }

    #[test]
    fn test_failed_apply_keeps_values_for_retry() {
        let mut tree = BindingNode::build(&inputs()).unwrap();
        let target = FailsOnce::default();
        let mut binding = BindingNode::new(Box::new(target.clone()));

        let root = tree.input_root().unwrap();
        let visible = tree.resolve(root, "visible").unwrap();
        let scale = tree.resolve(root, "transform.scale").unwrap();
        tree.write(visible, PropertyValue::Bool(true)).unwrap();
        tree.write(scale, PropertyValue::Vec3f([3.0; 3])).unwrap();

        assert!(binding.update(&mut tree).is_err());
        assert!(target.recorder.0.borrow().is_empty());
        assert!(tree.is_changed(root));

        binding.update(&mut tree).unwrap();
        assert_eq!(
            *target.recorder.0.borrow(),
            vec![
                BindingUpdate {
                    path: "visible".into(),
                    value: BindingValue::Value(PropertyValue::Bool(true)),
                },
                BindingUpdate {
                    path: "transform.scale".into(),
                    value: BindingValue::Value(PropertyValue::Vec3f([3.0; 3])),
                },
            ]
        );
        assert!(!tree.is_changed(root));
    }

    #[test]
    fn test_equal_write_still_forwarded() {
        let mut tree = BindingNode::build(&inputs()).unwrap();
        let recorder = Recorder::default();
        let mut binding = BindingNode::new(Box::new(recorder.clone()));

        let visible = tree.resolve(tree.input_root().unwrap(), "visible").unwrap();
        tree.write_external(visible, PropertyValue::Bool(false)).unwrap();
        binding.update(&mut tree).unwrap();
        assert_eq!(recorder.0.borrow().len(), 1);
    }
}
