// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed property trees owned by logic nodes.
//!
//! Every node owns one [`PropertyTree`]: an arena of slots holding an optional
//! input root (`IN`) and an optional output root (`OUT`). Slots are addressed
//! by their index, which is stable for the lifetime of the node and across
//! snapshots because trees are always built in declaration order.

use crate::error::PropertyError;
use crate::node::NodeId;
use crate::value::{PropertyType, PropertyValue};
use serde::{Deserialize, Serialize};

/// Name of the input root property
pub const INPUT_ROOT: &str = "IN";
/// Name of the output root property
pub const OUTPUT_ROOT: &str = "OUT";

/// Whether a property is written by the caller (input) or by its node (output)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Written by the caller or an incoming link
    Input,
    /// Written by the owning node's update
    Output,
}

/// Handle to a property of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyRef {
    /// Owning node
    pub node: NodeId,
    /// Slot index inside the node's property tree
    pub slot: usize,
}

impl PropertyRef {
    /// Create a property handle
    pub fn new(node: NodeId, slot: usize) -> Self {
        Self { node, slot }
    }
}

/// Declaration of a property and its children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    /// Property name (empty for array elements)
    pub name: String,
    /// Property type
    pub property_type: PropertyType,
    /// Children of structs and arrays
    #[serde(default)]
    pub children: Vec<PropertySpec>,
}

impl PropertySpec {
    /// Declare a primitive property
    pub fn primitive(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            children: Vec::new(),
        }
    }

    /// Declare a struct with ordered, named children
    pub fn structure(name: impl Into<String>, children: impl IntoIterator<Item = PropertySpec>) -> Self {
        Self {
            name: name.into(),
            property_type: PropertyType::Struct,
            children: children.into_iter().collect(),
        }
    }

    /// Declare a fixed-length array of `len` copies of `element`
    pub fn array(name: impl Into<String>, len: usize, element: PropertySpec) -> Self {
        let element = PropertySpec {
            name: String::new(),
            ..element
        };
        Self {
            name: name.into(),
            property_type: PropertyType::Array,
            children: vec![element; len],
        }
    }

    /// Check that the declaration describes a well-formed tree
    pub fn validate(&self) -> Result<(), String> {
        match self.property_type {
            PropertyType::Struct => validate_fields(&self.name, &self.children),
            PropertyType::Array => {
                let Some(first) = self.children.first() else {
                    return Err(format!("array '{}' must have at least one element", self.name));
                };
                if self.children.iter().any(|c| !c.name.is_empty()) {
                    return Err(format!("elements of array '{}' must be anonymous", self.name));
                }
                if self.children.iter().any(|c| !c.same_shape(first)) {
                    return Err(format!("elements of array '{}' must share one type", self.name));
                }
                first.validate()
            }
            _ if !self.children.is_empty() => {
                Err(format!("primitive property '{}' can not have children", self.name))
            }
            _ => Ok(()),
        }
    }

    /// Whether both declarations have the same type structure (own names ignored)
    pub fn same_shape(&self, other: &PropertySpec) -> bool {
        self.property_type == other.property_type
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.name == b.name && a.same_shape(b))
    }
}

/// Validate the named fields of a struct (or of a root interface)
pub(crate) fn validate_fields(owner: &str, fields: &[PropertySpec]) -> Result<(), String> {
    for (i, field) in fields.iter().enumerate() {
        if field.name.is_empty() {
            return Err(format!("field {i} of '{owner}' has no name"));
        }
        if field.name.contains('.') {
            return Err(format!("field name '{}' must not contain '.'", field.name));
        }
        if fields[..i].iter().any(|f| f.name == field.name) {
            return Err(format!("duplicate field '{}' in '{owner}'", field.name));
        }
        field.validate()?;
    }
    Ok(())
}

/// Stored state of a property subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    /// Property name
    pub name: String,
    /// Property type
    pub property_type: PropertyType,
    /// Value of primitive properties
    #[serde(default)]
    pub value: Option<PropertyValue>,
    /// Children of structs and arrays
    #[serde(default)]
    pub children: Vec<PropertySnapshot>,
}

impl PropertySnapshot {
    /// Declaration describing the stored tree
    pub fn spec(&self) -> PropertySpec {
        PropertySpec {
            name: self.name.clone(),
            property_type: self.property_type,
            children: self.children.iter().map(PropertySnapshot::spec).collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    property_type: PropertyType,
    direction: Direction,
    parent: Option<usize>,
    children: Vec<usize>,
    value: Option<PropertyValue>,
    changed: bool,
    linked: bool,
}

/// Arena of all properties of one node
#[derive(Debug, Clone, Default)]
pub struct PropertyTree {
    slots: Vec<Slot>,
    input_root: Option<usize>,
    output_root: Option<usize>,
    flag_every_write: bool,
}

impl PropertyTree {
    /// Build a tree from validated field declarations
    pub(crate) fn new(inputs: Option<&[PropertySpec]>, outputs: Option<&[PropertySpec]>) -> Self {
        let mut tree = Self::default();
        if let Some(fields) = inputs {
            let root = PropertySpec::structure(INPUT_ROOT, fields.iter().cloned());
            tree.input_root = Some(tree.push(&root, Direction::Input, None));
        }
        if let Some(fields) = outputs {
            let root = PropertySpec::structure(OUTPUT_ROOT, fields.iter().cloned());
            tree.output_root = Some(tree.push(&root, Direction::Output, None));
        }
        tree
    }

    /// Binding inputs report every external write as new, even if the value is unchanged
    pub(crate) fn flag_every_write(mut self) -> Self {
        self.flag_every_write = true;
        self
    }

    fn push(&mut self, spec: &PropertySpec, direction: Direction, parent: Option<usize>) -> usize {
        let index = self.slots.len();
        self.slots.push(Slot {
            name: spec.name.clone(),
            property_type: spec.property_type,
            direction,
            parent,
            children: Vec::new(),
            value: spec.property_type.default_value(),
            changed: false,
            linked: false,
        });
        for child in &spec.children {
            let child_index = self.push(child, direction, Some(index));
            self.slots[index].children.push(child_index);
        }
        index
    }

    /// Input root slot
    pub fn input_root(&self) -> Option<usize> {
        self.input_root
    }

    /// Output root slot
    pub fn output_root(&self) -> Option<usize> {
        self.output_root
    }

    /// Root slot of the given direction
    pub fn root(&self, direction: Direction) -> Option<usize> {
        match direction {
            Direction::Input => self.input_root,
            Direction::Output => self.output_root,
        }
    }

    /// Whether `slot` exists
    pub fn contains(&self, slot: usize) -> bool {
        slot < self.slots.len()
    }

    /// Property name (empty for array elements)
    pub fn name(&self, slot: usize) -> Option<&str> {
        self.slots.get(slot).map(|s| s.name.as_str())
    }

    /// Property type
    pub fn property_type(&self, slot: usize) -> Option<PropertyType> {
        self.slots.get(slot).map(|s| s.property_type)
    }

    /// Property direction
    pub fn direction(&self, slot: usize) -> Option<Direction> {
        self.slots.get(slot).map(|s| s.direction)
    }

    /// Number of children (zero for primitives)
    pub fn child_count(&self, slot: usize) -> usize {
        self.slots.get(slot).map_or(0, |s| s.children.len())
    }

    /// Child by position, for structs and arrays
    pub fn child(&self, slot: usize, index: usize) -> Option<usize> {
        self.slots.get(slot)?.children.get(index).copied()
    }

    /// Child by name, for structs only
    pub fn child_by_name(&self, slot: usize, name: &str) -> Option<usize> {
        let parent = self.slots.get(slot)?;
        if parent.property_type != PropertyType::Struct {
            return None;
        }
        parent
            .children
            .iter()
            .copied()
            .find(|&c| self.slots[c].name == name)
    }

    /// Resolve a dotted path (`"transform.scale"`, `"items.2.x"`) below `slot`
    pub fn resolve(&self, slot: usize, path: &str) -> Option<usize> {
        if path.is_empty() {
            return self.contains(slot).then_some(slot);
        }
        path.split('.').try_fold(slot, |current, segment| {
            match self.property_type(current)? {
                PropertyType::Array => self.child(current, segment.parse().ok()?),
                _ => self.child_by_name(current, segment),
            }
        })
    }

    /// Dotted path from the root, for messages
    pub fn path(&self, slot: usize) -> String {
        let mut segments = Vec::new();
        let mut current = Some(slot);
        while let Some(index) = current {
            let Some(s) = self.slots.get(index) else { break };
            match s.parent {
                Some(parent) if self.slots[parent].property_type == PropertyType::Array => {
                    let position = self.slots[parent].children.iter().position(|&c| c == index);
                    segments.push(position.unwrap_or_default().to_string());
                }
                _ => segments.push(s.name.clone()),
            }
            current = s.parent;
        }
        segments.reverse();
        segments.join(".")
    }

    /// Value of a primitive property
    pub fn value(&self, slot: usize) -> Option<&PropertyValue> {
        self.slots.get(slot)?.value.as_ref()
    }

    /// Store `value`, returning whether it differed from the stored one.
    ///
    /// Ignores direction and link state; callers enforce those rules.
    pub(crate) fn write(&mut self, slot: usize, value: PropertyValue) -> Result<bool, PropertyError> {
        self.store(slot, value, false)
    }

    /// Store a value set from outside the graph. On trees built with
    /// [`flag_every_write`](Self::flag_every_write), inputs are flagged even
    /// when the value is equal.
    pub(crate) fn write_external(&mut self, slot: usize, value: PropertyValue) -> Result<bool, PropertyError> {
        let force = self.flag_every_write;
        self.store(slot, value, force)
    }

    fn store(&mut self, slot: usize, value: PropertyValue, force: bool) -> Result<bool, PropertyError> {
        let Some(property_type) = self.property_type(slot) else {
            return Err(PropertyError::NotFound(format!("slot {slot}")));
        };
        if !property_type.is_primitive() {
            return Err(PropertyError::NotPrimitive(self.path(slot)));
        }
        if property_type != value.property_type() {
            return Err(PropertyError::TypeMismatch {
                path: self.path(slot),
                expected: property_type,
                actual: value.property_type(),
            });
        }

        let s = &mut self.slots[slot];
        let changed = s.value.as_ref() != Some(&value);
        if changed {
            s.value = Some(value);
        }
        let flagged = changed || (force && s.direction == Direction::Input);
        if flagged {
            s.changed = true;
            self.mark_array_ancestors(slot);
        }
        Ok(flagged)
    }

    // An element write marks every enclosing array as changed as a whole.
    fn mark_array_ancestors(&mut self, slot: usize) {
        let mut current = self.slots[slot].parent;
        while let Some(index) = current {
            if self.slots[index].property_type == PropertyType::Array {
                self.slots[index].changed = true;
            }
            current = self.slots[index].parent;
        }
    }

    /// Whether the property or any descendant changed since the last take
    pub fn is_changed(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(|s| {
            s.changed || s.children.iter().any(|&c| self.is_changed(c))
        })
    }

    /// Consume the change flags of the property and all its descendants
    pub(crate) fn take_changed(&mut self, slot: usize) -> bool {
        let Some(s) = self.slots.get_mut(slot) else {
            return false;
        };
        let mut changed = std::mem::take(&mut s.changed);
        let children = s.children.clone();
        for child in children {
            changed |= self.take_changed(child);
        }
        changed
    }

    /// Whether the property or one of its ancestors has an incoming link
    pub fn is_linked_input(&self, slot: usize) -> bool {
        let mut current = Some(slot);
        while let Some(index) = current {
            let Some(s) = self.slots.get(index) else { return false };
            if s.linked {
                return true;
            }
            current = s.parent;
        }
        false
    }

    /// Whether the property or one of its descendants has an incoming link
    pub fn subtree_linked(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(|s| {
            s.linked || s.children.iter().any(|&c| self.subtree_linked(c))
        })
    }

    pub(crate) fn set_linked(&mut self, slot: usize, linked: bool) {
        if let Some(s) = self.slots.get_mut(slot) {
            s.linked = linked;
        }
    }

    /// Primitive properties of the subtree in declaration order
    pub fn leaves(&self, slot: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_leaves(slot, &mut out);
        out
    }

    fn collect_leaves(&self, slot: usize, out: &mut Vec<usize>) {
        let Some(s) = self.slots.get(slot) else { return };
        if s.property_type.is_primitive() {
            out.push(slot);
        }
        for &child in &s.children {
            self.collect_leaves(child, out);
        }
    }

    /// Declaration of the subtree rooted at `slot`
    pub fn spec(&self, slot: usize) -> Option<PropertySpec> {
        let s = self.slots.get(slot)?;
        Some(PropertySpec {
            name: s.name.clone(),
            property_type: s.property_type,
            children: s.children.iter().filter_map(|&c| self.spec(c)).collect(),
        })
    }

    /// Snapshot of the subtree rooted at `slot`
    pub fn snapshot(&self, slot: usize) -> Option<PropertySnapshot> {
        let s = self.slots.get(slot)?;
        Some(PropertySnapshot {
            name: s.name.clone(),
            property_type: s.property_type,
            value: s.value.clone(),
            children: s.children.iter().filter_map(|&c| self.snapshot(c)).collect(),
        })
    }

    /// Overwrite values of the subtree with stored ones (shapes must match).
    ///
    /// Restored values do not count as changes.
    pub(crate) fn restore(&mut self, slot: usize, snapshot: &PropertySnapshot) -> Result<(), String> {
        self.restore_values(slot, snapshot)?;
        self.take_changed(slot);
        Ok(())
    }

    fn restore_values(&mut self, slot: usize, snapshot: &PropertySnapshot) -> Result<(), String> {
        let path = self.path(slot);
        let Some(s) = self.slots.get(slot) else {
            return Err(format!("missing property '{path}'"));
        };
        if s.property_type != snapshot.property_type || s.children.len() != snapshot.children.len() {
            return Err(format!("property '{path}' does not match stored type"));
        }
        if s.property_type.is_primitive() {
            let value = snapshot
                .value
                .clone()
                .ok_or_else(|| format!("property '{path}' has no stored value"))?;
            self.write(slot, value).map_err(|e| e.to_string())?;
            return Ok(());
        }
        let children = s.children.clone();
        for (child, stored) in children.into_iter().zip(&snapshot.children) {
            self.restore_values(child, stored)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> PropertyTree {
        PropertyTree::new(
            Some(&[
                PropertySpec::primitive("speed", PropertyType::Float),
                PropertySpec::structure(
                    "transform",
                    [
                        PropertySpec::primitive("translation", PropertyType::Vec3f),
                        PropertySpec::primitive("visible", PropertyType::Bool),
                    ],
                ),
                PropertySpec::array("weights", 3, PropertySpec::primitive("w", PropertyType::Int32)),
            ]),
            Some(&[PropertySpec::primitive("result", PropertyType::String)]),
        )
    }

    #[test]
    fn test_declaration_order_is_addressing_order() {
        let tree = tree();
        let inputs = tree.input_root().unwrap();
        assert_eq!(tree.child_count(inputs), 3);
        assert_eq!(tree.name(tree.child(inputs, 0).unwrap()), Some("speed"));
        assert_eq!(tree.name(tree.child(inputs, 1).unwrap()), Some("transform"));
        assert_eq!(tree.child(inputs, 3), None);
    }

    #[test]
    fn test_child_lookup_rules() {
        let tree = tree();
        let inputs = tree.input_root().unwrap();
        let weights = tree.child_by_name(inputs, "weights").unwrap();
        assert!(tree.child(weights, 2).is_some());
        assert_eq!(tree.child_by_name(weights, "0"), None);

        let speed = tree.child_by_name(inputs, "speed").unwrap();
        assert_eq!(tree.child(speed, 0), None);
        assert_eq!(tree.child_by_name(speed, "x"), None);
    }

    #[test]
    fn test_resolve_and_path() {
        let tree = tree();
        let inputs = tree.input_root().unwrap();
        let slot = tree.resolve(inputs, "transform.visible").unwrap();
        assert_eq!(tree.path(slot), "IN.transform.visible");

        let element = tree.resolve(inputs, "weights.1").unwrap();
        assert_eq!(tree.path(element), "IN.weights.1");
        assert_eq!(tree.resolve(inputs, "weights.7"), None);
        assert_eq!(tree.resolve(inputs, "missing"), None);
    }

    #[test]
    fn test_write_checks_type() {
        let mut tree = tree();
        let inputs = tree.input_root().unwrap();
        let speed = tree.child(inputs, 0).unwrap();

        assert!(tree.write(speed, PropertyValue::Int32(1)).is_err());
        assert!(matches!(
            tree.write(inputs, PropertyValue::Float(1.0)),
            Err(PropertyError::NotPrimitive(_))
        ));
        assert_eq!(tree.value(speed), Some(&PropertyValue::Float(0.0)));

        assert_eq!(tree.write(speed, PropertyValue::Float(2.0)), Ok(true));
        assert_eq!(tree.write(speed, PropertyValue::Float(2.0)), Ok(false));
    }

    #[test]
    fn test_changed_flag_is_consumed_once() {
        let mut tree = tree();
        let speed = tree.resolve(tree.input_root().unwrap(), "speed").unwrap();
        tree.write(speed, PropertyValue::Float(1.0)).unwrap();
        assert!(tree.take_changed(speed));
        assert!(!tree.take_changed(speed));

        tree.write(speed, PropertyValue::Float(1.0)).unwrap();
        assert!(!tree.is_changed(speed));
    }

    #[test]
    fn test_element_write_marks_whole_array() {
        let mut tree = tree();
        let inputs = tree.input_root().unwrap();
        let weights = tree.child_by_name(inputs, "weights").unwrap();
        let second = tree.child(weights, 1).unwrap();

        tree.write(second, PropertyValue::Int32(5)).unwrap();
        assert!(tree.is_changed(weights));
        assert!(tree.take_changed(weights));
        assert!(!tree.is_changed(second));
    }

    #[test]
    fn test_flag_every_write() {
        let mut tree = tree().flag_every_write();
        let speed = tree.resolve(tree.input_root().unwrap(), "speed").unwrap();
        assert_eq!(tree.write(speed, PropertyValue::Float(0.0)), Ok(false));
        assert!(!tree.is_changed(speed));
        assert_eq!(tree.write_external(speed, PropertyValue::Float(0.0)), Ok(true));
        assert!(tree.take_changed(speed));
    }

    #[test]
    fn test_spec_validation() {
        assert!(PropertySpec::array("a", 0, PropertySpec::primitive("", PropertyType::Bool))
            .validate()
            .is_err());
        assert!(validate_fields(
            "IN",
            &[
                PropertySpec::primitive("x", PropertyType::Bool),
                PropertySpec::primitive("x", PropertyType::Float),
            ]
        )
        .is_err());
        assert!(validate_fields("IN", &[PropertySpec::primitive("", PropertyType::Bool)]).is_err());

        let mut bad_array = PropertySpec::array("a", 2, PropertySpec::primitive("", PropertyType::Bool));
        bad_array.children[1].property_type = PropertyType::Float;
        assert!(bad_array.validate().is_err());

        let nested = PropertySpec::array(
            "points",
            2,
            PropertySpec::structure("p", [PropertySpec::primitive("x", PropertyType::Float)]),
        );
        assert!(nested.validate().is_ok());
    }

    #[test]
    fn test_snapshot_restore() {
        let mut original = tree();
        let inputs = original.input_root().unwrap();
        let element = original.resolve(inputs, "weights.2").unwrap();
        original.write(element, PropertyValue::Int32(9)).unwrap();

        let stored = original.snapshot(inputs).unwrap();
        let mut copy = tree();
        copy.restore(copy.input_root().unwrap(), &stored).unwrap();
        assert_eq!(copy.value(element), Some(&PropertyValue::Int32(9)));
        assert!(!copy.is_changed(inputs));
    }
}
