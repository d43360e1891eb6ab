// SPDX-License-Identifier: MIT OR Apache-2.0
//! Anchor nodes expose the projected screen position of an external object.

use crate::error::NodeError;
use crate::property::{PropertySpec, PropertyTree};
use crate::value::{PropertyType, PropertyValue};

pub(crate) const VIEWPORT_COORDS: &str = "viewportCoords";
pub(crate) const DEPTH: &str = "depth";

/// Result of projecting an anchored object
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Projection {
    /// Position in viewport pixels
    pub viewport_coords: [f32; 2],
    /// Normalized depth
    pub depth: f32,
}

/// Host-side projection of an external object into the viewport
pub trait AnchorProjector {
    /// Project the object for the current frame
    fn project(&mut self) -> Result<Projection, NodeError>;
}

/// State of an anchor node
pub struct AnchorNode {
    projector: Box<dyn AnchorProjector>,
}

impl AnchorNode {
    /// Create an anchor node state
    pub fn new(projector: Box<dyn AnchorProjector>) -> Self {
        Self { projector }
    }

    pub(crate) fn build() -> PropertyTree {
        PropertyTree::new(
            None,
            Some(&[
                PropertySpec::primitive(VIEWPORT_COORDS, PropertyType::Vec2f),
                PropertySpec::primitive(DEPTH, PropertyType::Float),
            ]),
        )
    }

    pub(crate) fn update(&mut self, properties: &mut PropertyTree) -> Result<(), NodeError> {
        let projection = self.projector.project()?;
        let root = properties
            .output_root()
            .ok_or_else(|| NodeError::new("anchor outputs missing"))?;
        for (name, value) in [
            (VIEWPORT_COORDS, PropertyValue::Vec2f(projection.viewport_coords)),
            (DEPTH, PropertyValue::Float(projection.depth)),
        ] {
            let slot = properties
                .resolve(root, name)
                .ok_or_else(|| NodeError::new(format!("anchor output '{name}' missing")))?;
            properties.write(slot, value)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for AnchorNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnchorNode").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Projection);

    impl AnchorProjector for Fixed {
        fn project(&mut self) -> Result<Projection, NodeError> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_outputs_follow_projection() {
        let mut tree = AnchorNode::build();
        let mut anchor = AnchorNode::new(Box::new(Fixed(Projection {
            viewport_coords: [320.0, 240.0],
            depth: 0.25,
        })));
        anchor.update(&mut tree).unwrap();

        let root = tree.output_root().unwrap();
        let coords = tree.resolve(root, VIEWPORT_COORDS).unwrap();
        let depth = tree.resolve(root, DEPTH).unwrap();
        assert_eq!(tree.value(coords), Some(&PropertyValue::Vec2f([320.0, 240.0])));
        assert_eq!(tree.value(depth), Some(&PropertyValue::Float(0.25)));
        assert!(tree.input_root().is_none());
    }
}
