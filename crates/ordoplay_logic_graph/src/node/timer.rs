// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timer nodes provide a microsecond ticker to the graph.

use crate::error::NodeError;
use crate::property::{PropertySpec, PropertyTree};
use crate::value::{PropertyType, PropertyValue};
use std::time::{SystemTime, UNIX_EPOCH};

/// Name of the timer's input and output
pub(crate) const TICKER: &str = "ticker_us";

/// State of a timer node.
///
/// The `ticker_us` input is passed through to the output; while it is zero
/// the output follows the system clock instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerNode;

impl TimerNode {
    pub(crate) fn build() -> PropertyTree {
        let ticker = [PropertySpec::primitive(TICKER, PropertyType::Int64)];
        PropertyTree::new(Some(&ticker), Some(&ticker))
    }

    pub(crate) fn update(&mut self, properties: &mut PropertyTree) -> Result<(), NodeError> {
        let input = properties
            .input_root()
            .and_then(|root| properties.resolve(root, TICKER))
            .and_then(|slot| properties.value(slot))
            .and_then(PropertyValue::as_int64)
            .unwrap_or_default();

        let ticker = if input == 0 {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(|err| NodeError::new(format!("system clock before epoch: {err}")))?;
            i64::try_from(now.as_micros()).unwrap_or(i64::MAX)
        } else {
            input
        };

        let slot = properties
            .output_root()
            .and_then(|root| properties.resolve(root, TICKER))
            .ok_or_else(|| NodeError::new("timer output missing"))?;
        properties.write(slot, PropertyValue::Int64(ticker))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(tree: &PropertyTree) -> i64 {
        let slot = tree.resolve(tree.output_root().unwrap(), TICKER).unwrap();
        tree.value(slot).and_then(PropertyValue::as_int64).unwrap()
    }

    #[test]
    fn test_passthrough() {
        let mut tree = TimerNode::build();
        let input = tree.resolve(tree.input_root().unwrap(), TICKER).unwrap();
        tree.write(input, PropertyValue::Int64(1_500)).unwrap();
        TimerNode.update(&mut tree).unwrap();
        assert_eq!(output(&tree), 1_500);
    }

    #[test]
    fn test_zero_uses_system_clock() {
        let mut tree = TimerNode::build();
        TimerNode.update(&mut tree).unwrap();
        let first = output(&tree);
        assert!(first > 0);

        TimerNode.update(&mut tree).unwrap();
        assert!(output(&tree) >= first);
    }
}
