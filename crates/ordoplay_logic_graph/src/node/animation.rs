// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation nodes sample keyframe channels on a shared timeline.
//!
//! A self-driven animation advances its own play time from the `timeDelta`,
//! `play`, `loop` and `rewindOnStop` inputs and reports `progress`. A
//! progress-driven animation is positioned by its `progress` input instead.
//! Both report `duration` and one output per channel, named after it.

use crate::error::{NodeCreationError, NodeError};
use crate::property::{validate_fields, PropertySpec, PropertyTree, INPUT_ROOT, OUTPUT_ROOT};
use crate::value::{PropertyType, PropertyValue};
use ordoplay_logic_animation::{AnimationChannel, Playback, PlaybackControls};
use serde::{Deserialize, Serialize};

const TIME_DELTA: &str = "timeDelta";
const PLAY: &str = "play";
const LOOP: &str = "loop";
const REWIND_ON_STOP: &str = "rewindOnStop";
const PROGRESS: &str = "progress";
const DURATION: &str = "duration";

/// How an animation's play time is controlled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnimationTiming {
    /// Advanced every update by the `timeDelta` input
    #[default]
    SelfDriven,
    /// Positioned by the normalized `progress` input
    ProgressDriven,
}

/// Channels and timing of a new animation node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimationNodeConfig {
    /// Channels sharing the timeline
    pub channels: Vec<AnimationChannel>,
    /// Timing mode
    #[serde(default)]
    pub timing: AnimationTiming,
}

impl AnimationNodeConfig {
    /// Self-driven animation over `channels`
    pub fn new(channels: impl IntoIterator<Item = AnimationChannel>) -> Self {
        Self {
            channels: channels.into_iter().collect(),
            timing: AnimationTiming::SelfDriven,
        }
    }

    /// Switch to progress-driven timing
    pub fn progress_driven(mut self) -> Self {
        self.timing = AnimationTiming::ProgressDriven;
        self
    }
}

/// State of an animation node
#[derive(Debug, Clone)]
pub struct AnimationNode {
    channels: Vec<AnimationChannel>,
    timing: AnimationTiming,
    playback: Playback,
    duration: f32,
}

impl AnimationNode {
    /// Validate the configuration and build the node state and property tree
    pub(crate) fn build(
        name: &str,
        config: AnimationNodeConfig,
    ) -> Result<(Self, PropertyTree), NodeCreationError> {
        let AnimationNodeConfig { channels, timing } = config;
        if channels.is_empty() {
            return Err(NodeCreationError::NoChannels(name.to_string()));
        }
        for (i, channel) in channels.iter().enumerate() {
            if channel.name() == PROGRESS || channel.name() == DURATION {
                return Err(NodeCreationError::ReservedChannelName(channel.name().to_string()));
            }
            if channels[..i].iter().any(|c| c.name() == channel.name()) {
                return Err(NodeCreationError::DuplicateChannel(channel.name().to_string()));
            }
        }

        let inputs = match timing {
            AnimationTiming::SelfDriven => vec![
                PropertySpec::primitive(TIME_DELTA, PropertyType::Float),
                PropertySpec::primitive(PLAY, PropertyType::Bool),
                PropertySpec::primitive(LOOP, PropertyType::Bool),
                PropertySpec::primitive(REWIND_ON_STOP, PropertyType::Bool),
            ],
            AnimationTiming::ProgressDriven => {
                vec![PropertySpec::primitive(PROGRESS, PropertyType::Float)]
            }
        };
        let mut outputs = Vec::with_capacity(channels.len() + 2);
        if timing == AnimationTiming::SelfDriven {
            outputs.push(PropertySpec::primitive(PROGRESS, PropertyType::Float));
        }
        outputs.push(PropertySpec::primitive(DURATION, PropertyType::Float));
        outputs.extend(
            channels
                .iter()
                .map(|c| PropertySpec::primitive(c.name(), c.value_type().into())),
        );
        validate_fields(OUTPUT_ROOT, &outputs).map_err(NodeCreationError::InvalidInterface)?;
        validate_fields(INPUT_ROOT, &inputs).map_err(NodeCreationError::InvalidInterface)?;

        let duration = channels
            .iter()
            .map(AnimationChannel::duration)
            .fold(0.0_f32, f32::max);
        let node = Self {
            channels,
            timing,
            playback: Playback::default(),
            duration,
        };

        let mut properties = PropertyTree::new(Some(&inputs), Some(&outputs));
        node.write_outputs(&mut properties)
            .map_err(|err| NodeCreationError::InvalidInterface(err.message))?;
        Ok((node, properties))
    }

    /// Channels in creation order
    pub fn channels(&self) -> &[AnimationChannel] {
        &self.channels
    }

    /// Timing mode
    pub fn timing(&self) -> AnimationTiming {
        self.timing
    }

    /// Largest last timestamp over all channels
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Current play time in seconds
    pub fn elapsed(&self) -> f32 {
        self.playback.elapsed()
    }

    pub(crate) fn restore_elapsed(&mut self, properties: &mut PropertyTree, elapsed: f32) -> Result<(), NodeError> {
        self.playback = Playback::at(elapsed);
        self.write_outputs(properties)
    }

    pub(crate) fn update(&mut self, properties: &mut PropertyTree) -> Result<(), NodeError> {
        match self.timing {
            AnimationTiming::SelfDriven => {
                let controls = PlaybackControls {
                    play: read(properties, PLAY)?.as_bool().unwrap_or_default(),
                    looping: read(properties, LOOP)?.as_bool().unwrap_or_default(),
                    rewind_on_stop: read(properties, REWIND_ON_STOP)?.as_bool().unwrap_or_default(),
                    time_delta: read(properties, TIME_DELTA)?.as_float().unwrap_or_default(),
                };
                self.playback.advance(controls, self.duration);
            }
            AnimationTiming::ProgressDriven => {
                let progress = read(properties, PROGRESS)?.as_float().unwrap_or_default();
                self.playback = Playback::at(progress.clamp(0.0, 1.0) * self.duration);
            }
        }
        if let Some(root) = properties.input_root() {
            properties.take_changed(root);
        }
        self.write_outputs(properties)
    }

    fn write_outputs(&self, properties: &mut PropertyTree) -> Result<(), NodeError> {
        if self.timing == AnimationTiming::SelfDriven {
            write(properties, PROGRESS, self.playback.progress(self.duration).into())?;
        }
        write(properties, DURATION, self.duration.into())?;
        let elapsed = self.playback.elapsed();
        for channel in &self.channels {
            write(properties, channel.name(), channel.evaluate(elapsed).into())?;
        }
        Ok(())
    }
}

fn read<'t>(properties: &'t PropertyTree, name: &str) -> Result<&'t PropertyValue, NodeError> {
    properties
        .input_root()
        .and_then(|root| properties.resolve(root, name))
        .and_then(|slot| properties.value(slot))
        .ok_or_else(|| NodeError::new(format!("animation input '{name}' missing")))
}

fn write(properties: &mut PropertyTree, name: &str, value: PropertyValue) -> Result<(), NodeError> {
    let slot = properties
        .output_root()
        .and_then(|root| properties.resolve(root, name))
        .ok_or_else(|| NodeError::new(format!("animation output '{name}' missing")))?;
    properties.write(slot, value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordoplay_logic_animation::{ChannelData, InterpolationType};

    fn channel(name: &str) -> AnimationChannel {
        AnimationChannel::new(ChannelData::new(
            name,
            vec![0.0, 2.0],
            vec![0.0_f32, 10.0],
            InterpolationType::Linear,
        ))
        .unwrap()
    }

    fn set(properties: &mut PropertyTree, name: &str, value: PropertyValue) {
        let slot = properties.resolve(properties.input_root().unwrap(), name).unwrap();
        properties.write(slot, value).unwrap();
    }

    fn output(properties: &PropertyTree, name: &str) -> PropertyValue {
        let slot = properties.resolve(properties.output_root().unwrap(), name).unwrap();
        properties.value(slot).cloned().unwrap()
    }

    #[test]
    fn test_configuration_errors() {
        assert_eq!(
            AnimationNode::build("a", AnimationNodeConfig::default()).unwrap_err(),
            NodeCreationError::NoChannels("a".into())
        );
        assert_eq!(
            AnimationNode::build("a", AnimationNodeConfig::new([channel("x"), channel("x")])).unwrap_err(),
            NodeCreationError::DuplicateChannel("x".into())
        );
        assert_eq!(
            AnimationNode::build("a", AnimationNodeConfig::new([channel("duration")])).unwrap_err(),
            NodeCreationError::ReservedChannelName("duration".into())
        );
    }

    #[test]
    fn test_self_driven_playback() {
        let (mut node, mut properties) =
            AnimationNode::build("a", AnimationNodeConfig::new([channel("x")])).unwrap();
        assert_eq!(output(&properties, DURATION), PropertyValue::Float(2.0));

        set(&mut properties, PLAY, PropertyValue::Bool(true));
        set(&mut properties, TIME_DELTA, PropertyValue::Float(1.0));
        node.update(&mut properties).unwrap();
        assert_eq!(output(&properties, "x"), PropertyValue::Float(5.0));
        assert_eq!(output(&properties, PROGRESS), PropertyValue::Float(0.5));

        node.update(&mut properties).unwrap();
        node.update(&mut properties).unwrap();
        assert_eq!(output(&properties, "x"), PropertyValue::Float(10.0));
        assert_eq!(output(&properties, PROGRESS), PropertyValue::Float(1.0));
    }

    #[test]
    fn test_progress_driven() {
        let config = AnimationNodeConfig::new([channel("x")]).progress_driven();
        let (mut node, mut properties) = AnimationNode::build("a", config).unwrap();
        set(&mut properties, PROGRESS, PropertyValue::Float(0.25));
        node.update(&mut properties).unwrap();
        assert_eq!(node.elapsed(), 0.5);
        assert_eq!(output(&properties, "x"), PropertyValue::Float(2.5));

        set(&mut properties, PROGRESS, PropertyValue::Float(3.0));
        node.update(&mut properties).unwrap();
        assert_eq!(output(&properties, "x"), PropertyValue::Float(10.0));
    }
}
