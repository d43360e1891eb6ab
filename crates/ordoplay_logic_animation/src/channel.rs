// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation channels: one keyframe timeline plus its interpolation rule.

use crate::data_array::DataArray;
use crate::error::ChannelError;
use crate::keyframe::{Interpolation, KeyframeType, KeyframeValue};
use serde::{Deserialize, Serialize};

/// Interpolation applied between neighbouring keyframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InterpolationType {
    /// Lower keyframe until the segment midpoint, upper keyframe after it
    Step,
    /// Component-wise linear interpolation
    #[default]
    Linear,
    /// Component-wise cubic Hermite spline with tangents
    Cubic,
    /// Linear interpolation of Vec4f, renormalized
    LinearQuaternion,
    /// Cubic interpolation of Vec4f, renormalized
    CubicQuaternion,
}

impl InterpolationType {
    /// Whether tangents are required
    pub fn is_cubic(&self) -> bool {
        matches!(self, Self::Cubic | Self::CubicQuaternion)
    }

    /// Whether the output is renormalized as a quaternion
    pub fn is_quaternion(&self) -> bool {
        matches!(self, Self::LinearQuaternion | Self::CubicQuaternion)
    }
}

/// Unvalidated channel description.
///
/// Turned into an [`AnimationChannel`] with [`AnimationChannel::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelData {
    /// Channel name, also the name of the channel's output property
    pub name: String,
    /// Strictly ascending timestamps in seconds
    pub timestamps: Vec<f32>,
    /// One keyframe per timestamp
    pub keyframes: DataArray,
    /// Interpolation between keyframes
    pub interpolation: InterpolationType,
    /// In-tangents (cubic only)
    #[serde(default)]
    pub tangents_in: Option<DataArray>,
    /// Out-tangents (cubic only)
    #[serde(default)]
    pub tangents_out: Option<DataArray>,
}

impl ChannelData {
    /// Describe a channel without tangents
    pub fn new(
        name: impl Into<String>,
        timestamps: Vec<f32>,
        keyframes: impl Into<DataArray>,
        interpolation: InterpolationType,
    ) -> Self {
        Self {
            name: name.into(),
            timestamps,
            keyframes: keyframes.into(),
            interpolation,
            tangents_in: None,
            tangents_out: None,
        }
    }

    /// Set tangents for cubic interpolation
    pub fn with_tangents(
        mut self,
        tangents_in: impl Into<DataArray>,
        tangents_out: impl Into<DataArray>,
    ) -> Self {
        self.tangents_in = Some(tangents_in.into());
        self.tangents_out = Some(tangents_out.into());
        self
    }
}

/// Validated, immutable animation channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ChannelData", into = "ChannelData")]
pub struct AnimationChannel {
    data: ChannelData,
}

impl AnimationChannel {
    /// Validate channel data
    pub fn new(data: ChannelData) -> Result<Self, ChannelError> {
        let name = &data.name;
        let timestamps = &data.timestamps;

        if timestamps.is_empty() {
            return Err(ChannelError::Empty(name.clone()));
        }
        if let Some(index) = timestamps.iter().position(|t| !t.is_finite()) {
            return Err(ChannelError::NonFiniteTimestamp { channel: name.clone(), index });
        }
        if let Some(index) = timestamps.windows(2).position(|w| w[0] >= w[1]) {
            return Err(ChannelError::NotAscending { channel: name.clone(), index: index + 1 });
        }
        if data.keyframes.len() != timestamps.len() {
            return Err(ChannelError::LengthMismatch {
                channel: name.clone(),
                timestamps: timestamps.len(),
                keyframes: data.keyframes.len(),
            });
        }

        let keyframe_type = data.keyframes.data_type();
        if data.interpolation.is_quaternion() && keyframe_type != KeyframeType::Vec4f {
            return Err(ChannelError::QuaternionType { channel: name.clone(), actual: keyframe_type });
        }

        if data.interpolation.is_cubic() {
            let (Some(tangents_in), Some(tangents_out)) = (&data.tangents_in, &data.tangents_out) else {
                return Err(ChannelError::MissingTangents(name.clone()));
            };
            for tangents in [tangents_in, tangents_out] {
                if tangents.data_type() != keyframe_type {
                    return Err(ChannelError::TangentType {
                        channel: name.clone(),
                        expected: keyframe_type,
                        actual: tangents.data_type(),
                    });
                }
                if tangents.len() != data.keyframes.len() {
                    return Err(ChannelError::TangentLength {
                        channel: name.clone(),
                        keyframes: data.keyframes.len(),
                        tangents: tangents.len(),
                    });
                }
            }
        } else if data.tangents_in.is_some() || data.tangents_out.is_some() {
            return Err(ChannelError::UnexpectedTangents {
                channel: name.clone(),
                interpolation: data.interpolation,
            });
        }

        Ok(Self { data })
    }

    /// Channel name
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Timestamps
    pub fn timestamps(&self) -> &[f32] {
        &self.data.timestamps
    }

    /// Keyframe data
    pub fn keyframes(&self) -> &DataArray {
        &self.data.keyframes
    }

    /// Interpolation type
    pub fn interpolation(&self) -> InterpolationType {
        self.data.interpolation
    }

    /// In/out tangents (only present for cubic channels)
    pub fn tangents(&self) -> Option<(&DataArray, &DataArray)> {
        self.data.tangents_in.as_ref().zip(self.data.tangents_out.as_ref())
    }

    /// Type of the channel's output value
    pub fn value_type(&self) -> KeyframeType {
        self.data.keyframes.data_type()
    }

    /// Time of the last keyframe
    pub fn duration(&self) -> f32 {
        self.data.timestamps.last().copied().unwrap_or(0.0)
    }

    /// Evaluate the channel at `time` seconds
    pub fn evaluate(&self, time: f32) -> KeyframeValue {
        let timestamps = &self.data.timestamps;
        let last = timestamps.len() - 1;

        if last == 0 || time.is_nan() || time <= timestamps[0] {
            return self.keyframe(&self.data.keyframes, 0);
        }
        if time >= timestamps[last] {
            return self.keyframe(&self.data.keyframes, last);
        }

        // first timestamp strictly after `time`; 1..=last because of the checks above
        let upper = timestamps.partition_point(|&t| t <= time);
        let lower = upper - 1;
        let segment = timestamps[upper] - timestamps[lower];
        let ratio = ((time - timestamps[lower]) / segment).clamp(0.0, 1.0);

        let keyframes = &self.data.keyframes;
        let value = match self.data.interpolation {
            InterpolationType::Step => {
                if time < timestamps[lower] + segment * 0.5 {
                    self.keyframe(keyframes, lower)
                } else {
                    self.keyframe(keyframes, upper)
                }
            }
            InterpolationType::Linear | InterpolationType::LinearQuaternion => Interpolation::lerp_value(
                &self.keyframe(keyframes, lower),
                &self.keyframe(keyframes, upper),
                ratio,
            ),
            InterpolationType::Cubic | InterpolationType::CubicQuaternion => match self.tangents() {
                Some((tangents_in, tangents_out)) => Interpolation::cubic_value(
                    &self.keyframe(keyframes, lower),
                    &self.keyframe(keyframes, upper),
                    &self.keyframe(tangents_out, lower),
                    &self.keyframe(tangents_in, upper),
                    ratio,
                    segment,
                ),
                None => Interpolation::lerp_value(
                    &self.keyframe(keyframes, lower),
                    &self.keyframe(keyframes, upper),
                    ratio,
                ),
            },
        };

        match value {
            KeyframeValue::Vec4f(q) if self.data.interpolation.is_quaternion() => {
                KeyframeValue::Vec4f(Interpolation::normalize(q))
            }
            other => other,
        }
    }

    // Indices are in range once the channel has been validated.
    fn keyframe(&self, data: &DataArray, index: usize) -> KeyframeValue {
        data.get(index)
            .unwrap_or_else(|| KeyframeValue::from_components(self.value_type(), [0.0; 4]))
    }
}

impl TryFrom<ChannelData> for AnimationChannel {
    type Error = ChannelError;

    fn try_from(data: ChannelData) -> Result<Self, Self::Error> {
        Self::new(data)
    }
}

impl From<AnimationChannel> for ChannelData {
    fn from(channel: AnimationChannel) -> Self {
        channel.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> AnimationChannel {
        AnimationChannel::new(ChannelData::new(
            "x",
            vec![0.0, 2.0],
            vec![0.0_f32, 10.0],
            InterpolationType::Linear,
        ))
        .unwrap()
    }

    #[test]
    fn test_linear_samples() {
        let channel = linear();
        assert_eq!(channel.evaluate(0.0), KeyframeValue::Float(0.0));
        assert_eq!(channel.evaluate(1.0), KeyframeValue::Float(5.0));
        assert_eq!(channel.evaluate(2.0), KeyframeValue::Float(10.0));
        assert_eq!(channel.duration(), 2.0);
    }

    #[test]
    fn test_clamps_outside_range() {
        let channel = linear();
        assert_eq!(channel.evaluate(-3.0), KeyframeValue::Float(0.0));
        assert_eq!(channel.evaluate(7.5), KeyframeValue::Float(10.0));
    }

    #[test]
    fn test_step_switches_at_midpoint() {
        let channel = AnimationChannel::new(ChannelData::new(
            "s",
            vec![0.0, 2.0],
            vec![[1, 1], [2, 2]],
            InterpolationType::Step,
        ))
        .unwrap();
        assert_eq!(channel.evaluate(0.0), KeyframeValue::Vec2i([1, 1]));
        assert_eq!(channel.evaluate(0.999), KeyframeValue::Vec2i([1, 1]));
        assert_eq!(channel.evaluate(1.0), KeyframeValue::Vec2i([2, 2]));
        assert_eq!(channel.evaluate(2.0), KeyframeValue::Vec2i([2, 2]));
    }

    #[test]
    fn test_single_keyframe() {
        let channel = AnimationChannel::new(ChannelData::new(
            "one",
            vec![0.5],
            vec![[1.0_f32, 2.0, 3.0]],
            InterpolationType::Linear,
        ))
        .unwrap();
        for t in [-1.0, 0.0, 0.5, 100.0] {
            assert_eq!(channel.evaluate(t), KeyframeValue::Vec3f([1.0, 2.0, 3.0]));
        }
    }

    #[test]
    fn test_finds_inner_segment() {
        let channel = AnimationChannel::new(ChannelData::new(
            "x",
            vec![0.0, 1.0, 3.0, 4.0],
            vec![0.0_f32, 10.0, 30.0, 0.0],
            InterpolationType::Linear,
        ))
        .unwrap();
        assert_eq!(channel.evaluate(2.0), KeyframeValue::Float(20.0));
        assert_eq!(channel.evaluate(3.5), KeyframeValue::Float(15.0));
    }

    #[test]
    fn test_cubic_matches_gltf_spline() {
        let channel = AnimationChannel::new(
            ChannelData::new("c", vec![0.0, 2.0], vec![0.0_f32, 1.0], InterpolationType::Cubic)
                .with_tangents(vec![0.0_f32, 1.0], vec![1.0_f32, 0.0]),
        )
        .unwrap();
        // p0=0, p1=1, m0 = 2*out[0] = 2, m1 = 2*in[1] = 2 at t=0.5
        let expected = Interpolation::hermite(0.0, 2.0, 1.0, 2.0, 0.5);
        assert_eq!(channel.evaluate(1.0), KeyframeValue::Float(expected));
        assert_eq!(channel.evaluate(0.0), KeyframeValue::Float(0.0));
        assert_eq!(channel.evaluate(2.0), KeyframeValue::Float(1.0));
    }

    #[test]
    fn test_cubic_quaternion_is_unit_length() {
        let channel = AnimationChannel::new(
            ChannelData::new(
                "rot",
                vec![0.0, 1.0, 3.0],
                vec![[0.0_f32, 0.0, 0.0, 1.0], [0.0, 0.7071, 0.0, 0.7071], [1.0, 0.0, 0.0, 0.0]],
                InterpolationType::CubicQuaternion,
            )
            .with_tangents(
                vec![[0.3_f32, -0.2, 0.1, 0.0], [0.5, 0.5, 0.5, 0.5], [0.0, 0.0, 1.0, 0.0]],
                vec![[1.0_f32, 0.0, 0.0, 0.0], [-0.4, 0.2, 0.9, 0.1], [0.0, 0.0, 0.0, 0.0]],
            ),
        )
        .unwrap();

        for step in 0..=60 {
            let q = channel.evaluate(step as f32 * 0.05).as_vec4f().unwrap();
            let len = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
            assert!((len - 1.0).abs() < 1e-4, "length {len} at step {step}");
        }
    }

    #[test]
    fn test_rejects_bad_data() {
        let err = AnimationChannel::new(ChannelData::new(
            "a",
            vec![0.0, 0.0],
            vec![1.0_f32, 2.0],
            InterpolationType::Linear,
        ))
        .unwrap_err();
        assert!(matches!(err, ChannelError::NotAscending { index: 1, .. }));

        let err = AnimationChannel::new(ChannelData::new(
            "b",
            vec![0.0, 1.0],
            vec![1.0_f32],
            InterpolationType::Linear,
        ))
        .unwrap_err();
        assert!(matches!(err, ChannelError::LengthMismatch { .. }));

        let err = AnimationChannel::new(ChannelData::new(
            "c",
            vec![0.0, 1.0],
            vec![1.0_f32, 2.0],
            InterpolationType::Cubic,
        ))
        .unwrap_err();
        assert_eq!(err, ChannelError::MissingTangents("c".to_string()));

        let err = AnimationChannel::new(ChannelData::new(
            "d",
            vec![0.0, 1.0],
            vec![[0.0_f32, 0.0, 0.0], [1.0, 1.0, 1.0]],
            InterpolationType::LinearQuaternion,
        ))
        .unwrap_err();
        assert!(matches!(err, ChannelError::QuaternionType { .. }));

        let err = AnimationChannel::new(
            ChannelData::new("e", vec![0.0, 1.0], vec![1.0_f32, 2.0], InterpolationType::Step)
                .with_tangents(vec![0.0_f32, 0.0], vec![0.0_f32, 0.0]),
        )
        .unwrap_err();
        assert!(matches!(err, ChannelError::UnexpectedTangents { .. }));

        let err = AnimationChannel::new(ChannelData::new(
            "f",
            vec![],
            Vec::<f32>::new(),
            InterpolationType::Linear,
        ))
        .unwrap_err();
        assert_eq!(err, ChannelError::Empty("f".to_string()));
    }

    #[test]
    fn test_serialization_revalidates() {
        let channel = linear();
        let ron = ron::to_string(&channel).unwrap();
        let loaded: AnimationChannel = ron::from_str(&ron).unwrap();
        assert_eq!(loaded, channel);

        let broken = ron.replace("2.0", "-1.0");
        assert!(ron::from_str::<AnimationChannel>(&broken).is_err());
    }
}
