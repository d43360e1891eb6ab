// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe values and the interpolation math applied to them.

use serde::{Deserialize, Serialize};

/// Element type of keyframe, tangent and channel output data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyframeType {
    /// Single float
    Float,
    /// 2D float vector
    Vec2f,
    /// 3D float vector
    Vec3f,
    /// 4D float vector / quaternion
    Vec4f,
    /// Signed 32-bit integer
    Int32,
    /// 2D integer vector
    Vec2i,
    /// 3D integer vector
    Vec3i,
    /// 4D integer vector
    Vec4i,
}

impl KeyframeType {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Float => "Float",
            Self::Vec2f => "Vec2f",
            Self::Vec3f => "Vec3f",
            Self::Vec4f => "Vec4f",
            Self::Int32 => "Int32",
            Self::Vec2i => "Vec2i",
            Self::Vec3i => "Vec3i",
            Self::Vec4i => "Vec4i",
        }
    }

    /// Number of scalar components
    pub fn component_count(&self) -> usize {
        match self {
            Self::Float | Self::Int32 => 1,
            Self::Vec2f | Self::Vec2i => 2,
            Self::Vec3f | Self::Vec3i => 3,
            Self::Vec4f | Self::Vec4i => 4,
        }
    }

    /// Whether components are integers (rounded after interpolation)
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int32 | Self::Vec2i | Self::Vec3i | Self::Vec4i)
    }
}

/// A single keyframe (or tangent) value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KeyframeValue {
    /// Float value
    Float(f32),
    /// 2D vector
    Vec2f([f32; 2]),
    /// 3D vector
    Vec3f([f32; 3]),
    /// 4D vector / quaternion
    Vec4f([f32; 4]),
    /// Integer value
    Int32(i32),
    /// 2D integer vector
    Vec2i([i32; 2]),
    /// 3D integer vector
    Vec3i([i32; 3]),
    /// 4D integer vector
    Vec4i([i32; 4]),
}

impl KeyframeValue {
    /// Get the type of this value
    pub fn value_type(&self) -> KeyframeType {
        match self {
            Self::Float(_) => KeyframeType::Float,
            Self::Vec2f(_) => KeyframeType::Vec2f,
            Self::Vec3f(_) => KeyframeType::Vec3f,
            Self::Vec4f(_) => KeyframeType::Vec4f,
            Self::Int32(_) => KeyframeType::Int32,
            Self::Vec2i(_) => KeyframeType::Vec2i,
            Self::Vec3i(_) => KeyframeType::Vec3i,
            Self::Vec4i(_) => KeyframeType::Vec4i,
        }
    }

    /// Decompose into float components (unused trailing slots are zero)
    pub fn components(&self) -> [f32; 4] {
        let mut out = [0.0; 4];
        match *self {
            Self::Float(v) => out[0] = v,
            Self::Vec2f(v) => out[..2].copy_from_slice(&v),
            Self::Vec3f(v) => out[..3].copy_from_slice(&v),
            Self::Vec4f(v) => out = v,
            Self::Int32(v) => out[0] = v as f32,
            Self::Vec2i(v) => {
                for (o, c) in out.iter_mut().zip(v) {
                    *o = c as f32;
                }
            }
            Self::Vec3i(v) => {
                for (o, c) in out.iter_mut().zip(v) {
                    *o = c as f32;
                }
            }
            Self::Vec4i(v) => {
                for (o, c) in out.iter_mut().zip(v) {
                    *o = c as f32;
                }
            }
        }
        out
    }

    /// Rebuild a value of `value_type` from float components.
    ///
    /// Integer types round to the nearest integer, halfway cases away from zero.
    pub fn from_components(value_type: KeyframeType, c: [f32; 4]) -> Self {
        let r = |v: f32| v.round() as i32;
        match value_type {
            KeyframeType::Float => Self::Float(c[0]),
            KeyframeType::Vec2f => Self::Vec2f([c[0], c[1]]),
            KeyframeType::Vec3f => Self::Vec3f([c[0], c[1], c[2]]),
            KeyframeType::Vec4f => Self::Vec4f(c),
            KeyframeType::Int32 => Self::Int32(r(c[0])),
            KeyframeType::Vec2i => Self::Vec2i([r(c[0]), r(c[1])]),
            KeyframeType::Vec3i => Self::Vec3i([r(c[0]), r(c[1]), r(c[2])]),
            KeyframeType::Vec4i => Self::Vec4i([r(c[0]), r(c[1]), r(c[2]), r(c[3])]),
        }
    }

    /// Get as float if possible
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as Vec4/quaternion if possible
    pub fn as_vec4f(&self) -> Option<[f32; 4]> {
        match self {
            Self::Vec4f(v) => Some(*v),
            _ => None,
        }
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Hermite spline interpolation with tangents already scaled to the segment
    pub fn hermite(p0: f32, m0: f32, p1: f32, m1: f32, t: f32) -> f32 {
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * p0 + h10 * m0 + h01 * p1 + h11 * m1
    }

    /// Component-wise linear interpolation
    pub fn lerp_value(a: &KeyframeValue, b: &KeyframeValue, t: f32) -> KeyframeValue {
        let (ca, cb) = (a.components(), b.components());
        let mut out = [0.0; 4];
        for i in 0..a.value_type().component_count() {
            out[i] = Self::lerp(ca[i], cb[i], t);
        }
        KeyframeValue::from_components(a.value_type(), out)
    }

    /// Component-wise cubic spline (glTF 2.0, Appendix C).
    ///
    /// `out_tangent` belongs to the lower keyframe, `in_tangent` to the upper one;
    /// both are scaled by `segment_duration`.
    pub fn cubic_value(
        lower: &KeyframeValue,
        upper: &KeyframeValue,
        out_tangent: &KeyframeValue,
        in_tangent: &KeyframeValue,
        t: f32,
        segment_duration: f32,
    ) -> KeyframeValue {
        let (p0, p1) = (lower.components(), upper.components());
        let (m0, m1) = (out_tangent.components(), in_tangent.components());
        let mut out = [0.0; 4];
        for i in 0..lower.value_type().component_count() {
            out[i] = Self::hermite(
                p0[i],
                segment_duration * m0[i],
                p1[i],
                segment_duration * m1[i],
                t,
            );
        }
        KeyframeValue::from_components(lower.value_type(), out)
    }

    /// Normalize a quaternion to unit length.
    ///
    /// A zero quaternion stays zero.
    pub fn normalize(q: [f32; 4]) -> [f32; 4] {
        let len = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
        if len <= f32::EPSILON {
            return q;
        }
        [q[0] / len, q[1] / len, q[2] / len, q[3] / len]
    }
}
