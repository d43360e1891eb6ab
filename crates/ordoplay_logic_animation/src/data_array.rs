// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed, homogeneous arrays holding keyframe and tangent data.

use crate::keyframe::{KeyframeType, KeyframeValue};
use serde::{Deserialize, Serialize};

/// Homogeneous array of animation data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataArray {
    /// Float elements
    Float(Vec<f32>),
    /// 2D vector elements
    Vec2f(Vec<[f32; 2]>),
    /// 3D vector elements
    Vec3f(Vec<[f32; 3]>),
    /// 4D vector / quaternion elements
    Vec4f(Vec<[f32; 4]>),
    /// Integer elements
    Int32(Vec<i32>),
    /// 2D integer vector elements
    Vec2i(Vec<[i32; 2]>),
    /// 3D integer vector elements
    Vec3i(Vec<[i32; 3]>),
    /// 4D integer vector elements
    Vec4i(Vec<[i32; 4]>),
}

impl DataArray {
    /// Element type
    pub fn data_type(&self) -> KeyframeType {
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

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Vec2f(v) => v.len(),
            Self::Vec3f(v) => v.len(),
            Self::Vec4f(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Vec2i(v) => v.len(),
            Self::Vec3i(v) => v.len(),
            Self::Vec4i(v) => v.len(),
        }
    }

    /// Whether the array has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the element at `index`
    pub fn get(&self, index: usize) -> Option<KeyframeValue> {
        match self {
            Self::Float(v) => v.get(index).copied().map(KeyframeValue::Float),
            Self::Vec2f(v) => v.get(index).copied().map(KeyframeValue::Vec2f),
            Self::Vec3f(v) => v.get(index).copied().map(KeyframeValue::Vec3f),
            Self::Vec4f(v) => v.get(index).copied().map(KeyframeValue::Vec4f),
            Self::Int32(v) => v.get(index).copied().map(KeyframeValue::Int32),
            Self::Vec2i(v) => v.get(index).copied().map(KeyframeValue::Vec2i),
            Self::Vec3i(v) => v.get(index).copied().map(KeyframeValue::Vec3i),
            Self::Vec4i(v) => v.get(index).copied().map(KeyframeValue::Vec4i),
        }
    }
}

impl From<Vec<f32>> for DataArray {
    fn from(v: Vec<f32>) -> Self {
        Self::Float(v)
    }
}

impl From<Vec<[f32; 2]>> for DataArray {
    fn from(v: Vec<[f32; 2]>) -> Self {
        Self::Vec2f(v)
    }
}

impl From<Vec<[f32; 3]>> for DataArray {
    fn from(v: Vec<[f32; 3]>) -> Self {
        Self::Vec3f(v)
    }
}

impl From<Vec<[f32; 4]>> for DataArray {
    fn from(v: Vec<[f32; 4]>) -> Self {
        Self::Vec4f(v)
    }
}

impl From<Vec<i32>> for DataArray {
    fn from(v: Vec<i32>) -> Self {
        Self::Int32(v)
    }
}

impl From<Vec<[i32; 2]>> for DataArray {
    fn from(v: Vec<[i32; 2]>) -> Self {
        Self::Vec2i(v)
    }
}

impl From<Vec<[i32; 3]>> for DataArray {
    fn from(v: Vec<[i32; 3]>) -> Self {
        Self::Vec3i(v)
    }
}

impl From<Vec<[i32; 4]>> for DataArray {
    fn from(v: Vec<[i32; 4]>) -> Self {
        Self::Vec4i(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_out_of_range() {
        let data = DataArray::from(vec![[1.0_f32, 2.0]]);
        assert_eq!(data.len(), 1);
        assert_eq!(data.data_type(), KeyframeType::Vec2f);
        assert_eq!(data.get(0), Some(KeyframeValue::Vec2f([1.0, 2.0])));
        assert_eq!(data.get(1), None);
    }
}
