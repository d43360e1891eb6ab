// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property types and the tagged value stored in primitive properties.

use ordoplay_logic_animation::{KeyframeType, KeyframeValue};
use serde::{Deserialize, Serialize};

/// Type of a property slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    /// Boolean value
    Bool,
    /// 32-bit integer
    Int32,
    /// 64-bit integer
    Int64,
    /// Floating point value
    Float,
    /// String value
    String,
    /// 2D float vector
    Vec2f,
    /// 3D float vector
    Vec3f,
    /// 4D float vector
    Vec4f,
    /// 2D integer vector
    Vec2i,
    /// 3D integer vector
    Vec3i,
    /// 4D integer vector
    Vec4i,
    /// Named, ordered children
    Struct,
    /// Fixed-length anonymous children of one shape
    Array,
}

impl PropertyType {
    /// Whether the type holds a value (as opposed to children)
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Struct | Self::Array)
    }

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Float => "Float",
            Self::String => "String",
            Self::Vec2f => "Vec2f",
            Self::Vec3f => "Vec3f",
            Self::Vec4f => "Vec4f",
            Self::Vec2i => "Vec2i",
            Self::Vec3i => "Vec3i",
            Self::Vec4i => "Vec4i",
            Self::Struct => "Struct",
            Self::Array => "Array",
        }
    }

    /// Initial value of a freshly created primitive property
    pub fn default_value(&self) -> Option<PropertyValue> {
        Some(match self {
            Self::Bool => PropertyValue::Bool(false),
            Self::Int32 => PropertyValue::Int32(0),
            Self::Int64 => PropertyValue::Int64(0),
            Self::Float => PropertyValue::Float(0.0),
            Self::String => PropertyValue::String(String::new()),
            Self::Vec2f => PropertyValue::Vec2f([0.0; 2]),
            Self::Vec3f => PropertyValue::Vec3f([0.0; 3]),
            Self::Vec4f => PropertyValue::Vec4f([0.0; 4]),
            Self::Vec2i => PropertyValue::Vec2i([0; 2]),
            Self::Vec3i => PropertyValue::Vec3i([0; 3]),
            Self::Vec4i => PropertyValue::Vec4i([0; 4]),
            Self::Struct | Self::Array => return None,
        })
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl From<KeyframeType> for PropertyType {
    fn from(value: KeyframeType) -> Self {
        match value {
            KeyframeType::Float => Self::Float,
            KeyframeType::Vec2f => Self::Vec2f,
            KeyframeType::Vec3f => Self::Vec3f,
            KeyframeType::Vec4f => Self::Vec4f,
            KeyframeType::Int32 => Self::Int32,
            KeyframeType::Vec2i => Self::Vec2i,
            KeyframeType::Vec3i => Self::Vec3i,
            KeyframeType::Vec4i => Self::Vec4i,
        }
    }
}

/// Value held by a primitive property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Boolean
    Bool(bool),
    /// 32-bit integer
    Int32(i32),
    /// 64-bit integer
    Int64(i64),
    /// Float
    Float(f32),
    /// String
    String(String),
    /// 2D vector
    Vec2f([f32; 2]),
    /// 3D vector
    Vec3f([f32; 3]),
    /// 4D vector
    Vec4f([f32; 4]),
    /// 2D integer vector
    Vec2i([i32; 2]),
    /// 3D integer vector
    Vec3i([i32; 3]),
    /// 4D integer vector
    Vec4i([i32; 4]),
}

impl PropertyValue {
    /// Get the property type for this value
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Bool(_) => PropertyType::Bool,
            Self::Int32(_) => PropertyType::Int32,
            Self::Int64(_) => PropertyType::Int64,
            Self::Float(_) => PropertyType::Float,
            Self::String(_) => PropertyType::String,
            Self::Vec2f(_) => PropertyType::Vec2f,
            Self::Vec3f(_) => PropertyType::Vec3f,
            Self::Vec4f(_) => PropertyType::Vec4f,
            Self::Vec2i(_) => PropertyType::Vec2i,
            Self::Vec3i(_) => PropertyType::Vec3i,
            Self::Vec4i(_) => PropertyType::Vec4i,
        }
    }

    /// Get as bool if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as i32 if possible
    pub fn as_int32(&self) -> Option<i32> {
        match self {
            Self::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as i64 if possible
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as float if possible
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string slice if possible
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Get as Vec2f if possible
    pub fn as_vec2f(&self) -> Option<[f32; 2]> {
        match self {
            Self::Vec2f(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as Vec3f if possible
    pub fn as_vec3f(&self) -> Option<[f32; 3]> {
        match self {
            Self::Vec3f(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as Vec4f if possible
    pub fn as_vec4f(&self) -> Option<[f32; 4]> {
        match self {
            Self::Vec4f(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as Vec2i if possible
    pub fn as_vec2i(&self) -> Option<[i32; 2]> {
        match self {
            Self::Vec2i(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as Vec3i if possible
    pub fn as_vec3i(&self) -> Option<[i32; 3]> {
        match self {
            Self::Vec3i(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as Vec4i if possible
    pub fn as_vec4i(&self) -> Option<[i32; 4]> {
        match self {
            Self::Vec4i(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<KeyframeValue> for PropertyValue {
    fn from(value: KeyframeValue) -> Self {
        match value {
            KeyframeValue::Float(v) => Self::Float(v),
            KeyframeValue::Vec2f(v) => Self::Vec2f(v),
            KeyframeValue::Vec3f(v) => Self::Vec3f(v),
            KeyframeValue::Vec4f(v) => Self::Vec4f(v),
            KeyframeValue::Int32(v) => Self::Int32(v),
            KeyframeValue::Vec2i(v) => Self::Vec2i(v),
            KeyframeValue::Vec3i(v) => Self::Vec3i(v),
            KeyframeValue::Vec4i(v) => Self::Vec4i(v),
        }
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_primitive! {
    bool => Bool,
    i32 => Int32,
    i64 => Int64,
    f32 => Float,
    String => String,
    [f32; 2] => Vec2f,
    [f32; 3] => Vec3f,
    [f32; 4] => Vec4f,
    [i32; 2] => Vec2i,
    [i32; 3] => Vec3i,
    [i32; 4] => Vec4i,
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}
