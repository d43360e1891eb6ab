// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised while assembling animation channels.

use crate::channel::InterpolationType;
use crate::keyframe::KeyframeType;

/// Rejected channel data
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChannelError {
    /// Channel has no timestamps
    #[error("Channel '{0}' has no timestamps")]
    Empty(String),

    /// Keyframe count does not match timestamp count
    #[error("Channel '{channel}': {keyframes} keyframes for {timestamps} timestamps")]
    LengthMismatch {
        /// Channel name
        channel: String,
        /// Number of timestamps
        timestamps: usize,
        /// Number of keyframes
        keyframes: usize,
    },

    /// Timestamps are not strictly ascending
    #[error("Channel '{channel}': timestamps must be strictly ascending (index {index})")]
    NotAscending {
        /// Channel name
        channel: String,
        /// First offending index
        index: usize,
    },

    /// Timestamp is NaN or infinite
    #[error("Channel '{channel}': timestamp at index {index} is not finite")]
    NonFiniteTimestamp {
        /// Channel name
        channel: String,
        /// Offending index
        index: usize,
    },

    /// Quaternion interpolation on something other than Vec4f
    #[error("Channel '{channel}': quaternion interpolation requires Vec4f keyframes, got {actual:?}")]
    QuaternionType {
        /// Channel name
        channel: String,
        /// Provided keyframe type
        actual: KeyframeType,
    },

    /// Cubic interpolation without both tangent arrays
    #[error("Channel '{0}': cubic interpolation requires tangents in and out")]
    MissingTangents(String),

    /// Tangents supplied for a non-cubic channel
    #[error("Channel '{channel}': tangents are not used by {interpolation:?} interpolation")]
    UnexpectedTangents {
        /// Channel name
        channel: String,
        /// Interpolation of the channel
        interpolation: InterpolationType,
    },

    /// Tangent type differs from keyframe type
    #[error("Channel '{channel}': tangents must be {expected:?}, got {actual:?}")]
    TangentType {
        /// Channel name
        channel: String,
        /// Keyframe type
        expected: KeyframeType,
        /// Tangent type
        actual: KeyframeType,
    },

    /// Tangent count differs from keyframe count
    #[error("Channel '{channel}': {tangents} tangents for {keyframes} keyframes")]
    TangentLength {
        /// Channel name
        channel: String,
        /// Number of keyframes
        keyframes: usize,
        /// Number of tangents
        tangents: usize,
    },
}
