// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe animation engine for `OrdoPlay` Logic.
//!
//! This crate evaluates keyframe channels independently of any node graph:
//! - Typed keyframe and tangent arrays
//! - Validated channels with step, linear, cubic and quaternion interpolation
//! - Playback timing (play, loop, rewind, reverse)
//!
//! ## Architecture
//!
//! Channels are immutable once validated. The logic graph owns the playback
//! state of each animation node and samples its channels every tick.

pub mod channel;
pub mod data_array;
pub mod error;
pub mod keyframe;
pub mod playback;

pub use channel::{AnimationChannel, ChannelData, InterpolationType};
pub use data_array::DataArray;
pub use error::ChannelError;
pub use keyframe::{Interpolation, KeyframeType, KeyframeValue};
pub use playback::{Playback, PlaybackControls};
