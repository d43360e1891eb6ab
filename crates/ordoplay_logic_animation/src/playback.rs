// SPDX-License-Identifier: MIT OR Apache-2.0
//! Self-driven playback timing shared by all channels of an animation.

use serde::{Deserialize, Serialize};

/// Inputs controlling one playback step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackControls {
    /// Advance time this step
    pub play: bool,
    /// Wrap around when passing either end
    pub looping: bool,
    /// Reset to the start while not playing
    pub rewind_on_stop: bool,
    /// Seconds to advance; negative plays backwards
    pub time_delta: f32,
}

/// Elapsed play time of an animation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Playback {
    elapsed: f32,
}

impl Playback {
    /// Create a playback positioned at `elapsed` seconds
    pub fn at(elapsed: f32) -> Self {
        Self { elapsed }
    }

    /// Current elapsed play time in seconds
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Advance by one step and return the new elapsed time.
    ///
    /// A finished, non-looping playback keeps being clamped to `duration`;
    /// callers detect completion by polling [`Playback::progress`].
    pub fn advance(&mut self, controls: PlaybackControls, duration: f32) -> f32 {
        if !controls.play {
            if controls.rewind_on_stop {
                self.elapsed = 0.0;
            }
            return self.elapsed;
        }

        self.elapsed += controls.time_delta;

        if self.elapsed > duration || self.elapsed < 0.0 {
            self.elapsed = if duration <= 0.0 {
                0.0
            } else if controls.looping {
                self.elapsed.rem_euclid(duration)
            } else {
                self.elapsed.clamp(0.0, duration)
            };
        }

        self.elapsed
    }

    /// Normalized progress in `[0, 1]`, zero for empty animations
    pub fn progress(&self, duration: f32) -> f32 {
        if duration <= 0.0 {
            return 0.0;
        }
        (self.elapsed / duration).clamp(0.0, 1.0)
    }
}
