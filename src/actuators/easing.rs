//! Easing curves for accelerated actuators.
//!
//! Every curve maps a normalized time `t` in `[0, 1]` (clamped) to a
//! progress value with `ease(e, 0) == 0` and `ease(e, 1) == 1`.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Constant speed (no easing).
    #[default]
    Linear,
    /// Starts slow, accelerates (quadratic).
    QuadIn,
    /// Starts fast, decelerates (quadratic).
    QuadOut,
    /// Slow start and end (quadratic).
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
}

pub fn ease(e: Easing, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match e {
        Easing::Linear => t,
        Easing::QuadIn => t * t,
        Easing::QuadOut => t * (2.0 - t),
        Easing::QuadInOut => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                -1.0 + (4.0 - 2.0 * t) * t
            }
        }
        Easing::CubicIn => t * t * t,
        Easing::CubicOut => {
            let p = t - 1.0;
            p * p * p + 1.0
        }
        Easing::CubicInOut => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                let p = 2.0 * t - 2.0;
                0.5 * p * p * p + 1.0
            }
        }
    }
}

/// Eased interpolation from `start` to `end`.
pub fn interpolate(e: Easing, start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * ease(e, t)
}

/// Speed ramp used by accelerated actuators: from the speed the entity has on
/// state entry to `goal` over `duration` seconds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Acceleration {
    pub goal: f32,
    pub duration: f32,
    pub easing: Easing,
}

impl Acceleration {
    pub fn new(goal: f32, duration: f32, easing: Easing) -> Self {
        Self {
            goal,
            duration: duration.max(0.0),
            easing,
        }
    }

    /// Value after `elapsed` seconds, and whether the ramp is complete.
    pub fn sample(&self, initial: f32, elapsed: f32) -> (f32, bool) {
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            elapsed / self.duration
        };
        if t >= 1.0 {
            (self.goal, true)
        } else {
            (interpolate(self.easing, initial, self.goal, t), false)
        }
    }
}
