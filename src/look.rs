//! Mouse look.
//!
//! Turns accumulated look motion into facing yaw and camera pitch. Runs at
//! frame rate in `Update`, since look latency matters more than determinism.

use bevy::prelude::*;

use crate::integrator::BodyState;
use crate::intent::LocomotionInput;

/// Degrees of rotation per mouse unit at sensitivity 1.
pub const BASE_DEGREES_PER_UNIT: f32 = 0.1;

/// Look tuning, mirroring a typical settings menu.
///
/// Setters clamp into the menu's ranges; the fields are public for
/// inspection and reflection, and [`apply_look`] clamps again on read.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LookSettings {
    /// Overall sensitivity in `[0.01, 10]`.
    pub sensitivity: f32,
    /// Horizontal multiplier in `[0.01, 2]`.
    pub sensitivity_x: f32,
    /// Vertical multiplier in `[0.01, 2]`.
    pub sensitivity_y: f32,
    /// Mouse acceleration in `[0, 1]`: faster motion turns further.
    pub acceleration: f32,
    pub invert_y: bool,
    /// Pitch limits in degrees.
    pub min_pitch_degrees: f32,
    pub max_pitch_degrees: f32,
}

impl Default for LookSettings {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            sensitivity_x: 1.0,
            sensitivity_y: 1.0,
            acceleration: 0.0,
            invert_y: false,
            min_pitch_degrees: -80.0,
            max_pitch_degrees: 80.0,
        }
    }
}

impl LookSettings {
    pub const SENSITIVITY_RANGE: (f32, f32) = (0.01, 10.0);
    pub const AXIS_RANGE: (f32, f32) = (0.01, 2.0);
    pub const ACCELERATION_RANGE: (f32, f32) = (0.0, 1.0);

    pub fn set_sensitivity(&mut self, value: f32) {
        self.sensitivity = clamp_or(value, Self::SENSITIVITY_RANGE, 1.0);
    }

    pub fn set_axis_sensitivity(&mut self, x: f32, y: f32) {
        self.sensitivity_x = clamp_or(x, Self::AXIS_RANGE, 1.0);
        self.sensitivity_y = clamp_or(y, Self::AXIS_RANGE, 1.0);
    }

    pub fn set_acceleration(&mut self, value: f32) {
        self.acceleration = clamp_or(value, Self::ACCELERATION_RANGE, 0.0);
    }

    /// Set pitch limits in degrees. Swapped limits are reordered and both
    /// are kept within `[-90, 90]`.
    pub fn set_pitch_limits(&mut self, min_degrees: f32, max_degrees: f32) {
        let a = clamp_or(min_degrees, (-90.0, 90.0), -80.0);
        let b = clamp_or(max_degrees, (-90.0, 90.0), 80.0);
        self.min_pitch_degrees = a.min(b);
        self.max_pitch_degrees = a.max(b);
    }

    /// Yaw and pitch change in radians for a mouse delta.
    ///
    /// Mouse `y` grows downward, so moving the mouse up looks up.
    pub fn turn(&self, delta: Vec2) -> Vec2 {
        let sensitivity = clamp_or(self.sensitivity, Self::SENSITIVITY_RANGE, 1.0);
        let accel = clamp_or(self.acceleration, Self::ACCELERATION_RANGE, 0.0);
        let factor = (1.0 + accel * delta.length()).max(0.0);

        let scale = BASE_DEGREES_PER_UNIT * sensitivity * factor;
        let sens_x = scale * clamp_or(self.sensitivity_x, Self::AXIS_RANGE, 1.0);
        let sens_y = scale * clamp_or(self.sensitivity_y, Self::AXIS_RANGE, 1.0);

        let dy = if self.invert_y { -delta.y } else { delta.y };
        Vec2::new((-delta.x * sens_x).to_radians(), (-dy * sens_y).to_radians())
    }

    /// Apply a mouse delta to a yaw and pitch, clamping pitch.
    pub fn apply(&self, yaw: f32, pitch: f32, delta: Vec2) -> (f32, f32) {
        let turn = self.turn(delta);
        let min = self.min_pitch_degrees.min(self.max_pitch_degrees).to_radians();
        let max = self.max_pitch_degrees.max(self.min_pitch_degrees).to_radians();
        let yaw = (yaw + turn.x).rem_euclid(std::f32::consts::TAU);
        (yaw, (pitch + turn.y).clamp(min, max))
    }
}

fn clamp_or(value: f32, (min, max): (f32, f32), fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Consume accumulated look motion and turn the body.
pub fn apply_look(mut q_actors: Query<(&LookSettings, &mut LocomotionInput, &mut BodyState)>) {
    for (settings, mut input, mut body) in &mut q_actors {
        let delta = input.take_look_delta();
        if delta == Vec2::ZERO {
            continue;
        }
        let (yaw, pitch) = settings.apply(body.yaw, body.pitch, delta);
        body.yaw = yaw;
        body.pitch = pitch;
    }
}
