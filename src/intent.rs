//! Locomotion input component.
//!
//! The input component carries the per-tick input facts the controller
//! consumes: a movement axis, held state of the run and jump actions, and
//! accumulated look motion. Any source can fill it (keyboard, gamepad, AI,
//! replay); the controller only sees these values.

use bevy::prelude::*;

use crate::config::{LocomotionConfig, SprintMode};

/// Axis inputs whose combined magnitude is at or below this are "no movement".
pub const MOVE_INPUT_EPSILON: f32 = 0.001;

/// Input facts for a locomotion controller.
///
/// Press edges are latched when the held state changes and consumed by the
/// next fixed tick, so a press sampled on a variable-rate frame is never lost
/// between fixed steps.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use fps_locomotion::prelude::*;
///
/// let mut input = LocomotionInput::new();
/// input.set_move_axis(Vec2::new(0.0, 1.0));
/// assert!(input.has_move_input());
///
/// // Facing yaw 0 looks down -Z, so "forward" is -Z in world space.
/// let wish = input.wish_direction(0.0);
/// assert!((wish - Vec3::NEG_Z).length() < 1e-6);
/// ```
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct LocomotionInput {
    /// Movement axis: `x` is right (+) / left (-), `y` is forward (+) / back (-).
    /// Each component is in `[-1, 1]`.
    pub move_axis: Vec2,
    /// Whether the run action is held.
    pub run_held: bool,
    /// Whether the jump action is held.
    pub jump_held: bool,
    /// Look motion accumulated since the last look update, in mouse units.
    pub look_delta: Vec2,

    // === Internal (managed by the controller) ===
    pub(crate) jump_press_latched: bool,
    pub(crate) run_press_latched: bool,
    pub(crate) run_toggled: bool,
}

impl LocomotionInput {
    /// Create an empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the movement axis. Each component is clamped to `[-1, 1]`.
    pub fn set_move_axis(&mut self, axis: Vec2) {
        self.move_axis = axis.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    /// Set whether the jump action is held. A released-to-held change latches
    /// a press for the next tick.
    pub fn set_jump_held(&mut self, held: bool) {
        if held && !self.jump_held {
            self.jump_press_latched = true;
        }
        self.jump_held = held;
    }

    /// Set whether the run action is held. A released-to-held change latches
    /// a press for the next tick (used by toggle sprinting).
    pub fn set_run_held(&mut self, held: bool) {
        if held && !self.run_held {
            self.run_press_latched = true;
        }
        self.run_held = held;
    }

    /// Accumulate look motion.
    pub fn add_look_delta(&mut self, delta: Vec2) {
        self.look_delta += delta;
    }

    /// Take the accumulated look motion, leaving zero.
    pub fn take_look_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.look_delta)
    }

    /// Release every action and zero the axis.
    pub fn clear(&mut self) {
        self.move_axis = Vec2::ZERO;
        self.run_held = false;
        self.jump_held = false;
        self.look_delta = Vec2::ZERO;
        self.jump_press_latched = false;
        self.run_press_latched = false;
    }

    /// Whether any movement input is present.
    #[inline]
    pub fn has_move_input(&self) -> bool {
        self.move_axis.x.abs() + self.move_axis.y.abs() > MOVE_INPUT_EPSILON
    }

    /// Whether a jump press is waiting to be consumed.
    #[inline]
    pub fn has_pending_jump_press(&self) -> bool {
        self.jump_press_latched
    }

    /// World-space wish vector for the given facing yaw.
    ///
    /// Not normalized: diagonal input has length up to `sqrt(2)`.
    pub fn wish_direction(&self, yaw: f32) -> Vec3 {
        let (sin, cos) = yaw.sin_cos();
        let forward = Vec3::new(-sin, 0.0, -cos);
        let right = Vec3::new(cos, 0.0, -sin);
        right * self.move_axis.x + forward * self.move_axis.y
    }

    /// Consume the latched jump press.
    pub(crate) fn take_jump_press(&mut self) -> bool {
        std::mem::take(&mut self.jump_press_latched)
    }

    /// Resolve whether sprinting is requested this tick, consuming the run
    /// press edge. Does not account for stamina.
    pub(crate) fn resolve_sprint(&mut self, config: &LocomotionConfig) -> bool {
        let pressed = std::mem::take(&mut self.run_press_latched);
        let sprint_state = match config.sprint_mode {
            SprintMode::Hold => self.run_held,
            SprintMode::Toggle => {
                if pressed {
                    self.run_toggled = !self.run_toggled;
                }
                self.run_toggled
            }
        };
        (sprint_state != config.run_by_default) && self.has_move_input()
    }
}
