//! Jump timing window.
//!
//! Decides each tick whether a requested jump can be honored, using coyote
//! time (a grace period after leaving ground) and input buffering (a grace
//! period before landing). Times are seconds of monotonic fixed-step
//! simulation time held in `f32`; sessions are assumed short enough that
//! precision loss never matters.

use bevy::prelude::*;

use crate::config::LocomotionConfig;

/// Gravity and launch speed derived from jump height and time to apex.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct JumpPhysics {
    /// Downward acceleration magnitude, `2h / t²`.
    pub gravity: f32,
    /// Upward launch speed, `g · t`.
    pub launch_speed: f32,
}

impl JumpPhysics {
    /// Derive from a jump height and time to apex.
    ///
    /// `time_to_apex` must be positive; configs are sanitized before this is
    /// called.
    pub fn new(jump_height: f32, time_to_apex: f32) -> Self {
        let gravity = 2.0 * jump_height / (time_to_apex * time_to_apex);
        Self {
            gravity,
            launch_speed: gravity * time_to_apex,
        }
    }

    pub fn from_config(config: &LocomotionConfig) -> Self {
        Self::new(config.jump_height, config.time_to_apex)
    }
}

/// Timers backing the jump decision.
#[derive(Reflect, Debug, Clone, Default, PartialEq)]
pub struct JumpWindow {
    /// Last time the actor stood on walkable ground.
    pub last_grounded_time: Option<f32>,
    /// Last time a jump press was registered.
    pub last_jump_pressed_time: Option<f32>,
    /// Remaining seconds during which ground contact is ignored.
    pub post_jump_ignore_timer: f32,
    /// Set when a launch was decided this tick; cleared at the next tick.
    pub jump_requested_this_tick: bool,
    /// Time of the first tick, for the startup grace period.
    pub started_at: Option<f32>,
}

impl JumpWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the post-jump ignore timer. Returns whether ground contact
    /// should be ignored this tick.
    pub fn tick_ground_ignore(&mut self, dt: f32) -> bool {
        if self.post_jump_ignore_timer > 0.0 {
            self.post_jump_ignore_timer -= dt;
            true
        } else {
            false
        }
    }

    /// Whether a press registered at `last_jump_pressed_time` is still live.
    pub fn is_buffered(&self, now: f32, config: &LocomotionConfig) -> bool {
        self.last_jump_pressed_time
            .is_some_and(|t| now - t <= config.jump_buffer_time)
    }

    /// Whether the actor is grounded or left ground recently enough.
    pub fn in_coyote(&self, grounded: bool, now: f32, config: &LocomotionConfig) -> bool {
        grounded
            || self
                .last_grounded_time
                .is_some_and(|t| now - t <= config.coyote_time)
    }

    /// Whether the startup grace period has elapsed.
    pub fn past_startup(&self, now: f32, config: &LocomotionConfig) -> bool {
        self.started_at
            .is_some_and(|t| now - t >= config.startup_grace)
    }

    /// Record this tick's facts and decide whether to launch a jump.
    ///
    /// A launch consumes both the buffered press and the coyote window, so
    /// one press launches at most once.
    pub fn should_launch(
        &mut self,
        grounded: bool,
        jump_pressed_this_tick: bool,
        now: f32,
        config: &LocomotionConfig,
    ) -> bool {
        self.jump_requested_this_tick = false;
        self.started_at.get_or_insert(now);

        if jump_pressed_this_tick {
            self.last_jump_pressed_time = Some(now);
        }
        if grounded {
            self.last_grounded_time = Some(now);
        }

        let launch = self.past_startup(now, config)
            && self.is_buffered(now, config)
            && self.in_coyote(grounded, now, config);

        if launch {
            self.jump_requested_this_tick = true;
            self.last_jump_pressed_time = None;
            self.last_grounded_time = None;
        }
        launch
    }

    /// Arm the ground-ignore timer after a launch.
    pub fn arm_ground_ignore(&mut self, config: &LocomotionConfig) {
        self.post_jump_ignore_timer = config.post_jump_ground_ignore;
    }
}
