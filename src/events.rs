//! Events and facts for cosmetic, audio and UI collaborators.
//!
//! The controller publishes discrete [`Event`]s (jumped, landed hard,
//! footstep) and a per-tick [`LocomotionFacts`] component. Nothing here
//! feeds back into the physics.

use bevy::prelude::*;

use crate::config::LocomotionConfig;
use crate::detection::GroundInfo;
use crate::integrator::BodyState;

/// Horizontal speed above which a grounded actor counts as moving for
/// footstep cadence.
pub const FOOTSTEP_MIN_SPEED: f32 = 0.1;

/// A jump launched this tick.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct Jumped {
    pub entity: Entity,
    pub launch_speed: f32,
}

/// The actor landed with a vertical speed above the landing threshold.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct LandedHard {
    pub entity: Entity,
    /// Vertical speed (magnitude) on the tick before touchdown.
    pub impact_speed: f32,
}

/// A footstep while moving on walkable ground.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct Footstep {
    pub entity: Entity,
    /// Whether the step was taken while sprinting.
    pub sprinting: bool,
}

/// Facts about the last tick, for collaborators that poll instead of
/// listening for events.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Default)]
#[reflect(Component)]
pub struct LocomotionFacts {
    pub grounded: bool,
    pub on_steep_slope: bool,
    pub near_wall: bool,
    /// Horizontal speed in units per second.
    pub horizontal_speed: f32,
    /// Horizontal speed as a fraction of full sprint speed. Zero off the ground.
    pub speed_ratio: f32,
    pub sprinting: bool,
    pub exhausted: bool,
    /// Stamina fill level in `[0, 1]`.
    pub stamina_ratio: f32,
    /// A jump launched this tick.
    pub just_jumped: bool,
    /// The actor touched down this tick (hard or soft).
    pub just_landed: bool,
}

/// What the tracker detected on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickFeedback {
    pub just_landed: bool,
    /// Impact speed of a hard landing.
    pub landed_hard: Option<f32>,
    /// A footstep was taken; the value is the sprint flag.
    pub footstep: Option<bool>,
}

/// Cross-tick memory for landing and footstep detection.
#[derive(Reflect, Debug, Clone, PartialEq, Default)]
pub struct FeedbackTracker {
    pub was_grounded: bool,
    /// Vertical velocity at the end of the previous tick.
    pub prev_vertical_velocity: f32,
    pub footstep_timer: f32,
    pub was_sprinting_for_steps: bool,
}

impl FeedbackTracker {
    /// Diff this tick against the previous one.
    ///
    /// `ground` is the post-step ground state and `body` the post-step body.
    pub fn observe(
        &mut self,
        ground: &GroundInfo,
        body: &BodyState,
        sprinting: bool,
        dt: f32,
        config: &LocomotionConfig,
    ) -> TickFeedback {
        let grounded = ground.is_grounded();
        let just_landed = !self.was_grounded && grounded;
        let impact_speed = self.prev_vertical_velocity.abs();
        let landed_hard = (just_landed && impact_speed > config.landing_threshold).then_some(impact_speed);

        self.was_grounded = grounded;
        self.prev_vertical_velocity = body.velocity.y;

        TickFeedback {
            just_landed,
            landed_hard,
            footstep: self.footstep(grounded, body.horizontal_speed(), sprinting, dt, config),
        }
    }

    fn footstep(
        &mut self,
        grounded: bool,
        horizontal_speed: f32,
        sprinting: bool,
        dt: f32,
        config: &LocomotionConfig,
    ) -> Option<bool> {
        if !grounded || horizontal_speed <= FOOTSTEP_MIN_SPEED {
            self.footstep_timer = 0.0;
            self.was_sprinting_for_steps = sprinting;
            return None;
        }

        let interval = if sprinting {
            config.run_step_interval
        } else {
            config.walk_step_interval
        };

        // Changing gait steps immediately.
        if sprinting != self.was_sprinting_for_steps {
            self.footstep_timer = interval;
            self.was_sprinting_for_steps = sprinting;
            return Some(sprinting);
        }

        self.footstep_timer -= dt;
        if self.footstep_timer <= 0.0 {
            self.footstep_timer = interval;
            Some(sprinting)
        } else {
            None
        }
    }
}

/// Horizontal speed as a fraction of full sprint speed; zero when not grounded.
pub fn speed_ratio(grounded: bool, horizontal_speed: f32, config: &LocomotionConfig) -> f32 {
    if !grounded {
        return 0.0;
    }
    let full = (config.move_speed * config.sprint_multiplier).max(f32::EPSILON);
    (horizontal_speed / full).clamp(0.0, 1.0)
}
