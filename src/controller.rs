//! The per-tick locomotion pipeline.
//!
//! [`Locomotion`] holds the cross-tick controller state and runs the fixed
//! order every tick: classify ground and wall, decide the jump, update
//! stamina, integrate, then diff the result into events and facts.

use bevy::prelude::*;

use crate::config::LocomotionConfig;
use crate::detection::{classify, classify_wall, GroundInfo, WallInfo};
use crate::events::{speed_ratio, FeedbackTracker, LocomotionFacts, TickFeedback};
use crate::integrator::{integrate, BodyState, StepInput};
use crate::intent::LocomotionInput;
use crate::jump::{JumpPhysics, JumpWindow};
use crate::look::LookSettings;
use crate::probe::SensorReadings;
use crate::stamina::StaminaState;

/// Controller state carried between ticks.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct Locomotion {
    /// Ground classification from the last tick.
    pub ground: GroundInfo,
    /// Wall classification from the last tick.
    pub wall: WallInfo,
    pub jump: JumpWindow,
    pub stamina: StaminaState,
    pub feedback: FeedbackTracker,
    /// Seconds since the last launch, `INFINITY` while grounded.
    pub time_since_jump: f32,
    /// Whether the last tick sprinted.
    pub sprinting: bool,
    /// Launch nudge from the last tick, waiting to be committed.
    pub pending_nudge: Vec3,
}

impl Default for Locomotion {
    fn default() -> Self {
        Self::new(&LocomotionConfig::default())
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    /// Launch speed, when a jump launched.
    pub launched: Option<f32>,
    pub feedback: TickFeedback,
    pub nudge: Vec3,
}

impl Locomotion {
    /// Fresh controller state with a full stamina pool.
    pub fn new(config: &LocomotionConfig) -> Self {
        Self {
            ground: GroundInfo::airborne(),
            wall: WallInfo::default(),
            jump: JumpWindow::new(),
            stamina: StaminaState::full(config),
            feedback: FeedbackTracker::default(),
            time_since_jump: f32::INFINITY,
            sprinting: false,
            pending_nudge: Vec3::ZERO,
        }
    }

    /// Run one fixed tick.
    ///
    /// `now` is monotonic simulation time in seconds and `dt` the fixed step.
    pub fn tick(
        &mut self,
        config: &LocomotionConfig,
        body: &mut BodyState,
        input: &mut LocomotionInput,
        readings: &SensorReadings,
        now: f32,
        dt: f32,
    ) -> TickReport {
        let ignore_ground = self.jump.tick_ground_ignore(dt);
        let ground = classify(
            &readings.ground,
            config.max_slope_angle,
            config.no_slide_angle,
            ignore_ground,
        );
        self.wall = classify_wall(readings.wall.as_ref(), config.max_slope_angle);

        let pressed = input.take_jump_press();
        let launch = self.jump.should_launch(ground.is_grounded(), pressed, now, config);
        if launch {
            self.jump.arm_ground_ignore(config);
        }

        let wants_sprint = input.resolve_sprint(config);
        self.sprinting = self.stamina.update(wants_sprint, dt, config);

        let physics = JumpPhysics::from_config(config);
        let outcome = integrate(
            body,
            &StepInput {
                config,
                physics,
                ground,
                wall: self.wall,
                wish: input.wish_direction(body.yaw),
                sprinting: self.sprinting,
                launch,
                time_since_jump: self.time_since_jump,
                dt,
            },
        );
        self.ground = outcome.ground;
        self.time_since_jump = outcome.time_since_jump;
        self.pending_nudge = outcome.nudge;

        let feedback = self.feedback.observe(&self.ground, body, self.sprinting, dt, config);

        trace!(
            state = ?self.ground.state,
            slope = self.ground.slope_angle_degrees,
            wall = self.wall.near,
            speed = body.horizontal_speed(),
            max_speed = outcome.max_speed,
            accel = outcome.acceleration,
            "locomotion tick"
        );

        TickReport {
            launched: launch.then_some(physics.launch_speed),
            feedback,
            nudge: outcome.nudge,
        }
    }

    /// Facts for the tick that produced `report`.
    pub fn facts(&self, config: &LocomotionConfig, body: &BodyState, report: &TickReport) -> LocomotionFacts {
        let grounded = self.ground.is_grounded();
        let horizontal_speed = body.horizontal_speed();
        LocomotionFacts {
            grounded,
            on_steep_slope: self.ground.is_on_steep_slope(),
            near_wall: self.wall.near,
            horizontal_speed,
            speed_ratio: speed_ratio(grounded, horizontal_speed, config),
            sprinting: self.sprinting,
            exhausted: self.stamina.is_exhausted,
            stamina_ratio: self.stamina.ratio(config),
            just_jumped: report.launched.is_some(),
            just_landed: report.feedback.just_landed,
        }
    }
}

/// Everything a controlled actor needs besides its physics body.
///
/// Backends add their own components on top (see `Rapier3dCharacterBundle`
/// and [`StaticBody`](crate::static_world::StaticBody)).
#[derive(Bundle, Default)]
pub struct LocomotionBundle {
    pub config: LocomotionConfig,
    pub locomotion: Locomotion,
    pub body: BodyState,
    pub input: LocomotionInput,
    pub readings: SensorReadings,
    pub facts: LocomotionFacts,
    pub look: LookSettings,
}

impl LocomotionBundle {
    /// A bundle for the given config, with a matching stamina pool.
    pub fn new(config: LocomotionConfig) -> Self {
        Self {
            locomotion: Locomotion::new(&config),
            config,
            ..default()
        }
    }
}
