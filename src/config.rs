//! Controller configuration components.
//!
//! This module defines the tuning for a locomotion controller: movement and
//! sprint speeds, the stamina resource, jump shape, slope limits, probe
//! dimensions and surface response. Every value has a sane range; values
//! outside it are reported by [`LocomotionConfig::validate`] and clamped by
//! [`LocomotionConfig::sanitized`] before the integrator ever sees them.

use bevy::prelude::*;
use thiserror::Error;

/// Error produced when a [`LocomotionConfig`] holds a value the controller
/// cannot operate on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("`{field}` must be a finite number")]
    NotFinite { field: &'static str },
    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("`{field}` must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("`{field}` must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("no-slide angle {no_slide} exceeds the walkable slope limit {max_slope}")]
    SlopeOrder { no_slide: f32, max_slope: f32 },
}

/// How the run action turns sprinting on and off.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SprintMode {
    /// Sprint while the run action is held.
    #[default]
    Hold,
    /// Each press of the run action flips sprinting on or off.
    Toggle,
}

/// Capsule body dimensions.
///
/// `half_height` is half the length of the inner segment, so the full
/// capsule height is `2 * (half_height + radius)`.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CapsuleShape {
    pub radius: f32,
    pub half_height: f32,
}

impl Default for CapsuleShape {
    fn default() -> Self {
        Self {
            radius: 0.5,
            half_height: 0.5,
        }
    }
}

impl CapsuleShape {
    pub fn new(radius: f32, half_height: f32) -> Self {
        Self {
            radius,
            half_height,
        }
    }

    /// Distance from the capsule center to its lowest point.
    #[inline]
    pub fn bottom_offset(&self) -> f32 {
        self.half_height + self.radius
    }

    /// Distance from the capsule center to the center of its bottom sphere.
    #[inline]
    pub fn bottom_sphere_offset(&self) -> f32 {
        self.half_height
    }
}

/// Configuration for a locomotion controller.
///
/// The defaults are tuned for a human-scale first-person player at roughly
/// 2 units tall. Construct with [`Default`] or [`LocomotionConfig::player`]
/// and adjust with the `with_*` builders.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LocomotionConfig {
    // === Movement Settings ===
    /// Base horizontal speed in units per second.
    pub move_speed: f32,
    /// Speed multiplier while sprinting.
    pub sprint_multiplier: f32,

    // === Stamina Settings ===
    /// Maximum sprint stamina. Must be at least 1.
    pub stamina_max: f32,
    /// Stamina drained per second of sprinting.
    pub stamina_drain_rate: f32,
    /// Stamina regained per second once regeneration starts.
    pub stamina_regen_rate: f32,
    /// Seconds after sprinting stops before stamina regenerates.
    pub stamina_regen_delay: f32,

    // === Sprint Input ===
    /// Whether the run action is held or toggled.
    pub sprint_mode: SprintMode,
    /// When true, holding the run action walks instead (hold mode), or the
    /// toggle starts in the sprinting position (toggle mode).
    pub run_by_default: bool,

    // === Jump Settings ===
    /// Apex height of a jump in units.
    pub jump_height: f32,
    /// Seconds to reach the apex. Gravity and launch speed derive from this.
    pub time_to_apex: f32,
    /// Seconds after a launch during which ground contact is ignored.
    pub post_jump_ground_ignore: f32,
    /// Gravity multiplier while falling.
    pub fall_gravity_multiplier: f32,
    /// Grace period after leaving ground during which a jump is still allowed.
    pub coyote_time: f32,
    /// How long a jump press is remembered before landing.
    pub jump_buffer_time: f32,
    /// Seconds after the controller starts before any jump is honored.
    pub startup_grace: f32,

    // === Ground Settings ===
    /// Radius of the overlap test at the feet.
    pub ground_check_radius: f32,
    /// Steepest walkable slope in degrees. Inclusive.
    pub max_slope_angle: f32,
    /// Slopes up to this angle (degrees) fully cancel gravity's slide.
    pub no_slide_angle: f32,
    /// Length of the downward sweep used to recover the ground normal.
    pub ground_probe_distance: f32,
    /// Acceleration pressing the body into slopes between the no-slide and
    /// max slope angles.
    pub stick_to_ground_accel: f32,

    // === Wall Settings ===
    /// Extra reach of the wall sweep beyond the body.
    pub wall_probe_distance: f32,
    /// Fraction of the radius the wall sweep starts behind the body.
    pub wall_cast_back_offset: f32,
    /// Dot product into a wall at or above which movement stops instead of
    /// sliding along it.
    pub head_on_stop_dot: f32,

    // === Acceleration Settings ===
    /// Horizontal acceleration while grounded.
    pub ground_accel: f32,
    /// Steady-state horizontal acceleration while airborne.
    pub air_accel: f32,
    /// Fraction of the target speed available while airborne.
    pub air_control: f32,
    /// Extra grounded acceleration while sprinting.
    pub sprint_accel_bonus: f32,
    /// Airborne acceleration right after a jump.
    pub air_accel_boost: f32,
    /// Seconds over which the boost decays to `air_accel`.
    pub air_accel_boost_time: f32,

    // === Surface Response ===
    /// Linear damping while supported by walkable ground.
    pub ground_damping: f32,
    /// Linear damping otherwise.
    pub air_damping: f32,
    /// Friction coefficient while supported. `None` leaves the collider's own.
    pub ground_friction: Option<f32>,
    /// Friction coefficient while airborne or sliding. `None` leaves the collider's own.
    pub air_friction: Option<f32>,

    // === Feedback Settings ===
    /// Vertical impact speed above which a landing counts as hard.
    pub landing_threshold: f32,
    /// Seconds between footsteps while walking.
    pub walk_step_interval: f32,
    /// Seconds between footsteps while sprinting.
    pub run_step_interval: f32,

    // === Body ===
    /// Capsule used by the probes. Physics backends may override this from
    /// the real collider.
    pub capsule: CapsuleShape,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            move_speed: 6.0,
            sprint_multiplier: 1.5,

            stamina_max: 100.0,
            stamina_drain_rate: 25.0,
            stamina_regen_rate: 20.0,
            stamina_regen_delay: 0.2,

            sprint_mode: SprintMode::Hold,
            run_by_default: false,

            jump_height: 1.6,
            time_to_apex: 0.28,
            post_jump_ground_ignore: 0.08,
            fall_gravity_multiplier: 2.2,
            coyote_time: 0.10,
            jump_buffer_time: 0.10,
            startup_grace: 0.20,

            ground_check_radius: 0.25,
            max_slope_angle: 45.0,
            no_slide_angle: 25.0,
            ground_probe_distance: 0.6,
            stick_to_ground_accel: 25.0,

            wall_probe_distance: 0.4,
            wall_cast_back_offset: 0.25,
            head_on_stop_dot: 0.90,

            ground_accel: 90.0,
            air_accel: 40.0,
            air_control: 0.85,
            sprint_accel_bonus: 60.0,
            air_accel_boost: 80.0,
            air_accel_boost_time: 0.22,

            ground_damping: 0.10,
            air_damping: 0.02,
            ground_friction: None,
            air_friction: None,

            landing_threshold: 6.0,
            walk_step_interval: 0.5,
            run_step_interval: 0.32,

            capsule: CapsuleShape::default(),
        }
    }
}

impl LocomotionConfig {
    /// Preset for a player character.
    pub fn player() -> Self {
        Self::default()
    }

    /// Preset for a heavier, slower character with no sprint boost in the air.
    pub fn heavy() -> Self {
        Self {
            move_speed: 4.5,
            sprint_multiplier: 1.3,
            jump_height: 1.0,
            time_to_apex: 0.32,
            air_control: 0.5,
            air_accel_boost: 40.0,
            ground_accel: 60.0,
            ..default()
        }
    }

    /// Top speed for this tick, in units per second.
    #[inline]
    pub fn max_speed(&self, sprinting: bool) -> f32 {
        if sprinting {
            self.move_speed * self.sprint_multiplier
        } else {
            self.move_speed
        }
    }

    /// Damping and optional friction for the given support state.
    pub fn surface_response(&self, supported: bool) -> (f32, Option<f32>) {
        if supported {
            (self.ground_damping, self.ground_friction)
        } else {
            (self.air_damping, self.air_friction)
        }
    }

    /// Set movement speed and sprint multiplier.
    pub fn with_move_speed(mut self, speed: f32, sprint_multiplier: f32) -> Self {
        self.move_speed = speed;
        self.sprint_multiplier = sprint_multiplier;
        self
    }

    /// Set the stamina pool and its rates.
    pub fn with_stamina(mut self, max: f32, drain_rate: f32, regen_rate: f32) -> Self {
        self.stamina_max = max;
        self.stamina_drain_rate = drain_rate;
        self.stamina_regen_rate = regen_rate;
        self
    }

    /// Set the delay before stamina regenerates.
    pub fn with_stamina_regen_delay(mut self, delay: f32) -> Self {
        self.stamina_regen_delay = delay;
        self
    }

    /// Set the jump apex height and time to reach it.
    pub fn with_jump(mut self, height: f32, time_to_apex: f32) -> Self {
        self.jump_height = height;
        self.time_to_apex = time_to_apex;
        self
    }

    /// Set the coyote time window.
    pub fn with_coyote_time(mut self, time: f32) -> Self {
        self.coyote_time = time;
        self
    }

    /// Set the jump buffer window.
    pub fn with_jump_buffer_time(mut self, time: f32) -> Self {
        self.jump_buffer_time = time;
        self
    }

    /// Set the startup grace period.
    pub fn with_startup_grace(mut self, time: f32) -> Self {
        self.startup_grace = time;
        self
    }

    /// Set the walkable and no-slide slope limits in degrees.
    pub fn with_slope_limits(mut self, max_slope: f32, no_slide: f32) -> Self {
        self.max_slope_angle = max_slope;
        self.no_slide_angle = no_slide;
        self
    }

    /// Set ground and air acceleration.
    pub fn with_acceleration(mut self, ground: f32, air: f32) -> Self {
        self.ground_accel = ground;
        self.air_accel = air;
        self
    }

    /// Set the fraction of speed available in the air.
    pub fn with_air_control(mut self, control: f32) -> Self {
        self.air_control = control;
        self
    }

    /// Set the sprint input mode.
    pub fn with_sprint_mode(mut self, mode: SprintMode, run_by_default: bool) -> Self {
        self.sprint_mode = mode;
        self.run_by_default = run_by_default;
        self
    }

    /// Set ground and air friction coefficients applied by the physics backend.
    pub fn with_friction(mut self, ground: f32, air: f32) -> Self {
        self.ground_friction = Some(ground);
        self.air_friction = Some(air);
        self
    }

    /// Set the hard-landing speed threshold.
    pub fn with_landing_threshold(mut self, threshold: f32) -> Self {
        self.landing_threshold = threshold;
        self
    }

    /// Set the capsule dimensions used by the probes.
    pub fn with_capsule(mut self, radius: f32, half_height: f32) -> Self {
        self.capsule = CapsuleShape::new(radius, half_height);
        self
    }

    /// Check every value against its sane range, reporting the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in self.scalar_fields() {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
        }

        let non_negative = [
            ("move_speed", self.move_speed),
            ("stamina_drain_rate", self.stamina_drain_rate),
            ("stamina_regen_rate", self.stamina_regen_rate),
            ("stamina_regen_delay", self.stamina_regen_delay),
            ("jump_height", self.jump_height),
            ("post_jump_ground_ignore", self.post_jump_ground_ignore),
            ("coyote_time", self.coyote_time),
            ("jump_buffer_time", self.jump_buffer_time),
            ("startup_grace", self.startup_grace),
            ("ground_check_radius", self.ground_check_radius),
            ("ground_probe_distance", self.ground_probe_distance),
            ("stick_to_ground_accel", self.stick_to_ground_accel),
            ("wall_probe_distance", self.wall_probe_distance),
            ("wall_cast_back_offset", self.wall_cast_back_offset),
            ("ground_accel", self.ground_accel),
            ("air_accel", self.air_accel),
            ("sprint_accel_bonus", self.sprint_accel_bonus),
            ("air_accel_boost", self.air_accel_boost),
            ("ground_damping", self.ground_damping),
            ("air_damping", self.air_damping),
            ("landing_threshold", self.landing_threshold),
            ("walk_step_interval", self.walk_step_interval),
            ("run_step_interval", self.run_step_interval),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.stamina_max < 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "stamina_max",
                value: self.stamina_max,
                min: 1.0,
                max: f32::MAX,
            });
        }
        if self.time_to_apex < MIN_TIME_TO_APEX {
            return Err(ConfigError::NotPositive {
                field: "time_to_apex",
                value: self.time_to_apex,
            });
        }
        if self.air_accel_boost_time <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "air_accel_boost_time",
                value: self.air_accel_boost_time,
            });
        }
        if self.capsule.radius <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "capsule.radius",
                value: self.capsule.radius,
            });
        }
        if self.capsule.half_height < 0.0 {
            return Err(ConfigError::Negative {
                field: "capsule.half_height",
                value: self.capsule.half_height,
            });
        }

        let ranged = [
            ("sprint_multiplier", self.sprint_multiplier, 1.0, 10.0),
            ("fall_gravity_multiplier", self.fall_gravity_multiplier, 1.0, 10.0),
            ("max_slope_angle", self.max_slope_angle, 0.0, 90.0),
            ("no_slide_angle", self.no_slide_angle, 0.0, 90.0),
            ("head_on_stop_dot", self.head_on_stop_dot, 0.0, 1.0),
            ("air_control", self.air_control, 0.0, 1.0),
        ];
        for (field, value, min, max) in ranged {
            if value < min || value > max {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    min,
                    max,
                });
            }
        }

        if self.no_slide_angle > self.max_slope_angle {
            return Err(ConfigError::SlopeOrder {
                no_slide: self.no_slide_angle,
                max_slope: self.max_slope_angle,
            });
        }

        for (field, value) in [
            ("ground_friction", self.ground_friction),
            ("air_friction", self.air_friction),
        ] {
            if let Some(value) = value {
                if value < 0.0 {
                    return Err(ConfigError::Negative { field, value });
                }
            }
        }

        Ok(())
    }

    /// Return a copy with every value clamped into its sane range.
    ///
    /// Non-finite values are replaced with the default for that field.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let finite = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };
        let non_negative = |value: f32, fallback: f32| finite(value, fallback).max(0.0);

        let max_slope_angle = finite(self.max_slope_angle, defaults.max_slope_angle).clamp(0.0, 90.0);
        let no_slide_angle = finite(self.no_slide_angle, defaults.no_slide_angle).clamp(0.0, max_slope_angle);

        Self {
            move_speed: non_negative(self.move_speed, defaults.move_speed),
            sprint_multiplier: finite(self.sprint_multiplier, defaults.sprint_multiplier).clamp(1.0, 10.0),

            stamina_max: finite(self.stamina_max, defaults.stamina_max).max(1.0),
            stamina_drain_rate: non_negative(self.stamina_drain_rate, defaults.stamina_drain_rate),
            stamina_regen_rate: non_negative(self.stamina_regen_rate, defaults.stamina_regen_rate),
            stamina_regen_delay: non_negative(self.stamina_regen_delay, defaults.stamina_regen_delay),

            sprint_mode: self.sprint_mode,
            run_by_default: self.run_by_default,

            jump_height: non_negative(self.jump_height, defaults.jump_height),
            time_to_apex: finite(self.time_to_apex, defaults.time_to_apex).max(MIN_TIME_TO_APEX),
            post_jump_ground_ignore: non_negative(self.post_jump_ground_ignore, defaults.post_jump_ground_ignore),
            fall_gravity_multiplier: finite(self.fall_gravity_multiplier, defaults.fall_gravity_multiplier)
                .clamp(1.0, 10.0),
            coyote_time: non_negative(self.coyote_time, defaults.coyote_time),
            jump_buffer_time: non_negative(self.jump_buffer_time, defaults.jump_buffer_time),
            startup_grace: non_negative(self.startup_grace, defaults.startup_grace),

            ground_check_radius: non_negative(self.ground_check_radius, defaults.ground_check_radius),
            max_slope_angle,
            no_slide_angle,
            ground_probe_distance: non_negative(self.ground_probe_distance, defaults.ground_probe_distance),
            stick_to_ground_accel: non_negative(self.stick_to_ground_accel, defaults.stick_to_ground_accel),

            wall_probe_distance: non_negative(self.wall_probe_distance, defaults.wall_probe_distance),
            wall_cast_back_offset: non_negative(self.wall_cast_back_offset, defaults.wall_cast_back_offset),
            head_on_stop_dot: finite(self.head_on_stop_dot, defaults.head_on_stop_dot).clamp(0.0, 1.0),

            ground_accel: non_negative(self.ground_accel, defaults.ground_accel),
            air_accel: non_negative(self.air_accel, defaults.air_accel),
            air_control: finite(self.air_control, defaults.air_control).clamp(0.0, 1.0),
            sprint_accel_bonus: non_negative(self.sprint_accel_bonus, defaults.sprint_accel_bonus),
            air_accel_boost: non_negative(self.air_accel_boost, defaults.air_accel_boost),
            air_accel_boost_time: {
                let t = finite(self.air_accel_boost_time, defaults.air_accel_boost_time);
                if t > 0.0 { t } else { defaults.air_accel_boost_time }
            },

            ground_damping: non_negative(self.ground_damping, defaults.ground_damping),
            air_damping: non_negative(self.air_damping, defaults.air_damping),
            ground_friction: self.ground_friction.map(|f| non_negative(f, 0.0)),
            air_friction: self.air_friction.map(|f| non_negative(f, 0.0)),

            landing_threshold: non_negative(self.landing_threshold, defaults.landing_threshold),
            walk_step_interval: non_negative(self.walk_step_interval, defaults.walk_step_interval),
            run_step_interval: non_negative(self.run_step_interval, defaults.run_step_interval),

            capsule: CapsuleShape {
                radius: {
                    let r = finite(self.capsule.radius, defaults.capsule.radius);
                    if r > 0.0 { r } else { defaults.capsule.radius }
                },
                half_height: non_negative(self.capsule.half_height, defaults.capsule.half_height),
            },
        }
    }

    fn scalar_fields(&self) -> [(&'static str, f32); 36] {
        [
            ("move_speed", self.move_speed),
            ("sprint_multiplier", self.sprint_multiplier),
            ("stamina_max", self.stamina_max),
            ("stamina_drain_rate", self.stamina_drain_rate),
            ("stamina_regen_rate", self.stamina_regen_rate),
            ("stamina_regen_delay", self.stamina_regen_delay),
            ("jump_height", self.jump_height),
            ("time_to_apex", self.time_to_apex),
            ("post_jump_ground_ignore", self.post_jump_ground_ignore),
            ("fall_gravity_multiplier", self.fall_gravity_multiplier),
            ("coyote_time", self.coyote_time),
            ("jump_buffer_time", self.jump_buffer_time),
            ("startup_grace", self.startup_grace),
            ("ground_check_radius", self.ground_check_radius),
            ("max_slope_angle", self.max_slope_angle),
            ("no_slide_angle", self.no_slide_angle),
            ("ground_probe_distance", self.ground_probe_distance),
            ("stick_to_ground_accel", self.stick_to_ground_accel),
            ("wall_probe_distance", self.wall_probe_distance),
            ("wall_cast_back_offset", self.wall_cast_back_offset),
            ("head_on_stop_dot", self.head_on_stop_dot),
            ("ground_accel", self.ground_accel),
            ("air_accel", self.air_accel),
            ("air_control", self.air_control),
            ("sprint_accel_bonus", self.sprint_accel_bonus),
            ("air_accel_boost", self.air_accel_boost),
            ("air_accel_boost_time", self.air_accel_boost_time),
            ("ground_damping", self.ground_damping),
            ("air_damping", self.air_damping),
            ("ground_friction", self.ground_friction.unwrap_or(0.0)),
            ("air_friction", self.air_friction.unwrap_or(0.0)),
            ("landing_threshold", self.landing_threshold),
            ("walk_step_interval", self.walk_step_interval),
            ("run_step_interval", self.run_step_interval),
            ("capsule.radius", self.capsule.radius),
            ("capsule.half_height", self.capsule.half_height),
        ]
    }
}

/// Smallest accepted time-to-apex. Anything shorter produces absurd gravity.
pub const MIN_TIME_TO_APEX: f32 = 0.01;
