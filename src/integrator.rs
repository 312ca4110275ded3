//! Velocity integrator.
//!
//! The core physics step: combines the wish direction, acceleration curves,
//! slope handling, custom gravity and wall deflection into a new velocity and
//! position. Pure math over [`BodyState`]; the Bevy systems and physics
//! backends only move data in and out.

use bevy::math::FloatExt;
use bevy::prelude::*;

use crate::config::LocomotionConfig;
use crate::detection::{GroundInfo, WallInfo};
use crate::jump::JumpPhysics;

/// Distance the body is lifted along the ground normal on launch, so the
/// next contact query does not immediately re-collide.
pub const JUMP_NUDGE: f32 = 0.01;

/// Post-slope wish vectors shorter than this (squared) are left unnormalized.
const WISH_NORMALIZE_EPSILON: f32 = 1e-4;

/// Wish vectors shorter than this (squared) skip wall deflection.
const WALL_WISH_EPSILON: f32 = 1e-6;

/// Kinematic state of the controlled body.
///
/// Position and velocity have a single writer, the integrator; the physics
/// backend refreshes them from the engine at the start of each tick. Facing
/// is written by the look system.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Default)]
#[reflect(Component)]
pub struct BodyState {
    /// Capsule center in world space.
    pub position: Vec3,
    pub velocity: Vec3,
    /// Facing yaw in radians. Zero faces `-Z`.
    pub yaw: f32,
    /// Camera pitch in radians. Positive looks up.
    pub pitch: f32,
}

impl BodyState {
    /// A body at rest at the given position.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..default()
        }
    }

    /// Speed in the horizontal (XZ) plane.
    #[inline]
    pub fn horizontal_speed(&self) -> f32 {
        Vec2::new(self.velocity.x, self.velocity.z).length()
    }

    /// Rotation of the body from its yaw.
    pub fn body_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    /// Rotation of the view from yaw and pitch.
    pub fn view_rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }
}

/// Everything the integrator reads for one tick besides the body itself.
#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    pub config: &'a LocomotionConfig,
    pub physics: JumpPhysics,
    pub ground: GroundInfo,
    pub wall: WallInfo,
    /// Raw world-space wish vector from input.
    pub wish: Vec3,
    /// Whether the stamina gate allows sprinting this tick.
    pub sprinting: bool,
    /// Whether the jump window decided to launch this tick.
    pub launch: bool,
    /// Seconds since the last launch, `INFINITY` while grounded.
    pub time_since_jump: f32,
    pub dt: f32,
}

/// What the integrator decided for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Ground state after the step. A launch forces airborne.
    pub ground: GroundInfo,
    /// Displacement applied outside velocity integration.
    pub nudge: Vec3,
    pub time_since_jump: f32,
    /// Speed cap used for this tick.
    pub max_speed: f32,
    /// Horizontal acceleration used for this tick.
    pub acceleration: f32,
}

/// Advance the body by one fixed step.
///
/// Order: speed cap, slope projection, wall deflection, speed scaling,
/// acceleration choice, horizontal move-towards, jump launch, gravity, slope
/// gravity compensation, position integration.
pub fn integrate(body: &mut BodyState, input: &StepInput) -> StepOutcome {
    let config = input.config;
    let dt = input.dt;
    let mut ground = input.ground;

    let max_speed = config.max_speed(input.sprinting);

    let mut wish = input.wish;
    if ground.is_grounded() {
        wish = wish.reject_from_normalized(ground.normal);
        if wish.length_squared() > WISH_NORMALIZE_EPSILON {
            wish = wish.normalize();
        }
    }

    wish = deflect_from_wall(wish, &input.wall, config.head_on_stop_dot);
    wish = wish.clamp_length_max(1.0) * max_speed;

    let mut time_since_jump = input.time_since_jump;
    let acceleration = if ground.is_grounded() {
        time_since_jump = f32::INFINITY;
        config.ground_accel + if input.sprinting { config.sprint_accel_bonus } else { 0.0 }
    } else {
        time_since_jump += dt;
        wish *= config.air_control;
        let t = (time_since_jump / config.air_accel_boost_time).clamp(0.0, 1.0);
        config.air_accel_boost.lerp(config.air_accel, t)
    };

    let horizontal = move_towards(
        Vec2::new(body.velocity.x, body.velocity.z),
        Vec2::new(wish.x, wish.z),
        acceleration * dt,
    );
    body.velocity.x = horizontal.x;
    body.velocity.z = horizontal.y;

    let mut nudge = Vec3::ZERO;
    if input.launch {
        // Overrides any downward component.
        body.velocity.y = input.physics.launch_speed;
        nudge = ground.normal * JUMP_NUDGE;
        body.position += nudge;
        ground = GroundInfo::airborne();
        time_since_jump = 0.0;
    }

    let mut gravity = input.physics.gravity;
    if body.velocity.y < 0.0 {
        gravity *= config.fall_gravity_multiplier;
    }
    let gravity = Vec3::NEG_Y * gravity;
    body.velocity += gravity * dt;

    if ground.is_grounded() {
        if ground.within_no_slide {
            body.velocity -= gravity.reject_from_normalized(ground.normal) * dt;
        } else {
            body.velocity -= ground.normal * config.stick_to_ground_accel * dt;
        }
    }

    body.position += body.velocity * dt;

    StepOutcome {
        ground,
        nudge,
        time_since_jump,
        max_speed,
        acceleration,
    }
}

/// Stop a wish that drives head-on into a wall; slide one that grazes it.
pub fn deflect_from_wall(wish: Vec3, wall: &WallInfo, head_on_stop_dot: f32) -> Vec3 {
    let Some(normal) = wall.wall_normal() else {
        return wish;
    };
    if wish.length_squared() <= WALL_WISH_EPSILON {
        return wish;
    }
    let into = wish.normalize().dot(-normal);
    if into >= head_on_stop_dot {
        Vec3::ZERO
    } else {
        wish.reject_from_normalized(normal)
    }
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting.
pub fn move_towards(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_delta || distance == 0.0 {
        target
    } else {
        current + delta / distance * max_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{classify, GroundState};
    use crate::probe::GroundQuery;
    use approx::assert_abs_diff_eq;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    const DT: f32 = 0.02;

    fn flat_ground() -> GroundInfo {
        classify(&GroundQuery::surface(Vec3::Y, 0.0), 45.0, 25.0, false)
    }

    fn slope(degrees: f32) -> GroundInfo {
        let r = degrees.to_radians();
        classify(&GroundQuery::surface(Vec3::new(0.0, r.cos(), r.sin()), 0.0), 45.0, 25.0, false)
    }

    fn step<'a>(config: &'a LocomotionConfig, ground: GroundInfo, wish: Vec3) -> StepInput<'a> {
        StepInput {
            config,
            physics: JumpPhysics::from_config(config),
            ground,
            wall: WallInfo::default(),
            wish,
            sprinting: false,
            launch: false,
            time_since_jump: f32::INFINITY,
            dt: DT,
        }
    }

    // ==================== Helper Tests ====================

    #[test]
    fn move_towards_is_bounded() {
        let next = move_towards(Vec2::ZERO, Vec2::new(10.0, 0.0), 1.0);
        assert_eq!(next, Vec2::new(1.0, 0.0));
        let arrive = move_towards(Vec2::new(9.5, 0.0), Vec2::new(10.0, 0.0), 1.0);
        assert_eq!(arrive, Vec2::new(10.0, 0.0));
        assert_eq!(move_towards(Vec2::ONE, Vec2::ONE, 0.0), Vec2::ONE);
    }

    #[test]
    fn wall_head_on_stops() {
        let wall = WallInfo::new(Vec3::NEG_X);
        assert_eq!(deflect_from_wall(Vec3::X, &wall, 0.9), Vec3::ZERO);
    }

    #[test]
    fn wall_graze_slides() {
        let wall = WallInfo::new(Vec3::NEG_X);
        let wish = Vec3::new(1.0, 0.0, -1.0).normalize();
        let slid = deflect_from_wall(wish, &wall, 0.9);
        assert_abs_diff_eq!(slid.x, 0.0, epsilon = 1e-6);
        assert!(slid.z < 0.0);
    }

    #[test]
    fn no_wall_leaves_wish() {
        let wish = Vec3::new(0.3, 0.0, 0.4);
        assert_eq!(deflect_from_wall(wish, &WallInfo::default(), 0.9), wish);
    }

    // ==================== Speed Bound Tests ====================

    /// Flat, steep and airborne ground only: on walkable slopes the gravity
    /// compensation adds a horizontal component pointing into the surface,
    /// which contact resolution removes.
    #[test]
    fn horizontal_speed_never_exceeds_cap() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);

        for _ in 0..5_000 {
            let config = LocomotionConfig::default()
                .with_move_speed(rng.random_range(0.5..12.0), rng.random_range(1.0..3.0))
                .with_acceleration(rng.random_range(0.0..400.0), rng.random_range(0.0..400.0));
            let config = LocomotionConfig {
                air_accel_boost: rng.random_range(0.0..400.0),
                sprint_accel_bonus: rng.random_range(0.0..200.0),
                air_control: rng.random_range(0.0..1.0),
                ..config
            };

            let sprinting = rng.random_bool(0.5);
            let cap = config.max_speed(sprinting);
            let ground = match rng.random_range(0..3) {
                0 => flat_ground(),
                1 => slope(rng.random_range(46.0..89.0)),
                _ => GroundInfo::airborne(),
            };
            let wall = if rng.random_bool(0.3) {
                let angle: f32 = rng.random_range(0.0..std::f32::consts::TAU);
                WallInfo::new(Vec3::new(angle.cos(), 0.0, angle.sin()))
            } else {
                WallInfo::default()
            };

            let start = Vec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0))
                .clamp_length_max(1.0)
                * cap
                * rng.random_range(0.0_f32..1.0);
            let mut body = BodyState {
                velocity: Vec3::new(start.x, rng.random_range(-20.0..20.0), start.y),
                ..default()
            };

            let input = StepInput {
                wall,
                sprinting,
                launch: rng.random_bool(0.1),
                time_since_jump: rng.random_range(0.0..1.0),
                ..step(
                    &config,
                    ground,
                    Vec3::new(rng.random_range(-1.0..1.0), 0.0, rng.random_range(-1.0..1.0)),
                )
            };
            integrate(&mut body, &input);

            assert!(
                body.horizontal_speed() <= cap + 1e-4,
                "speed {} over cap {}",
                body.horizontal_speed(),
                cap
            );
        }
    }

    // ==================== Acceleration Tests ====================

    #[test]
    fn ground_acceleration_ramps_to_speed() {
        let config = LocomotionConfig::default();
        let mut body = BodyState::default();
        let outcome = integrate(&mut body, &step(&config, flat_ground(), Vec3::NEG_Z));
        assert_eq!(outcome.acceleration, 90.0);
        assert_abs_diff_eq!(body.horizontal_speed(), 90.0 * DT, epsilon = 1e-5);

        for _ in 0..10 {
            integrate(&mut body, &step(&config, flat_ground(), Vec3::NEG_Z));
        }
        assert_abs_diff_eq!(body.horizontal_speed(), 6.0, epsilon = 1e-5);
    }

    #[test]
    fn sprint_adds_bonus_acceleration() {
        let config = LocomotionConfig::default();
        let mut body = BodyState::default();
        let input = StepInput {
            sprinting: true,
            ..step(&config, flat_ground(), Vec3::NEG_Z)
        };
        let outcome = integrate(&mut body, &input);
        assert_eq!(outcome.acceleration, 150.0);
        assert_eq!(outcome.max_speed, 9.0);
    }

    #[test]
    fn air_boost_decays_to_air_accel() {
        let config = LocomotionConfig::default();
        let mut body = BodyState::default();

        let fresh = StepInput {
            time_since_jump: 0.0,
            ..step(&config, GroundInfo::airborne(), Vec3::NEG_Z)
        };
        let outcome = integrate(&mut body, &fresh);
        let expected = 80.0_f32.lerp(40.0, DT / 0.22);
        assert_abs_diff_eq!(outcome.acceleration, expected, epsilon = 1e-4);
        assert_abs_diff_eq!(outcome.time_since_jump, DT, epsilon = 1e-6);

        let settled = StepInput {
            time_since_jump: 1.0,
            ..step(&config, GroundInfo::airborne(), Vec3::NEG_Z)
        };
        assert_eq!(integrate(&mut body, &settled).acceleration, 40.0);
    }

    #[test]
    fn air_control_limits_target_speed() {
        let config = LocomotionConfig::default();
        let mut body = BodyState::default();
        for _ in 0..100 {
            integrate(&mut body, &step(&config, GroundInfo::airborne(), Vec3::NEG_Z));
        }
        assert_abs_diff_eq!(body.horizontal_speed(), 6.0 * 0.85, epsilon = 1e-4);
    }

    #[test]
    fn diagonal_wish_is_normalized() {
        let config = LocomotionConfig::default();
        let mut body = BodyState::default();
        for _ in 0..20 {
            integrate(&mut body, &step(&config, flat_ground(), Vec3::new(1.0, 0.0, -1.0)));
        }
        assert_abs_diff_eq!(body.horizontal_speed(), 6.0, epsilon = 1e-4);
    }

    // ==================== Slope Tests ====================

    #[test]
    fn wish_follows_slope_contour() {
        let config = LocomotionConfig::default();
        let ground = slope(20.0);
        let mut body = BodyState::default();
        let input = step(&config, ground, Vec3::NEG_Z);
        integrate(&mut body, &input);
        // Uphill along -Z on a ramp whose normal leans +Z: horizontal target
        // is shortened by the slope.
        let target_xz = 6.0 * 20f32.to_radians().cos();
        assert!(body.horizontal_speed() <= target_xz + 1e-4);
    }

    #[test]
    fn shallow_slope_cancels_sliding() {
        let config = LocomotionConfig::default();
        let ground = slope(20.0);
        assert!(ground.within_no_slide);
        let mut body = BodyState::default();
        integrate(&mut body, &step(&config, ground, Vec3::ZERO));
        // Only the into-slope component of gravity remains.
        let along_slope = body.velocity.reject_from_normalized(ground.normal);
        assert!(along_slope.length() < 1e-4, "slid by {along_slope}");
    }

    #[test]
    fn steeper_walkable_slope_sticks() {
        let config = LocomotionConfig::default();
        let ground = slope(35.0);
        assert!(ground.is_grounded());
        assert!(!ground.within_no_slide);
        let mut body = BodyState::default();
        integrate(&mut body, &step(&config, ground, Vec3::ZERO));
        let physics = JumpPhysics::from_config(&config);
        let expected = Vec3::NEG_Y * physics.gravity * DT - ground.normal * config.stick_to_ground_accel * DT;
        assert_abs_diff_eq!(body.velocity.x, expected.x, epsilon = 1e-4);
        assert_abs_diff_eq!(body.velocity.y, expected.y, epsilon = 1e-4);
        assert_abs_diff_eq!(body.velocity.z, expected.z, epsilon = 1e-4);
    }

    #[test]
    fn steep_slope_gets_air_handling() {
        let config = LocomotionConfig::default();
        let ground = slope(60.0);
        assert_eq!(ground.state, GroundState::OnSteepSlope);
        let mut body = BodyState::default();
        let outcome = integrate(&mut body, &step(&config, ground, Vec3::NEG_Z));
        assert_eq!(outcome.acceleration, 80.0_f32.lerp(40.0, 1.0));
    }

    // ==================== Gravity Tests ====================

    #[test]
    fn falling_uses_multiplier() {
        let config = LocomotionConfig::default();
        let physics = JumpPhysics::from_config(&config);

        let mut rising = BodyState {
            velocity: Vec3::Y * 5.0,
            ..default()
        };
        integrate(&mut rising, &step(&config, GroundInfo::airborne(), Vec3::ZERO));
        assert_abs_diff_eq!(rising.velocity.y, 5.0 - physics.gravity * DT, epsilon = 1e-4);

        let mut falling = BodyState {
            velocity: Vec3::NEG_Y * 5.0,
            ..default()
        };
        integrate(&mut falling, &step(&config, GroundInfo::airborne(), Vec3::ZERO));
        assert_abs_diff_eq!(falling.velocity.y, -5.0 - physics.gravity * 2.2 * DT, epsilon = 1e-4);
    }

    #[test]
    fn position_integrates_velocity() {
        let config = LocomotionConfig::default();
        let mut body = BodyState {
            position: Vec3::new(1.0, 2.0, 3.0),
            velocity: Vec3::new(0.0, 10.0, 0.0),
            ..default()
        };
        integrate(&mut body, &step(&config, GroundInfo::airborne(), Vec3::ZERO));
        assert_abs_diff_eq!(body.position.y, 2.0 + body.velocity.y * DT, epsilon = 1e-5);
    }

    // ==================== Launch Tests ====================

    #[test]
    fn launch_overrides_downward_velocity() {
        let config = LocomotionConfig::default();
        let physics = JumpPhysics::from_config(&config);
        let mut body = BodyState {
            velocity: Vec3::new(0.0, -3.0, 0.0),
            ..default()
        };
        let input = StepInput {
            launch: true,
            ..step(&config, flat_ground(), Vec3::ZERO)
        };
        let outcome = integrate(&mut body, &input);

        assert!(outcome.ground.is_airborne());
        assert_eq!(outcome.nudge, Vec3::Y * JUMP_NUDGE);
        assert_eq!(outcome.time_since_jump, 0.0);
        // Launch then one tick of rising gravity.
        assert_abs_diff_eq!(body.velocity.y, physics.launch_speed - physics.gravity * DT, epsilon = 1e-4);
        assert!(body.position.y > JUMP_NUDGE);
    }

    #[test]
    fn launch_from_slope_nudges_along_normal() {
        let config = LocomotionConfig::default();
        let ground = slope(20.0);
        let mut body = BodyState::default();
        let input = StepInput {
            launch: true,
            ..step(&config, ground, Vec3::ZERO)
        };
        let outcome = integrate(&mut body, &input);
        assert_abs_diff_eq!((outcome.nudge - ground.normal * JUMP_NUDGE).length(), 0.0, epsilon = 1e-7);
    }

    #[test]
    fn view_rotation_combines_yaw_and_pitch() {
        let body = BodyState {
            yaw: 0.0,
            pitch: 0.5,
            ..default()
        };
        let forward = body.view_rotation() * Vec3::NEG_Z;
        assert!(forward.y > 0.0, "positive pitch looks up");
        assert_eq!(body.body_rotation(), Quat::IDENTITY);
    }
}
