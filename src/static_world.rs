//! Static half-space world backend.
//!
//! A minimal physics backend for headless simulation and tests. The world is
//! a set of infinite planes, each bounding a solid half-space. The backend
//! integrates the body itself: committed positions are pushed out of any
//! plane the capsule penetrates and velocity into that plane is removed.

use bevy::prelude::*;

use crate::backend::{BodyCommit, LocomotionBackend};
use crate::config::{CapsuleShape, LocomotionConfig};
use crate::intent::LocomotionInput;
use crate::integrator::BodyState;
use crate::probe::{self, CapsulePose, GeometryProbe, ProbeHit, SensorReadings};

/// Rates toward a plane slower than this never reach it.
const PARALLEL_EPSILON: f32 = 1e-6;

/// An infinite plane. Points with `normal.dot(p) < offset` are solid.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct StaticPlane {
    /// Unit normal pointing out of the solid side.
    pub normal: Vec3,
    pub offset: f32,
}

impl StaticPlane {
    /// A plane with the given normal passing through `point`.
    ///
    /// A zero normal falls back to `Vec3::Y`.
    pub fn through_point(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.try_normalize().unwrap_or(Vec3::Y);
        Self {
            normal,
            offset: normal.dot(point),
        }
    }

    /// A horizontal floor at the given height.
    pub fn floor(height: f32) -> Self {
        Self {
            normal: Vec3::Y,
            offset: height,
        }
    }

    /// A ramp rising toward `-Z` at `angle_degrees`, passing through `point`.
    pub fn ramp(angle_degrees: f32, point: Vec3) -> Self {
        let angle = angle_degrees.to_radians();
        Self::through_point(Vec3::new(0.0, angle.cos(), angle.sin()), point)
    }

    /// Signed distance from the plane (positive on the open side).
    #[inline]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.offset
    }

    /// Sweep a sphere against this plane.
    fn cast_sphere(&self, origin: Vec3, radius: f32, direction: Vec3, max_distance: f32) -> Option<f32> {
        let start = self.signed_distance(origin);
        if start < radius {
            return Some(0.0);
        }
        let rate = self.normal.dot(direction);
        if rate > -PARALLEL_EPSILON {
            return None;
        }
        let distance = (start - radius) / -rate;
        (distance <= max_distance).then_some(distance)
    }
}

/// The collision world used by [`StaticWorldBackend`].
#[derive(Resource, Reflect, Debug, Clone, Default)]
#[reflect(Resource)]
pub struct StaticWorld {
    pub planes: Vec<StaticPlane>,
}

impl StaticWorld {
    pub fn new(planes: Vec<StaticPlane>) -> Self {
        Self { planes }
    }

    /// A world with a single flat floor.
    pub fn with_floor(height: f32) -> Self {
        Self::new(vec![StaticPlane::floor(height)])
    }

    /// Add a plane.
    pub fn with_plane(mut self, plane: StaticPlane) -> Self {
        self.planes.push(plane);
        self
    }

    /// Push a capsule out of every plane it penetrates, removing the velocity
    /// component into each plane it touched.
    pub fn resolve_capsule(&self, mut position: Vec3, mut velocity: Vec3, shape: CapsuleShape) -> (Vec3, Vec3) {
        // Two passes settle corners where pushing out of one plane moves the
        // body into another.
        for _ in 0..2 {
            for plane in &self.planes {
                let support = shape.half_height * plane.normal.y.abs() + shape.radius;
                let distance = plane.signed_distance(position);
                if distance < support {
                    position += plane.normal * (support - distance);
                    let into = velocity.dot(plane.normal);
                    if into < 0.0 {
                        velocity -= plane.normal * into;
                    }
                }
            }
        }
        (position, velocity)
    }
}

impl GeometryProbe for StaticWorld {
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes.iter().any(|p| p.signed_distance(center) < radius)
    }

    fn cast_sphere(&self, origin: Vec3, radius: f32, direction: Vec3, max_distance: f32) -> Option<ProbeHit> {
        self.planes
            .iter()
            .filter_map(|plane| {
                plane
                    .cast_sphere(origin, radius, direction, max_distance)
                    .map(|distance| ProbeHit::new(distance, plane.normal))
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

/// Velocity storage for bodies simulated by [`StaticWorldBackend`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct StaticBody {
    pub velocity: Vec3,
}

/// Physics backend over a [`StaticWorld`] resource.
///
/// Bodies need a `Transform` and a [`StaticBody`].
pub struct StaticWorldBackend;

impl LocomotionBackend for StaticWorldBackend {
    fn plugin() -> impl Plugin {
        StaticWorldBackendPlugin
    }

    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .unwrap_or(Vec3::ZERO)
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<StaticBody>(entity)
            .map(|b| b.velocity)
            .unwrap_or(Vec3::ZERO)
    }

    fn commit_body(world: &mut World, entity: Entity, commit: &BodyCommit) {
        let (position, velocity) = world
            .get_resource::<StaticWorld>()
            .map(|w| w.resolve_capsule(commit.position, commit.velocity, commit.shape))
            .unwrap_or((commit.position, commit.velocity));

        // Same linear damping model as rapier.
        let velocity = velocity / (1.0 + commit.dt * commit.damping);

        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation = position;
            transform.rotation = Quat::from_rotation_y(commit.yaw);
        }
        if let Some(mut body) = world.get_mut::<StaticBody>(entity) {
            body.velocity = velocity;
        }
    }
}

/// Plugin that sets up the static world resource and its sensor system.
pub struct StaticWorldBackendPlugin;

impl Plugin for StaticWorldBackendPlugin {
    fn build(&self, app: &mut App) {
        use crate::LocomotionSet;

        app.register_type::<StaticWorld>();
        app.register_type::<StaticBody>();
        app.init_resource::<StaticWorld>();

        app.add_systems(
            FixedUpdate,
            static_world_sensors.in_set(LocomotionSet::Sensors),
        );
    }
}

fn static_world_sensors(
    static_world: Res<StaticWorld>,
    mut q_bodies: Query<
        (
            &LocomotionConfig,
            &BodyState,
            &LocomotionInput,
            &mut SensorReadings,
        ),
        With<StaticBody>,
    >,
) {
    for (config, body, input, mut readings) in &mut q_bodies {
        let pose = CapsulePose::new(body.position, config.capsule);
        let wish = input.wish_direction(body.yaw);
        *readings = probe::sense(&*static_world, &pose, wish, config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Plane Tests ====================

    #[test]
    fn plane_signed_distance() {
        let floor = StaticPlane::floor(1.0);
        assert_eq!(floor.signed_distance(Vec3::new(5.0, 3.0, -2.0)), 2.0);
        assert_eq!(floor.signed_distance(Vec3::new(0.0, 0.5, 0.0)), -0.5);
    }

    #[test]
    fn through_point_normalizes() {
        let plane = StaticPlane::through_point(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(plane.normal, Vec3::Y);
        assert_eq!(plane.offset, 3.0);

        let fallback = StaticPlane::through_point(Vec3::ZERO, Vec3::ZERO);
        assert_eq!(fallback.normal, Vec3::Y);
    }

    #[test]
    fn ramp_normal_matches_angle() {
        let ramp = StaticPlane::ramp(30.0, Vec3::ZERO);
        let angle = ramp.normal.angle_between(Vec3::Y).to_degrees();
        assert!((angle - 30.0).abs() < 1e-3);
    }

    // ==================== Probe Tests ====================

    #[test]
    fn cast_reports_nearest_plane() {
        let world = StaticWorld::with_floor(0.0).with_plane(StaticPlane::floor(-5.0));
        let hit = world
            .cast_sphere(Vec3::new(0.0, 2.0, 0.0), 0.5, Vec3::NEG_Y, 10.0)
            .expect("floor below");
        assert!((hit.distance - 1.5).abs() < 1e-6);
        assert_eq!(hit.normal, Some(Vec3::Y));
    }

    #[test]
    fn cast_starting_inside_hits_at_zero() {
        let world = StaticWorld::with_floor(0.0);
        let hit = world
            .cast_sphere(Vec3::new(0.0, 0.2, 0.0), 0.5, Vec3::X, 1.0)
            .expect("penetrating");
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn cast_parallel_or_away_misses() {
        let world = StaticWorld::with_floor(0.0);
        assert!(world.cast_sphere(Vec3::Y * 2.0, 0.5, Vec3::X, 10.0).is_none());
        assert!(world.cast_sphere(Vec3::Y * 2.0, 0.5, Vec3::Y, 10.0).is_none());
        assert!(world.cast_sphere(Vec3::Y * 2.0, 0.5, Vec3::NEG_Y, 1.0).is_none());
    }

    #[test]
    fn overlap_sphere_checks_every_plane() {
        let world = StaticWorld::with_floor(0.0)
            .with_plane(StaticPlane::through_point(Vec3::NEG_X, Vec3::new(2.0, 0.0, 0.0)));
        assert!(world.overlap_sphere(Vec3::new(0.0, 0.2, 0.0), 0.25));
        assert!(world.overlap_sphere(Vec3::new(1.9, 5.0, 0.0), 0.25));
        assert!(!world.overlap_sphere(Vec3::new(0.0, 5.0, 0.0), 0.25));
    }

    // ==================== Resolve Tests ====================

    #[test]
    fn resolve_lifts_capsule_out_of_floor() {
        let world = StaticWorld::with_floor(0.0);
        let (position, velocity) =
            world.resolve_capsule(Vec3::new(0.0, 0.8, 0.0), Vec3::new(3.0, -4.0, 0.0), CapsuleShape::default());
        assert!((position.y - 1.0).abs() < 1e-6);
        assert_eq!(velocity, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn resolve_leaves_separating_velocity() {
        let world = StaticWorld::with_floor(0.0);
        let (_, velocity) =
            world.resolve_capsule(Vec3::new(0.0, 0.9, 0.0), Vec3::new(0.0, 2.0, 0.0), CapsuleShape::default());
        assert_eq!(velocity, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn resolve_uses_radius_against_walls() {
        let world = StaticWorld::new(vec![StaticPlane::through_point(
            Vec3::NEG_X,
            Vec3::new(1.0, 0.0, 0.0),
        )]);
        let (position, velocity) =
            world.resolve_capsule(Vec3::new(0.8, 1.0, 0.0), Vec3::new(2.0, 0.0, 1.0), CapsuleShape::default());
        assert!((position.x - 0.5).abs() < 1e-6);
        assert_eq!(velocity, Vec3::new(0.0, 0.0, 1.0));
    }
}
