//! Geometry probe.
//!
//! The probe is the controller's only view of the collision world. It answers
//! three read-only questions about a capsule pose: is there something solid at
//! the feet, what is the ground normal just below, and is there a wall in the
//! direction the actor wants to move. Physics backends provide the actual
//! queries by implementing [`GeometryProbe`]; the shapes, offsets and distances
//! of each query are fixed here so every backend senses the world the same way.

use bevy::prelude::*;

use crate::config::{CapsuleShape, LocomotionConfig};

/// Fraction of the body radius used for probe spheres, so sweeps never start
/// flush against the surface the body is resting on.
pub const PROBE_RADIUS_FACTOR: f32 = 0.95;

/// How far above the bottom sphere center the ground sweep starts.
pub const GROUND_SWEEP_LIFT: f32 = 0.07;

/// Extra wall sweep reach, as a fraction of the body radius.
pub const WALL_REACH_FACTOR: f32 = 0.6;

/// Wish vectors with a squared length at or below this are "no intent" and
/// skip the wall query.
pub const WALL_WISH_EPSILON: f32 = 0.01;

/// A single sweep hit.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct ProbeHit {
    /// Distance travelled along the sweep before contact.
    pub distance: f32,
    /// Surface normal at the contact, if the backend could recover one.
    pub normal: Option<Vec3>,
    /// Entity that was hit, if known.
    pub entity: Option<Entity>,
}

impl ProbeHit {
    pub fn new(distance: f32, normal: Vec3) -> Self {
        Self {
            distance,
            normal: Some(normal),
            entity: None,
        }
    }

    /// The normal if it is usable (finite and non-zero), normalized.
    pub fn usable_normal(&self) -> Option<Vec3> {
        self.normal.and_then(|n| n.try_normalize())
    }
}

/// Raw result of the ground query.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default)]
pub struct GroundQuery {
    /// Whether the overlap test at the feet found something solid.
    pub hit: bool,
    /// Normal recovered by the follow-up sweep. `None` when the sweep missed
    /// or returned a degenerate normal.
    pub normal: Option<Vec3>,
    /// Sweep distance to the surface, or zero when the sweep missed.
    pub distance: f32,
}

impl GroundQuery {
    /// No ground under the capsule.
    pub fn miss() -> Self {
        Self::default()
    }

    /// Solid ground with the given normal.
    pub fn surface(normal: Vec3, distance: f32) -> Self {
        Self {
            hit: true,
            normal: Some(normal),
            distance,
        }
    }
}

/// World-space pose of the capsule being probed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsulePose {
    /// Capsule center.
    pub position: Vec3,
    pub shape: CapsuleShape,
}

impl CapsulePose {
    pub fn new(position: Vec3, shape: CapsuleShape) -> Self {
        Self { position, shape }
    }

    /// Lowest point of the capsule.
    pub fn feet(&self) -> Vec3 {
        self.position - Vec3::Y * self.shape.bottom_offset()
    }

    /// Center of the bottom hemisphere.
    pub fn bottom_sphere_center(&self) -> Vec3 {
        self.position - Vec3::Y * self.shape.bottom_sphere_offset()
    }

    /// Center of the top hemisphere.
    pub fn top_sphere_center(&self) -> Vec3 {
        self.position + Vec3::Y * self.shape.half_height
    }
}

/// Collision queries a physics backend answers for the controller.
///
/// Implementations must ignore the actor's own collider and anything attached
/// to its own body.
pub trait GeometryProbe {
    /// Whether a sphere at `center` overlaps any solid geometry.
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> bool;

    /// Sweep a sphere from `origin` along `direction` (normalized) for at most
    /// `max_distance`, returning the first contact.
    fn cast_sphere(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<ProbeHit>;
}

/// Sensor results for one tick, written by the backend's sensor systems and
/// consumed by the locomotion tick.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct SensorReadings {
    pub ground: GroundQuery,
    /// Raw wall sweep hit, before the steepness check.
    pub wall: Option<ProbeHit>,
}

/// Check for ground under the capsule.
///
/// An overlap test at the feet decides contact; a short downward sweep from
/// just above the bottom sphere recovers the surface normal, since the overlap
/// itself carries none.
pub fn query_ground(
    probe: &impl GeometryProbe,
    pose: &CapsulePose,
    config: &LocomotionConfig,
) -> GroundQuery {
    if !probe.overlap_sphere(pose.feet(), config.ground_check_radius) {
        return GroundQuery::miss();
    }

    let radius = pose.shape.radius * PROBE_RADIUS_FACTOR;
    let origin = pose.bottom_sphere_center() + Vec3::Y * GROUND_SWEEP_LIFT;

    match probe.cast_sphere(origin, radius, Vec3::NEG_Y, config.ground_probe_distance) {
        Some(hit) => GroundQuery {
            hit: true,
            normal: hit.usable_normal(),
            distance: hit.distance,
        },
        None => GroundQuery {
            hit: true,
            normal: None,
            distance: 0.0,
        },
    }
}

/// Sweep for a wall along the horizontal wish direction.
///
/// Skipped (returns `None`) when there is no movement intent.
pub fn query_wall(
    probe: &impl GeometryProbe,
    pose: &CapsulePose,
    wish: Vec3,
    config: &LocomotionConfig,
) -> Option<ProbeHit> {
    let flat = Vec3::new(wish.x, 0.0, wish.z);
    if flat.length_squared() <= WALL_WISH_EPSILON {
        return None;
    }
    let direction = flat.try_normalize()?;

    let r = pose.shape.radius;
    let origin = pose.top_sphere_center() - direction * (r * config.wall_cast_back_offset);
    let distance = config.wall_probe_distance + r * WALL_REACH_FACTOR;

    probe.cast_sphere(origin, r * PROBE_RADIUS_FACTOR, direction, distance)
}

/// Run every query for one tick.
pub fn sense(
    probe: &impl GeometryProbe,
    pose: &CapsulePose,
    wish: Vec3,
    config: &LocomotionConfig,
) -> SensorReadings {
    SensorReadings {
        ground: query_ground(probe, pose, config),
        wall: query_wall(probe, pose, wish, config),
    }
}
