//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to drive a locomotion controller. The controller itself never touches
//! engine types: it reads the body's position and velocity through the
//! backend, asks the backend's sensor systems for [`SensorReadings`], and
//! hands the integrated result back through [`LocomotionBackend::commit_body`].
//!
//! [`SensorReadings`]: crate::probe::SensorReadings

use bevy::prelude::*;

use crate::config::CapsuleShape;

/// Result of one locomotion tick, handed to the backend for application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyCommit {
    /// Integrated capsule center.
    pub position: Vec3,
    /// New linear velocity.
    pub velocity: Vec3,
    /// Facing yaw in radians.
    pub yaw: f32,
    /// Instant displacement applied this tick (the jump lift-off nudge).
    /// Already included in `position`.
    pub nudge: Vec3,
    /// Linear damping the backend should apply.
    pub damping: f32,
    /// Friction coefficient to apply, if overridden.
    pub friction: Option<f32>,
    /// Capsule dimensions in use.
    pub shape: CapsuleShape,
    /// Fixed timestep the commit covers.
    pub dt: f32,
}

/// Trait for physics backend implementations.
///
/// Implement this trait to integrate a physics engine with the locomotion
/// controller. Besides the static methods below, the backend's plugin must
/// register a system in [`LocomotionSet::Sensors`] that fills every
/// controller's [`SensorReadings`] using [`probe::sense`] with a
/// [`GeometryProbe`] over its collision world.
///
/// Two backends ship with the crate: `Rapier3dBackend` (feature `rapier3d`)
/// and [`StaticWorldBackend`], an analytic half-space world for headless
/// simulation.
///
/// [`LocomotionSet::Sensors`]: crate::LocomotionSet::Sensors
/// [`SensorReadings`]: crate::probe::SensorReadings
/// [`probe::sense`]: crate::probe::sense
/// [`GeometryProbe`]: crate::probe::GeometryProbe
/// [`StaticWorldBackend`]: crate::static_world::StaticWorldBackend
pub trait LocomotionBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Get the current position (capsule center) of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec3;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec3;

    /// Apply the result of a locomotion tick to the physics body.
    ///
    /// # Arguments
    /// * `world` - The ECS world
    /// * `entity` - The controlled body
    /// * `commit` - Integrated state, damping and friction for this tick
    fn commit_body(world: &mut World, entity: Entity, commit: &BodyCommit);

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}
