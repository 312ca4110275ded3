//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.
//!
//! Rapier owns collision response and velocity integration. The controller
//! writes the integrated velocity into [`Velocity`], applies the launch nudge
//! to the [`Transform`], and swaps [`Damping`] and [`Friction`] by support
//! state. Bodies must not receive Rapier's own gravity: use [`GravityScale`]
//! of zero (the bundle below does).

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::backend::{BodyCommit, LocomotionBackend};
use crate::config::{CapsuleShape, LocomotionConfig};
use crate::integrator::BodyState;
use crate::intent::LocomotionInput;
use crate::probe::{self, CapsulePose, GeometryProbe, ProbeHit, SensorReadings};
use crate::LocomotionSet;

/// Maximum time of impact for overlap tests done as zero-length casts.
const OVERLAP_CAST_DISTANCE: f32 = 1e-4;

/// Rapier3D physics backend for the locomotion controller.
///
/// Collision queries run in a dedicated sensor system that receives the
/// `RapierContext` as a system parameter; see [`RapierProbe`].
pub struct Rapier3dBackend;

impl LocomotionBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .or_else(|| world.get::<GlobalTransform>(entity).map(|t| t.translation()))
            .unwrap_or(Vec3::ZERO)
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn commit_body(world: &mut World, entity: Entity, commit: &BodyCommit) {
        if let Some(mut velocity) = world.get_mut::<Velocity>(entity) {
            velocity.linvel = commit.velocity;
        }
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation += commit.nudge;
            transform.rotation = Quat::from_rotation_y(commit.yaw);
        }
        if let Some(mut damping) = world.get_mut::<Damping>(entity) {
            damping.linear_damping = commit.damping;
        }
        if let Some(coefficient) = commit.friction {
            if let Some(mut friction) = world.get_mut::<Friction>(entity) {
                friction.coefficient = coefficient;
            }
        }
    }
}

/// Plugin that sets up Rapier3D-specific systems for the locomotion controller.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, rapier_sensors.in_set(LocomotionSet::Sensors));
    }
}

/// [`GeometryProbe`] over a Rapier collision world.
///
/// Excludes the controlled rigid body and all sensors, and honors the body's
/// collision groups when present.
pub struct RapierProbe<'a, 'w> {
    pub context: &'a RapierContext<'w>,
    pub exclude: Entity,
    pub groups: Option<CollisionGroups>,
}

impl RapierProbe<'_, '_> {
    fn filter(&self) -> QueryFilter<'static> {
        let mut filter = QueryFilter::default()
            .exclude_rigid_body(self.exclude)
            .exclude_sensors();
        if let Some(groups) = self.groups {
            filter = filter.groups(groups);
        }
        filter
    }
}

impl GeometryProbe for RapierProbe<'_, '_> {
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.context
            .cast_shape(
                center,
                Quat::IDENTITY,
                Vec3::NEG_Y,
                &Collider::ball(radius),
                ShapeCastOptions {
                    max_time_of_impact: OVERLAP_CAST_DISTANCE,
                    stop_at_penetration: true,
                    ..default()
                },
                self.filter(),
            )
            .is_some()
    }

    fn cast_sphere(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<ProbeHit> {
        self.context
            .cast_shape(
                origin,
                Quat::IDENTITY,
                direction,
                &Collider::ball(radius),
                ShapeCastOptions {
                    max_time_of_impact: max_distance,
                    stop_at_penetration: false,
                    ..default()
                },
                self.filter(),
            )
            .map(|(hit_entity, hit)| ProbeHit {
                distance: hit.time_of_impact,
                normal: hit.details.map(|d| d.normal1),
                entity: Some(hit_entity),
            })
    }
}

/// Read capsule dimensions from a collider, if it is a capsule.
pub fn capsule_from_collider(collider: &Collider) -> Option<CapsuleShape> {
    let capsule = collider.as_capsule()?;
    let segment = capsule.segment();
    let half_height = (segment.a() - segment.b()).length() / 2.0;
    Some(CapsuleShape::new(capsule.radius(), half_height))
}

/// Rapier-specific sensor system: fills [`SensorReadings`] for every
/// controller with a rigid body.
fn rapier_sensors(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<
        (
            Entity,
            &LocomotionConfig,
            &BodyState,
            &LocomotionInput,
            Option<&Collider>,
            Option<&CollisionGroups>,
            &mut SensorReadings,
        ),
        With<RigidBody>,
    >,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, config, body, input, collider, groups, mut readings) in &mut q_controllers {
        let shape = collider
            .and_then(capsule_from_collider)
            .unwrap_or(config.capsule);
        let probe = RapierProbe {
            context: &context,
            exclude: entity,
            groups: groups.copied(),
        };
        let pose = CapsulePose::new(body.position, shape);
        *readings = probe::sense(&probe, &pose, input.wish_direction(body.yaw), config);
    }
}

/// Physics components for a Rapier-driven locomotion body.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use fps_locomotion::prelude::*;
/// use fps_locomotion::rapier::Rapier3dCharacterBundle;
///
/// fn spawn_player(mut commands: Commands) {
///     let config = LocomotionConfig::player();
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         Rapier3dCharacterBundle::for_capsule(config.capsule),
///         LocomotionBundle::new(config),
///         LocalPlayer,
///     ));
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `locked_axes`: [`LockedAxes::ROTATION_LOCKED`], facing is set from yaw
/// - `gravity_scale`: `0.0`, the controller applies its own gravity
/// - `friction`: zero with the `Min` combine rule, so walls do not grab
/// - `collider`: capsule matching [`CapsuleShape::default`]
#[derive(Bundle)]
pub struct Rapier3dCharacterBundle {
    pub rigid_body: RigidBody,
    pub velocity: Velocity,
    pub locked_axes: LockedAxes,
    pub gravity_scale: GravityScale,
    pub damping: Damping,
    pub friction: Friction,
    pub collider: Collider,
}

impl Default for Rapier3dCharacterBundle {
    fn default() -> Self {
        Self::for_capsule(CapsuleShape::default())
    }
}

impl Rapier3dCharacterBundle {
    /// A bundle whose collider matches the given capsule.
    pub fn for_capsule(shape: CapsuleShape) -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            gravity_scale: GravityScale(0.0),
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 0.0,
            },
            friction: Friction {
                coefficient: 0.0,
                combine_rule: CoefficientCombineRule::Min,
            },
            collider: Collider::capsule_y(shape.half_height, shape.radius),
        }
    }

    /// Set the rigid body type for the character.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }
}
