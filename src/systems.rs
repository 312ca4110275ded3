//! Core controller systems.
//!
//! These systems move data between the ECS, the physics backend and the
//! engine-agnostic controller in [`crate::controller`]. The exclusive ones
//! are generic over the backend so different physics engines can be used.

use bevy::prelude::*;

use crate::backend::{BodyCommit, LocomotionBackend};
use crate::config::LocomotionConfig;
use crate::controller::Locomotion;
use crate::events::{Footstep, Jumped, LandedHard, LocomotionFacts};
use crate::integrator::BodyState;
use crate::intent::LocomotionInput;
use crate::probe::SensorReadings;
use crate::state::{Airborne, Grounded, OnSteepSlope, TouchingWall};

/// Validate configs that changed since the last tick, replacing invalid ones
/// with their sanitized form.
pub fn sanitize_changed_configs(
    mut q_configs: Query<(Entity, &mut LocomotionConfig), Changed<LocomotionConfig>>,
) {
    for (entity, mut config) in &mut q_configs {
        if let Err(err) = config.validate() {
            warn!("invalid locomotion config on {entity}: {err}; clamping into range");
            let sanitized = config.clone().sanitized();
            *config = sanitized;
        }
    }
}

/// Refresh each body's position and velocity from the physics backend.
pub fn sync_body_from_backend<B: LocomotionBackend>(world: &mut World) {
    let entities: Vec<Entity> = world
        .query_filtered::<Entity, (With<Locomotion>, With<BodyState>)>()
        .iter(world)
        .collect();

    for entity in entities {
        let position = B::get_position(world, entity);
        let velocity = B::get_velocity(world, entity);
        if let Some(mut body) = world.get_mut::<BodyState>(entity) {
            body.position = position;
            body.velocity = velocity;
        }
    }
}

/// Run one locomotion tick for every controller and publish the results.
pub fn locomotion_tick(
    time: Res<Time>,
    mut q_controllers: Query<(
        Entity,
        &LocomotionConfig,
        &mut Locomotion,
        &mut BodyState,
        &mut LocomotionInput,
        &SensorReadings,
        &mut LocomotionFacts,
    )>,
    mut jumped: EventWriter<Jumped>,
    mut landed: EventWriter<LandedHard>,
    mut footsteps: EventWriter<Footstep>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }
    let now = time.elapsed_secs();

    for (entity, config, mut locomotion, mut body, mut input, readings, mut facts) in &mut q_controllers {
        let report = locomotion.tick(config, &mut body, &mut input, readings, now, dt);

        if let Some(launch_speed) = report.launched {
            debug!("{entity} jumped at {launch_speed:.2} u/s");
            jumped.write(Jumped { entity, launch_speed });
        }
        if let Some(impact_speed) = report.feedback.landed_hard {
            debug!("{entity} landed hard at {impact_speed:.2} u/s");
            landed.write(LandedHard { entity, impact_speed });
        }
        if let Some(sprinting) = report.feedback.footstep {
            footsteps.write(Footstep { entity, sprinting });
        }

        *facts = locomotion.facts(config, &body, &report);
    }
}

/// Synchronize state marker components with the controller state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &Locomotion,
        Has<Grounded>,
        Has<Airborne>,
        Option<&OnSteepSlope>,
        Option<&TouchingWall>,
    )>,
) {
    for (entity, locomotion, has_grounded, has_airborne, steep, wall) in &q_controllers {
        let ground = &locomotion.ground;
        let mut entity_commands = commands.entity(entity);

        if ground.is_grounded() != has_grounded {
            if has_grounded {
                entity_commands.remove::<Grounded>();
            } else {
                entity_commands.insert(Grounded);
            }
        }
        if ground.is_airborne() != has_airborne {
            if has_airborne {
                entity_commands.remove::<Airborne>();
            } else {
                entity_commands.insert(Airborne);
            }
        }

        match (ground.is_on_steep_slope(), steep) {
            (true, Some(s)) if s.angle_degrees == ground.slope_angle_degrees => {}
            (true, _) => {
                entity_commands.insert(OnSteepSlope {
                    angle_degrees: ground.slope_angle_degrees,
                });
            }
            (false, Some(_)) => {
                entity_commands.remove::<OnSteepSlope>();
            }
            (false, None) => {}
        }

        match (locomotion.wall.wall_normal(), wall) {
            (Some(normal), Some(w)) if w.normal == normal => {}
            (Some(normal), _) => {
                entity_commands.insert(TouchingWall::new(normal));
            }
            (None, Some(_)) => {
                entity_commands.remove::<TouchingWall>();
            }
            (None, None) => {}
        }
    }
}

/// Hand each tick's result to the physics backend.
pub fn commit_body<B: LocomotionBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let commits: Vec<(Entity, BodyCommit)> = world
        .query::<(Entity, &LocomotionConfig, &Locomotion, &BodyState)>()
        .iter(world)
        .map(|(entity, config, locomotion, body)| {
            let (damping, friction) = config.surface_response(locomotion.ground.is_grounded());
            let commit = BodyCommit {
                position: body.position,
                velocity: body.velocity,
                yaw: body.yaw,
                nudge: locomotion.pending_nudge,
                damping,
                friction,
                shape: config.capsule,
                dt,
            };
            (entity, commit)
        })
        .collect();

    for (entity, commit) in commits {
        B::commit_body(world, entity, &commit);
        if let Some(mut locomotion) = world.get_mut::<Locomotion>(entity) {
            locomotion.pending_nudge = Vec3::ZERO;
        }
    }
}
