//! Geometry probe tests against a real Rapier collision world.

use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use fps_locomotion::detection::slope_angle_degrees;
use fps_locomotion::prelude::*;
use fps_locomotion::probe::{self, CapsulePose};
use fps_locomotion::rapier::RapierProbe;

/// Create a minimal test app with a Rapier world.
fn create_test_app() -> App {
    let mut app = App::new();

    app.add_plugins(MinimalPlugins);
    app.add_plugins(TransformPlugin);
    app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());

    app.finish();
    app.cleanup();
    app
}

/// Let Rapier pick up new colliders and rebuild its query pipeline.
fn settle(app: &mut App) {
    for _ in 0..3 {
        app.update();
    }
}

/// Spawn a static box collider.
fn spawn_box(app: &mut App, transform: Transform, half_extents: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            transform,
            RigidBody::Fixed,
            Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
        ))
        .id()
}

/// A floor whose top face is at y = 0.
fn spawn_floor(app: &mut App) -> Entity {
    spawn_box(app, Transform::from_xyz(0.0, -0.5, 0.0), Vec3::new(50.0, 0.5, 50.0))
}

/// Run every probe query for a default capsule centered at `position`.
fn sense(
    app: &mut App,
    exclude: Entity,
    groups: Option<CollisionGroups>,
    position: Vec3,
    wish: Vec3,
) -> SensorReadings {
    app.world_mut()
        .run_system_once(move |rapier_context: ReadRapierContext| {
            let context = rapier_context.single().ok()?;
            let probe = RapierProbe {
                context: &context,
                exclude,
                groups,
            };
            let pose = CapsulePose::new(position, CapsuleShape::default());
            Some(probe::sense(&probe, &pose, wish, &LocomotionConfig::default()))
        })
        .expect("system ran")
        .expect("rapier context present")
}

// ==================== Ground Tests ====================

#[test]
fn capsule_on_floor_finds_ground() {
    let mut app = create_test_app();
    spawn_floor(&mut app);
    settle(&mut app);

    let readings = sense(&mut app, Entity::PLACEHOLDER, None, Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO);

    assert!(readings.ground.hit);
    let normal = readings.ground.normal.expect("sweep recovered a normal");
    assert!((normal - Vec3::Y).length() < 1e-3, "normal {normal}");
    assert!(readings.wall.is_none());
}

#[test]
fn capsule_above_floor_misses() {
    let mut app = create_test_app();
    spawn_floor(&mut app);
    settle(&mut app);

    let readings = sense(&mut app, Entity::PLACEHOLDER, None, Vec3::new(0.0, 3.0, 0.0), Vec3::ZERO);
    assert!(!readings.ground.hit);
}

#[test]
fn ramp_normal_gives_slope_angle() {
    let mut app = create_test_app();
    let angle = 30f32.to_radians();
    spawn_box(
        &mut app,
        Transform::from_rotation(Quat::from_rotation_x(angle)),
        Vec3::new(50.0, 0.5, 50.0),
    );
    settle(&mut app);

    // Feet about 0.1 above the tilted top face.
    let y = 1.0 + 0.6 / angle.cos();
    let readings = sense(&mut app, Entity::PLACEHOLDER, None, Vec3::new(0.0, y, 0.0), Vec3::ZERO);

    assert!(readings.ground.hit);
    let normal = readings.ground.normal.expect("sweep recovered a normal");
    assert!((slope_angle_degrees(normal) - 30.0).abs() < 0.5);
}

#[test]
fn own_body_is_ignored() {
    let mut app = create_test_app();
    let actor = app
        .world_mut()
        .spawn((
            Transform::from_xyz(0.0, 5.0, 0.0),
            RigidBody::KinematicPositionBased,
            Collider::capsule_y(0.5, 0.5),
        ))
        .id();
    settle(&mut app);

    let readings = sense(&mut app, actor, None, Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Z);
    assert!(!readings.ground.hit);
    assert!(readings.wall.is_none());
}

// ==================== Wall Tests ====================

#[test]
fn wall_ahead_is_detected() {
    let mut app = create_test_app();
    spawn_floor(&mut app);
    // Front face at z = -0.9.
    let wall = spawn_box(&mut app, Transform::from_xyz(0.0, 2.0, -1.15), Vec3::new(5.0, 3.0, 0.25));
    settle(&mut app);

    let readings = sense(&mut app, Entity::PLACEHOLDER, None, Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z);
    let hit = readings.wall.expect("wall hit");
    assert_eq!(hit.entity, Some(wall));
    let normal = hit.usable_normal().expect("wall normal");
    assert!((normal - Vec3::Z).length() < 1e-3, "normal {normal}");
    assert!((hit.distance - 0.55).abs() < 0.01, "distance {}", hit.distance);

    // Walking away from it.
    let readings = sense(&mut app, Entity::PLACEHOLDER, None, Vec3::new(0.0, 1.0, 0.0), Vec3::Z);
    assert!(readings.wall.is_none());
}

#[test]
fn collision_groups_filter_walls() {
    let mut app = create_test_app();
    spawn_floor(&mut app);
    let wall = spawn_box(&mut app, Transform::from_xyz(0.0, 2.0, -1.15), Vec3::new(5.0, 3.0, 0.25));
    app.world_mut()
        .entity_mut(wall)
        .insert(CollisionGroups::new(Group::GROUP_2, Group::ALL));
    settle(&mut app);

    let actor_groups = CollisionGroups::new(Group::GROUP_1, Group::GROUP_1);
    let readings = sense(
        &mut app,
        Entity::PLACEHOLDER,
        Some(actor_groups),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::NEG_Z,
    );
    assert!(readings.wall.is_none());
    assert!(readings.ground.hit, "floor stays visible");
}
