//! Longer-running float tests against Rapier3D.

#![cfg(feature = "rapier3d")]

use bevy::prelude::*;
use bevy::time::Virtual;
use bevy_rapier3d::prelude::*;
use floating_capsule_controller::prelude::*;

fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(TransformPlugin);
    app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
    app.add_plugins(CharacterControllerPlugin::<Rapier3dBackend>::default());
    app.insert_resource(Time::<Fixed>::from_hz(60.0));
    app.finish();
    app.cleanup();
    app
}

fn tick(app: &mut App) {
    let timestep = std::time::Duration::from_secs_f64(1.0 / 60.0);
    app.world_mut()
        .resource_mut::<Time<Virtual>>()
        .advance_by(timestep);
    app.update();
    app.world_mut().run_schedule(FixedUpdate);
    app.update();
}

fn spawn_character(app: &mut App, position: Vec3) -> Entity {
    let transform = Transform::from_translation(position);
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            CharacterController::new(),
            ControllerConfig::enemy(),
            SteeringIntent::Direction(Vec3::ZERO),
            Rapier3dCharacterBundle::tilt_locked(),
            Collider::capsule_y(0.5, 0.4),
        ))
        .id()
}

/// The spring should lower a character dropped slightly high onto its ride height.
#[test]
fn character_settles_at_ride_height() {
    let mut app = create_test_app();

    let ground = Transform::from_xyz(0.0, -0.5, 0.0);
    app.world_mut().spawn((
        ground,
        GlobalTransform::from(ground),
        RigidBody::Fixed,
        Collider::cuboid(50.0, 0.5, 50.0),
    ));
    let character = spawn_character(&mut app, Vec3::new(0.0, 2.2, 0.0));

    for _ in 0..300 {
        tick(&mut app);
    }

    let controller = app.world().get::<CharacterController>(character).unwrap();
    let ride_height = ControllerConfig::enemy().height.ride_height;
    assert!(controller.is_grounded);
    assert!(
        (controller.ground_distance() - ride_height).abs() < 0.15,
        "distance {} vs ride height {ride_height}",
        controller.ground_distance()
    );

    let velocity = app.world().get::<Velocity>(character).unwrap().linvel;
    assert!(velocity.length() < 0.5, "still moving at {velocity}");
}

/// Standing on a dynamic body pushes it down.
#[test]
fn character_weighs_down_dynamic_platform() {
    let mut app = create_test_app();

    let platform_transform = Transform::from_xyz(0.0, -0.25, 0.0);
    let platform = app
        .world_mut()
        .spawn((
            platform_transform,
            GlobalTransform::from(platform_transform),
            RigidBody::Dynamic,
            GravityScale(0.0),
            LockedAxes::TRANSLATION_LOCKED | LockedAxes::ROTATION_LOCKED,
            Collider::cuboid(3.0, 0.25, 3.0),
        ))
        .id();
    let character = spawn_character(&mut app, Vec3::new(0.0, 1.75, 0.0));

    for _ in 0..3 {
        tick(&mut app);
    }

    let controller = app.world().get::<CharacterController>(character).unwrap();
    assert_eq!(controller.ground_entity(), Some(platform));

    let force = app
        .world()
        .get::<ExternalForce>(platform)
        .map(|f| f.force)
        .unwrap_or_default();
    assert!(force.y < 0.0, "platform force {force}");
}
