//! Platform Follow Demo
//!
//! A headless run of a character standing on a turning platform:
//! - A kinematic platform spins about Y at a fixed rate
//! - The character is a child of the platform and stands still on it
//! - Its upright target picks up the platform's yaw each tick
//!
//! Every half second the demo logs the platform yaw next to the character's
//! target yaw, then exits after ten seconds of simulated time.
//!
//! Run with `cargo run --example platform_follow`.

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use floating_capsule_controller::prelude::*;

// ==================== Constants ====================

const PLATFORM_HALF_EXTENTS: Vec3 = Vec3::new(4.0, 0.25, 4.0);
const PLATFORM_SPIN: f32 = 0.5; // rad/s about Y

const CHARACTER_HALF_HEIGHT: f32 = 0.5;
const CHARACTER_RADIUS: f32 = 0.4;

const FIXED_HZ: f64 = 60.0;
const REPORT_EVERY: u32 = 30;
const RUN_TICKS: u32 = 600;

// ==================== Main ====================

fn main() {
    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(
            Duration::from_secs_f64(1.0 / FIXED_HZ),
        )))
        .add_plugins(LogPlugin::default())
        .add_plugins(TransformPlugin)
        // Physics
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
        // Character controller
        .add_plugins(CharacterControllerPlugin::<Rapier3dBackend>::default())
        .insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
        .add_systems(Startup, setup)
        .add_systems(
            FixedUpdate,
            spin_platform.before(CharacterControllerSet::Preparation),
        )
        .add_systems(
            FixedUpdate,
            report_yaw.after(CharacterControllerSet::FinalApplication),
        )
        .run();
}

// ==================== Components ====================

#[derive(Component)]
struct Platform;

#[derive(Component)]
struct Rider;

// ==================== Setup ====================

fn setup(mut commands: Commands) {
    let platform = commands
        .spawn((
            Platform,
            Transform::default(),
            RigidBody::KinematicPositionBased,
            Collider::cuboid(
                PLATFORM_HALF_EXTENTS.x,
                PLATFORM_HALF_EXTENTS.y,
                PLATFORM_HALF_EXTENTS.z,
            ),
        ))
        .id();

    let config = ControllerConfig::enemy();
    let start_height = PLATFORM_HALF_EXTENTS.y + config.height.ride_height;

    commands.spawn((
        Rider,
        Transform::from_xyz(0.0, start_height, 0.0),
        ChildOf(platform),
        CharacterController::new(),
        config,
        SteeringIntent::Direction(Vec3::ZERO),
        Rapier3dCharacterBundle::tilt_locked(),
        Collider::capsule_y(CHARACTER_HALF_HEIGHT, CHARACTER_RADIUS),
    ));

    info!("platform spinning at {PLATFORM_SPIN} rad/s, rider at height {start_height}");
}

// ==================== Systems ====================

fn spin_platform(time: Res<Time>, mut platforms: Query<&mut Transform, With<Platform>>) {
    for mut transform in &mut platforms {
        transform.rotate_y(PLATFORM_SPIN * time.delta_secs());
    }
}

fn yaw(rotation: Quat) -> f32 {
    rotation.to_euler(EulerRot::YXZ).0
}

fn report_yaw(
    mut ticks: Local<u32>,
    platforms: Query<&GlobalTransform, With<Platform>>,
    riders: Query<&CharacterController, With<Rider>>,
    mut exit: EventWriter<AppExit>,
) {
    *ticks += 1;

    if *ticks % REPORT_EVERY == 0 {
        if let (Ok(platform), Ok(controller)) = (platforms.single(), riders.single()) {
            let (_, platform_rotation, _) = platform.to_scale_rotation_translation();
            info!(
                "tick {:>4}: platform yaw {:+.3}, target yaw {:+.3}, grounded {}",
                *ticks,
                yaw(platform_rotation),
                yaw(controller.upright_target),
                controller.is_grounded,
            );
        }
    }

    if *ticks >= RUN_TICKS {
        exit.write(AppExit::Success);
    }
}
