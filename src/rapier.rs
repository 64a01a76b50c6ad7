//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature (on by default).
//!
//! Engine gravity stays enabled: the height spring reads it back through
//! [`CharacterPhysicsBackend::get_gravity`] and cancels it while grounded.
//! For deterministic control, run Rapier in the fixed schedule:
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_rapier3d::prelude::*;
//! use floating_capsule_controller::prelude::*;
//!
//! App::new()
//!     .add_plugins(MinimalPlugins)
//!     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
//!     .add_plugins(CharacterControllerPlugin::<Rapier3dBackend>::default())
//!     .run();
//! ```

use bevy::prelude::*;
use bevy_rapier3d::geometry::Group;
use bevy_rapier3d::prelude::*;

use crate::backend::{accumulate, CharacterPhysicsBackend, ForceAccumulator};
use crate::collision::CollisionData;
use crate::config::ControllerConfig;
use crate::controller::CharacterController;
use crate::detection::{GroundProbe, DOWN};

/// Rapier3D physics backend for the character controller.
///
/// Forces go through the [`ForceAccumulator`] and are written into
/// Rapier's `ExternalForce` at the end of the controller tick. Ground
/// sensing is a dedicated system that receives the Rapier context as a
/// system parameter.
pub struct Rapier3dBackend;

impl CharacterPhysicsBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn get_angular_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.angvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn get_rotation(world: &World, entity: Entity) -> Quat {
        world
            .get::<GlobalTransform>(entity)
            .map(|t| t.rotation())
            .or_else(|| world.get::<Transform>(entity).map(|t| t.rotation))
            .unwrap_or(Quat::IDENTITY)
    }

    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<GlobalTransform>(entity)
            .map(|t| t.translation())
            .or_else(|| world.get::<Transform>(entity).map(|t| t.translation))
            .unwrap_or(Vec3::ZERO)
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec3) {
        accumulate(world, entity, force, Vec3::ZERO);
    }

    fn apply_force_at_point(world: &mut World, entity: Entity, force: Vec3, point: Vec3) {
        let torque = (point - center_of_mass(world, entity)).cross(force);
        accumulate(world, entity, force, torque);
    }

    fn apply_torque(world: &mut World, entity: Entity, torque: Vec3) {
        accumulate(world, entity, Vec3::ZERO, torque);
    }

    fn is_dynamic(world: &World, entity: Entity) -> bool {
        matches!(world.get::<RigidBody>(entity), Some(RigidBody::Dynamic))
    }

    fn get_mass(world: &World, entity: Entity) -> f32 {
        world
            .get::<ReadMassProperties>(entity)
            .map(|props| props.mass)
            .filter(|mass| *mass > 0.0 && mass.is_finite())
            .unwrap_or(1.0)
    }

    fn get_gravity(world: &World, entity: Entity) -> Option<Vec3> {
        let gravity = world
            .try_query::<&RapierConfiguration>()
            .and_then(|mut query| query.iter(world).next().map(|config| config.gravity))?;
        let scale = world.get::<GravityScale>(entity).map(|s| s.0).unwrap_or(1.0);
        Some(gravity * scale)
    }
}

/// World-space center of mass, falling back to the body origin.
fn center_of_mass(world: &World, entity: Entity) -> Vec3 {
    let Some(transform) = world.get::<GlobalTransform>(entity) else {
        return Rapier3dBackend::get_position(world, entity);
    };
    let local = world
        .get::<ReadMassProperties>(entity)
        .map(|props| props.local_center_of_mass)
        .unwrap_or(Vec3::ZERO);
    transform.transform_point(local)
}

/// Plugin that sets up Rapier3D-specific systems for the character controller.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        use crate::CharacterControllerSet;

        // Phase 1: Preparation - take last tick's forces back out
        app.add_systems(
            FixedUpdate,
            clear_controller_forces.in_set(CharacterControllerSet::Preparation),
        );

        // Phase 2: Sensors - ground ray
        app.add_systems(
            FixedUpdate,
            rapier_ground_detection.in_set(CharacterControllerSet::Sensors),
        );

        // Phase 4: Final Application - hand accumulated forces to Rapier
        app.add_systems(
            FixedUpdate,
            apply_controller_forces.in_set(CharacterControllerSet::FinalApplication),
        );
    }
}

/// Build the ray filter for a character.
///
/// The character's own body is excluded, as are sensors. If the character
/// has collision groups, its memberships are kept and its filters are
/// narrowed by the configured ground mask.
fn ground_filter(
    entity: Entity,
    ground_mask: u32,
    collision_groups: Option<&CollisionGroups>,
) -> QueryFilter<'static> {
    let (memberships, filters) = collision_groups
        .map(|cg| (cg.memberships, cg.filters))
        .unwrap_or((Group::ALL, Group::ALL));
    let filters = filters & Group::from_bits_truncate(ground_mask);

    QueryFilter::default()
        .exclude_rigid_body(entity)
        .exclude_sensors()
        .groups(CollisionGroups::new(memberships, filters))
}

/// Rigid body a hit collider belongs to, if it can carry the character.
///
/// That is the collider's own entity if it is a body, otherwise its parent.
/// Fixed bodies count as plain ground.
fn attached_body(
    collider: Entity,
    bodies: &Query<&RigidBody>,
    parents: &Query<&ChildOf>,
) -> Option<Entity> {
    let body = if bodies.contains(collider) {
        collider
    } else {
        parents.get(collider).ok().map(|c| c.parent())?
    };
    match bodies.get(body) {
        Ok(RigidBody::Fixed) | Err(_) => None,
        Ok(_) => Some(body),
    }
}

/// Rapier-specific ground detection.
///
/// Casts one ray straight down from the body origin, `ray_length` long.
/// Characters without steering this tick are left with a miss.
fn rapier_ground_detection(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<(
        Entity,
        &GlobalTransform,
        &ControllerConfig,
        &mut CharacterController,
        Option<&CollisionGroups>,
    )>,
    bodies: Query<&RigidBody>,
    parents: Query<&ChildOf>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, config, mut controller, collision_groups) in &mut q_controllers {
        if controller.steering.is_none() {
            continue;
        }

        let origin = transform.translation();
        let filter = ground_filter(entity, config.ground_mask, collision_groups);

        controller.probe = context
            .cast_ray_and_get_normal(origin, DOWN, config.height.ray_length, true, filter)
            .map(|(hit_entity, hit)| {
                GroundProbe::hit(CollisionData::new(
                    hit.time_of_impact,
                    hit.normal,
                    hit.point,
                    attached_body(hit_entity, &bodies, &parents),
                ))
            })
            .unwrap_or_else(GroundProbe::miss);
    }
}

/// Clear controller forces at the start of each tick.
///
/// Subtracts what the controller applied last tick from `ExternalForce`,
/// leaving whatever the game itself applied in place.
pub fn clear_controller_forces(mut q: Query<(&mut ExternalForce, &mut ForceAccumulator)>) {
    for (mut ext_force, mut acc) in &mut q {
        let (force_to_subtract, torque_to_subtract) = acc.prepare_new_frame();

        ext_force.force -= force_to_subtract;
        ext_force.torque -= torque_to_subtract;
    }
}

/// Apply controller forces at the end of each tick.
///
/// Bodies that only just received forces (a platform pushed by a character
/// standing on it) get an `ExternalForce` inserted.
pub fn apply_controller_forces(
    mut commands: Commands,
    mut q: Query<(Entity, &mut ForceAccumulator, Option<&mut ExternalForce>)>,
) {
    for (entity, mut acc, ext_force) in &mut q {
        let (force_to_apply, torque_to_apply) = acc.finalize_frame();

        match ext_force {
            Some(mut ext_force) => {
                ext_force.force += force_to_apply;
                ext_force.torque += torque_to_apply;
            }
            None => {
                commands.entity(entity).insert(ExternalForce {
                    force: force_to_apply,
                    torque: torque_to_apply,
                });
            }
        }
    }
}

/// Bundle for creating a floating character with Rapier3D physics.
///
/// Provides every Rapier component the controller reads or writes. The
/// collider is left to the caller; a capsule whose bottom sits above the
/// ride height is the usual choice, so the body never touches the ground.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use floating_capsule_controller::prelude::*;
/// use floating_capsule_controller::rapier::Rapier3dCharacterBundle;
///
/// fn spawn_enemy(mut commands: Commands, player: Single<Entity, With<Player>>) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         CharacterController::new(),
///         ControllerConfig::enemy(),
///         SteeringIntent::Target(*player),
///         Rapier3dCharacterBundle::new(),
///         Collider::capsule_y(0.5, 0.4),
///     ));
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `locked_axes`: Empty, the upright spring keeps the body standing
/// - `damping`: Linear 0.0, Angular 1.0
#[derive(Bundle)]
pub struct Rapier3dCharacterBundle {
    /// The rigid body type. Must be [`RigidBody::Dynamic`] to respond to forces.
    pub rigid_body: RigidBody,
    /// Current linear and angular velocity. Updated by Rapier each physics step.
    pub velocity: Velocity,
    /// Force handed to Rapier. The controller adds and removes its own share.
    pub external_force: ExternalForce,
    /// Which axes are locked.
    pub locked_axes: LockedAxes,
    /// Damping coefficients for velocity reduction.
    pub damping: Damping,
    /// Computed mass properties. Rapier updates this based on the entity's collider.
    pub mass_properties: ReadMassProperties,
    /// Controller forces for the current tick.
    pub forces: ForceAccumulator,
}

impl Default for Rapier3dCharacterBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier3dCharacterBundle {
    /// Create a bundle with free rotation, kept upright by the upright spring.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            locked_axes: LockedAxes::empty(),
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 1.0,
            },
            mass_properties: ReadMassProperties::default(),
            forces: ForceAccumulator::default(),
        }
    }

    /// Create a bundle that can turn about Y but never tips over.
    ///
    /// The upright spring then only steers the facing.
    pub fn tilt_locked() -> Self {
        Self {
            locked_axes: LockedAxes::ROTATION_LOCKED_X | LockedAxes::ROTATION_LOCKED_Z,
            ..Self::new()
        }
    }

    /// Set the damping coefficients.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }

    /// Set which axes should be locked for the rigid body.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}
