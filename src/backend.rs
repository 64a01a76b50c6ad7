//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to work with the character controller. This allows swapping physics
//! engines (Rapier3D, Avian, custom, etc.) without touching the control code.

use bevy::prelude::*;

/// Trait for physics backend implementations.
///
/// The controller only ever *reads* body state and *submits* forces and
/// torques through this trait; it never writes positions or velocities,
/// so the engine's integrator stays in charge of the bodies.
///
/// Ground sensing is backend specific: a backend registers a system in
/// [`CharacterControllerSet::Sensors`](crate::CharacterControllerSet::Sensors)
/// (through [`plugin`](Self::plugin)) that casts the ground ray and writes
/// [`CharacterController::probe`](crate::controller::CharacterController::probe).
///
/// For an example implementation, see `Rapier3dBackend` in the `rapier`
/// module.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Get the current linear velocity of a body.
    fn get_velocity(world: &World, entity: Entity) -> Vec3;

    /// Get the current angular velocity of a body.
    fn get_angular_velocity(world: &World, entity: Entity) -> Vec3;

    /// Get the current world rotation of a body.
    fn get_rotation(world: &World, entity: Entity) -> Quat;

    /// Get the current world position of a body.
    fn get_position(world: &World, entity: Entity) -> Vec3;

    /// Apply a force through the body's center of mass.
    ///
    /// Force is applied over the physics timestep.
    fn apply_force(world: &mut World, entity: Entity, force: Vec3);

    /// Apply a force at a world-space point, producing torque about the
    /// center of mass as well.
    fn apply_force_at_point(world: &mut World, entity: Entity, force: Vec3, point: Vec3);

    /// Apply a torque to a body.
    fn apply_torque(world: &mut World, entity: Entity, torque: Vec3);

    /// Whether the body is simulated (responds to forces).
    fn is_dynamic(world: &World, entity: Entity) -> bool;

    /// Get the world scale of an entity.
    fn get_scale(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<GlobalTransform>(entity)
            .map(|t| t.to_scale_rotation_translation().0)
            .unwrap_or(Vec3::ONE)
    }

    /// Get the mass of a body.
    fn get_mass(_world: &World, _entity: Entity) -> f32 {
        1.0
    }

    /// Get the gravitational acceleration acting on a body, if the backend knows it.
    ///
    /// When `None`, the controller keeps using its configured gravity.
    fn get_gravity(_world: &World, _entity: Entity) -> Option<Vec3> {
        None
    }

    /// Get the fixed timestep in seconds.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.timestep().as_secs_f32())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 64.0)
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}

/// Per-body accumulator for controller forces.
///
/// Engines usually expose a persistent external force that users may also
/// write to. The controller adds its forces here during a tick; the backend
/// then moves them into the engine component, remembering what it added so
/// the next tick can take exactly that back out again.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ForceAccumulator {
    force: Vec3,
    torque: Vec3,
    applied_force: Vec3,
    applied_torque: Vec3,
}

impl ForceAccumulator {
    /// Add a force for this tick.
    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// Add a torque for this tick.
    pub fn add_torque(&mut self, torque: Vec3) {
        self.torque += torque;
    }

    /// Force accumulated so far this tick.
    pub fn pending_force(&self) -> Vec3 {
        self.force
    }

    /// Torque accumulated so far this tick.
    pub fn pending_torque(&self) -> Vec3 {
        self.torque
    }

    /// Start a new tick. Returns what was applied last tick so it can be
    /// removed from the engine component.
    pub fn prepare_new_frame(&mut self) -> (Vec3, Vec3) {
        let applied = (self.applied_force, self.applied_torque);
        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
        self.applied_force = Vec3::ZERO;
        self.applied_torque = Vec3::ZERO;
        applied
    }

    /// Finish the tick. Returns what should be added to the engine component.
    pub fn finalize_frame(&mut self) -> (Vec3, Vec3) {
        self.applied_force = self.force;
        self.applied_torque = self.torque;
        (self.force, self.torque)
    }
}

/// Add force and torque to an entity's [`ForceAccumulator`], inserting one
/// if it has none yet. Does nothing for despawned entities.
pub fn accumulate(world: &mut World, entity: Entity, force: Vec3, torque: Vec3) {
    let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
        return;
    };
    if let Some(mut acc) = entity_mut.get_mut::<ForceAccumulator>() {
        acc.add_force(force);
        acc.add_torque(torque);
        return;
    }
    let mut acc = ForceAccumulator::default();
    acc.add_force(force);
    acc.add_torque(torque);
    entity_mut.insert(acc);
}
