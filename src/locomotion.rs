//! Locomotion driver.
//!
//! Steering is turned into a goal velocity that ramps linearly toward
//! `direction * max_speed`, at a rate shaped by how well the new direction
//! agrees with the current goal. The force applied each tick is whatever
//! acceleration would reach the goal velocity in one step, clamped.

use bevy::prelude::*;

use crate::config::LocomotionConfig;

/// Move `current` toward `target` by at most `max_delta`, never overshooting.
pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_delta || distance <= f32::EPSILON {
        target
    } else {
        current + delta / distance * max_delta
    }
}

/// Horizontal unit direction from `from` toward `to`, zero if they coincide.
pub fn direction_to(from: Vec3, to: Vec3) -> Vec3 {
    let mut offset = to - from;
    offset.y = 0.0;
    offset.normalize_or_zero()
}

/// Per-tick inputs the driver needs from the controller state.
#[derive(Debug, Clone, Copy)]
pub struct LocomotionInput {
    /// Steering direction, length at most 1.
    pub direction: Vec3,
    /// Goal velocity carried from the previous tick.
    pub goal_velocity: Vec3,
    /// Current body velocity.
    pub velocity: Vec3,
    /// Combined speed factor and slow factor.
    pub speed_scale: f32,
    /// External multiplier on the maximum force.
    pub max_accel_force_factor: f32,
    /// Body mass.
    pub mass: f32,
    /// Fixed timestep in seconds.
    pub dt: f32,
}

/// Output of one locomotion step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionStep {
    /// New goal velocity to carry to the next tick.
    pub goal_velocity: Vec3,
    /// Force to apply.
    pub force: Vec3,
    /// Alignment of the steering direction with the previous goal velocity.
    pub alignment: f32,
}

/// Run the driver for one tick.
pub fn locomotion_step(config: &LocomotionConfig, input: LocomotionInput) -> LocomotionStep {
    let alignment = input.direction.dot(input.goal_velocity.normalize_or_zero());
    let acceleration = config.acceleration * config.acceleration_curve.evaluate(alignment);

    let target_velocity = input.direction * config.max_speed * input.speed_scale;
    let goal_velocity = move_towards(input.goal_velocity, target_velocity, acceleration * input.dt);

    let needed = if input.dt > 0.0 {
        (goal_velocity - input.velocity) / input.dt
    } else {
        Vec3::ZERO
    };
    let max_accel = config.max_accel_force
        * config.max_accel_force_curve.evaluate(alignment)
        * input.max_accel_force_factor;
    let needed = needed.clamp_length_max(max_accel.max(0.0));

    LocomotionStep {
        goal_velocity,
        force: needed * input.mass * config.force_scale,
        alignment,
    }
}

/// Where the locomotion force is applied: above the body origin by
/// `scale_y * lean_factor`, so the body leans into its acceleration.
pub fn lean_point(position: Vec3, scale_y: f32, lean_factor: f32) -> Vec3 {
    position + Vec3::new(0.0, scale_y * lean_factor, 0.0)
}
