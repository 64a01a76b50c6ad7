//! Height spring.
//!
//! Keeps the body floating at the ride height. The spring acts along the
//! ground ray and always cancels gravity, so at rest (distance equal to the
//! ride height, no relative velocity) the applied force is exactly
//! `-mass * gravity`.

use bevy::prelude::*;

use crate::config::HeightSpringConfig;
use crate::detection::DOWN;

/// Output of the height spring for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightSpring {
    /// Signed spring magnitude along the ground ray (positive pulls down).
    pub spring_force: f32,
    /// Total force to apply to the body.
    pub applied_force: Vec3,
}

impl HeightSpring {
    /// The part of the force that excludes gravity cancellation.
    /// Drives the squash/stretch oscillator.
    pub fn oscillation_force(&self) -> Vec3 {
        DOWN * self.spring_force
    }

    /// Force to push back onto the body being stood on.
    pub fn reaction_force(&self) -> Vec3 {
        -self.applied_force
    }
}

/// Compute the height spring.
///
/// * `distance` - Distance along the ray to the ground hit.
/// * `velocity` - Velocity of the character.
/// * `ground_velocity` - Velocity of the body under the character (zero for static ground).
/// * `gravitational_force` - `mass * gravity` of the character.
pub fn height_spring(
    config: &HeightSpringConfig,
    distance: f32,
    velocity: Vec3,
    ground_velocity: Vec3,
    gravitational_force: Vec3,
) -> HeightSpring {
    let relative_velocity = DOWN.dot(velocity) - DOWN.dot(ground_velocity);
    let height_error = distance - config.ride_height;

    let spring_force = height_error * config.strength - relative_velocity * config.damper;
    let applied_force = -gravitational_force + DOWN * spring_force;

    HeightSpring {
        spring_force,
        applied_force,
    }
}
