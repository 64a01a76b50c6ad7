//! Squash and stretch.
//!
//! A purely cosmetic damped spring. The height spring feeds it the force it
//! applies each tick; the resulting displacement stretches or squashes an
//! optional visual entity. Nothing here feeds back into the control loop.

use bevy::prelude::*;

/// Damped spring oscillator driving a visual scale.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct SquashStretch {
    /// Spring stiffness pulling the displacement back to zero.
    pub stiffness: f32,
    /// Damping on the oscillator velocity.
    pub damper: f32,
    /// Oscillator mass.
    pub mass: f32,
    /// Scale change per unit of vertical displacement.
    pub response: f32,
    /// Limit on the vertical scale deviation from 1.
    pub max_deviation: f32,
    /// Entity whose `Transform::scale` is driven. Usually a mesh child.
    pub visual: Option<Entity>,
    /// Current displacement.
    pub displacement: Vec3,
    /// Current displacement velocity.
    pub velocity: Vec3,
    pending_force: Vec3,
}

impl Default for SquashStretch {
    fn default() -> Self {
        Self {
            stiffness: 100.0,
            damper: 10.0,
            mass: 1.0,
            response: 0.1,
            max_deviation: 0.4,
            visual: None,
            displacement: Vec3::ZERO,
            velocity: Vec3::ZERO,
            pending_force: Vec3::ZERO,
        }
    }
}

impl SquashStretch {
    /// Create an oscillator driving the given visual entity.
    pub fn for_visual(visual: Entity) -> Self {
        Self {
            visual: Some(visual),
            ..default()
        }
    }

    /// Push the oscillator. Accumulates until the next [`step`](Self::step).
    pub fn apply_force(&mut self, force: Vec3) {
        self.pending_force += force;
    }

    /// Integrate one step and consume the pending force.
    pub fn step(&mut self, dt: f32) {
        let restoring = -self.displacement * self.stiffness - self.velocity * self.damper;
        let acceleration = (self.pending_force + restoring) / self.mass.max(f32::EPSILON);
        self.velocity += acceleration * dt;
        self.displacement += self.velocity * dt;
        self.pending_force = Vec3::ZERO;
    }

    /// Volume-preserving scale for the current displacement.
    ///
    /// A negative vertical displacement (pushed down) squashes.
    pub fn scale(&self) -> Vec3 {
        let deviation = (self.displacement.y * self.response).clamp(-self.max_deviation, self.max_deviation);
        let vertical = 1.0 + deviation;
        let horizontal = 1.0 / vertical.sqrt();
        Vec3::new(horizontal, vertical, horizontal)
    }
}

/// Integrate oscillators and write the visual scale.
pub fn animate_squash_stretch(
    time: Res<Time<Fixed>>,
    mut oscillators: Query<&mut SquashStretch>,
    mut visuals: Query<&mut Transform>,
) {
    let dt = time.timestep().as_secs_f32();
    for mut oscillator in &mut oscillators {
        oscillator.step(dt);
        let Some(visual) = oscillator.visual else {
            continue;
        };
        if let Ok(mut transform) = visuals.get_mut(visual) {
            transform.scale = oscillator.scale();
        }
    }
}
