//! Ground sensing results.
//!
//! The physics backend casts a single ray straight down from the body origin
//! each tick and stores the result as a [`GroundProbe`] on the controller.

use bevy::prelude::*;

use crate::collision::CollisionData;

/// Leniency on the ride height when classifying a probe as grounded.
///
/// The height spring oscillates about the ride height, so a hit slightly
/// beyond it still counts as ground. This only gates the grounded flag;
/// the ray itself is always cast at full length.
pub const GROUNDED_SLACK: f32 = 1.3;

/// Direction of the ground ray.
pub const DOWN: Vec3 = Vec3::NEG_Y;

/// Result of one ground ray.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroundProbe {
    /// Nearest hit within the ray length, if any.
    pub hit: Option<CollisionData>,
}

impl GroundProbe {
    /// A probe that found nothing.
    pub fn miss() -> Self {
        Self { hit: None }
    }

    /// A probe that hit something.
    pub fn hit(data: CollisionData) -> Self {
        Self { hit: Some(data) }
    }

    /// Whether the ray hit anything.
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.hit.is_some()
    }

    /// Distance to the hit, `f32::MAX` on a miss.
    pub fn distance(&self) -> f32 {
        self.hit.map(|h| h.distance).unwrap_or(f32::MAX)
    }

    /// Rigid body under the character, if the hit has one.
    pub fn body(&self) -> Option<Entity> {
        self.hit.and_then(|h| h.entity)
    }

    /// True on a miss or on a hit without an attached body.
    pub fn is_detached(&self) -> bool {
        self.body().is_none()
    }

    /// Grounded classification against the given ride height.
    pub fn is_grounded(&self, ride_height: f32) -> bool {
        match self.hit {
            Some(hit) => hit.distance <= ride_height * GROUNDED_SLACK,
            None => false,
        }
    }
}
