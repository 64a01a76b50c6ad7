//! Raycast hit data shared between backends and the controller systems.

use bevy::prelude::*;

/// Information about a raycast collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionData {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at hit point.
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Rigid body the hit collider belongs to, if it is not static.
    pub entity: Option<Entity>,
}

impl Default for CollisionData {
    fn default() -> Self {
        Self {
            distance: 0.0,
            normal: Vec3::Y,
            point: Vec3::ZERO,
            entity: None,
        }
    }
}

impl CollisionData {
    /// Create a collision result.
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }

    /// Builder: attach the body that was hit.
    pub fn with_body(mut self, entity: Entity) -> Self {
        self.entity = Some(entity);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_data_hit() {
        let cast = CollisionData::new(1.5, Vec3::Y, Vec3::new(2.0, 0.0, 1.0), None);

        assert_eq!(cast.distance, 1.5);
        assert_eq!(cast.normal, Vec3::Y);
        assert_eq!(cast.point, Vec3::new(2.0, 0.0, 1.0));
        assert!(cast.entity.is_none());
    }

    #[test]
    fn collision_data_with_body() {
        let entity = Entity::from_raw(42);
        let cast = CollisionData::default().with_body(entity);

        assert_eq!(cast.entity, Some(entity));
    }
}
