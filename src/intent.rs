//! Steering intent.
//!
//! The game (player input or AI) says where the character wants to go by
//! setting a [`SteeringIntent`]. The controller resolves it to a horizontal
//! direction at the start of every tick.

use bevy::prelude::*;

use crate::locomotion::direction_to;

/// Where the character wants to go.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use floating_capsule_controller::prelude::*;
///
/// let mut intent = SteeringIntent::default();
/// assert!(intent.is_idle());
///
/// // Stick input: x = right, y = forward.
/// intent.set_input(Vec2::new(0.0, 1.0));
/// assert_eq!(intent, SteeringIntent::Direction(Vec3::NEG_Z));
///
/// intent.clear();
/// assert!(intent.is_idle());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub enum SteeringIntent {
    /// No steering available. The controller does nothing this tick.
    #[default]
    Idle,
    /// Head toward another entity's position.
    Target(Entity),
    /// Head in a fixed world direction. Horizontal, length at most 1.
    Direction(Vec3),
}

impl SteeringIntent {
    /// Head toward `target`.
    pub fn chase(&mut self, target: Entity) {
        *self = Self::Target(target);
    }

    /// Head in a world direction. The vertical part is dropped and the
    /// length clamped to 1, so a short vector means "walk slowly".
    pub fn set_direction(&mut self, direction: Vec3) {
        let flat = Vec3::new(direction.x, 0.0, direction.z);
        *self = Self::Direction(flat.clamp_length_max(1.0));
    }

    /// Map stick input (`x` right, `y` forward) onto the ground plane.
    pub fn set_input(&mut self, input: Vec2) {
        self.set_direction(Vec3::new(input.x, 0.0, -input.y));
    }

    /// Drop all steering.
    pub fn clear(&mut self) {
        *self = Self::Idle;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Resolve to this tick's steering direction.
    ///
    /// `target_position` is the current position of the chased entity, or
    /// `None` if it no longer exists. Returns `None` when no steering is
    /// available.
    pub fn resolve(&self, position: Vec3, target_position: Option<Vec3>) -> Option<Vec3> {
        match *self {
            Self::Idle => None,
            Self::Target(_) => target_position.map(|target| direction_to(position, target)),
            Self::Direction(direction) => Some(direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_resolves_to_none() {
        assert_eq!(SteeringIntent::Idle.resolve(Vec3::ZERO, Some(Vec3::X)), None);
    }

    #[test]
    fn set_direction_flattens_and_clamps() {
        let mut intent = SteeringIntent::default();
        intent.set_direction(Vec3::new(3.0, 7.0, 4.0));

        let SteeringIntent::Direction(dir) = intent else {
            panic!("expected a direction, got {intent:?}");
        };
        assert_eq!(dir.y, 0.0);
        assert!((dir - Vec3::new(0.6, 0.0, 0.8)).length() < 1e-6);
    }

    #[test]
    fn short_direction_is_kept() {
        let mut intent = SteeringIntent::default();
        intent.set_direction(Vec3::new(0.25, 0.0, 0.0));
        assert_eq!(intent.resolve(Vec3::ZERO, None), Some(Vec3::new(0.25, 0.0, 0.0)));
    }

    #[test]
    fn target_points_toward_entity() {
        let mut intent = SteeringIntent::default();
        intent.chase(Entity::from_raw(7));

        let dir = intent.resolve(Vec3::new(1.0, 0.0, 1.0), Some(Vec3::new(1.0, 5.0, -3.0)));
        assert_eq!(dir, Some(Vec3::NEG_Z));
    }

    #[test]
    fn missing_target_resolves_to_none() {
        let intent = SteeringIntent::Target(Entity::from_raw(7));
        assert_eq!(intent.resolve(Vec3::ZERO, None), None);
    }

    #[test]
    fn target_on_top_of_character_gives_zero() {
        let intent = SteeringIntent::Target(Entity::from_raw(7));
        assert_eq!(intent.resolve(Vec3::ONE, Some(Vec3::ONE)), Some(Vec3::ZERO));
    }
}
