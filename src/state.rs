//! State marker components and controller notifications.
//!
//! The marker components indicate the current physical state of a character
//! controller. They are added/removed by the controller systems each tick.
//! [`ControllerEvent`]s fire once per transition so audio, particles or
//! animation can react without polling.

use bevy::prelude::*;

/// Marker component indicating the character is grounded.
///
/// Added when the ground probe hits within the grounded slack of the ride
/// height. Removed when the character becomes airborne.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use floating_capsule_controller::prelude::*;
///
/// fn check_grounded(grounded: Option<&Grounded>) -> bool {
///     grounded.is_some()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character is airborne.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// What changed for a controller this tick.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEventKind {
    /// Became grounded after being airborne.
    Landed,
    /// Became airborne after being grounded.
    LeftGround,
    /// Started moving while grounded.
    StartedMoving,
    /// Stopped moving, or left the ground while moving.
    ///
    /// Ticks without steering (idle intent, despawned target) change no
    /// state, so losing steering mid-move does not send this. It is sent on
    /// the first steering tick after that, if the character is then standing
    /// still or airborne.
    StoppedMoving,
}

/// Edge-triggered notification emitted by the controller loop.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerEvent {
    /// The character the event is about.
    pub entity: Entity,
    /// The transition.
    pub kind: ControllerEventKind,
}

impl ControllerEvent {
    pub fn new(entity: Entity, kind: ControllerEventKind) -> Self {
        Self { entity, kind }
    }
}

/// Compute the grounded/moving transitions between two ticks.
///
/// Returned in the order they should be delivered.
pub fn transitions(
    was_grounded: bool,
    grounded: bool,
    was_moving: bool,
    moving: bool,
) -> impl Iterator<Item = ControllerEventKind> {
    let ground = match (was_grounded, grounded) {
        (false, true) => Some(ControllerEventKind::Landed),
        (true, false) => Some(ControllerEventKind::LeftGround),
        _ => None,
    };
    let movement = match (was_moving, moving) {
        (false, true) => Some(ControllerEventKind::StartedMoving),
        (true, false) => Some(ControllerEventKind::StoppedMoving),
        _ => None,
    };
    ground.into_iter().chain(movement)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(was_grounded: bool, grounded: bool, was_moving: bool, moving: bool) -> Vec<ControllerEventKind> {
        transitions(was_grounded, grounded, was_moving, moving).collect()
    }

    #[test]
    fn no_change_no_events() {
        assert!(collect(true, true, false, false).is_empty());
        assert!(collect(false, false, false, false).is_empty());
    }

    #[test]
    fn landing() {
        assert_eq!(collect(false, true, false, false), vec![ControllerEventKind::Landed]);
    }

    #[test]
    fn leaving_ground_while_moving() {
        assert_eq!(
            collect(true, false, true, false),
            vec![ControllerEventKind::LeftGround, ControllerEventKind::StoppedMoving]
        );
    }

    #[test]
    fn landing_and_moving() {
        assert_eq!(
            collect(false, true, false, true),
            vec![ControllerEventKind::Landed, ControllerEventKind::StartedMoving]
        );
    }
}
