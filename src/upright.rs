//! Upright spring.
//!
//! A torsional spring-damper acting like an inverted pendulum: it pulls the
//! body's orientation toward a target rotation. The target tracks the
//! character's desired facing and, while standing on a rotating parent
//! platform without a facing of its own, follows the platform's yaw.

use bevy::prelude::*;

use crate::config::{LookDirection, UprightSpringConfig};
use crate::controller::CharacterController;

/// Squared length below which a look direction counts as "none".
const LOOK_EPSILON_SQUARED: f32 = 1e-10;

/// Rotation that takes `from` to `to` the short way round.
pub fn shortest_rotation(to: Quat, from: Quat) -> Quat {
    if to.dot(from) < 0.0 {
        to * (-from).inverse()
    } else {
        to * from.inverse()
    }
}

/// Rotation whose forward (-Z) faces `direction` with +Y up.
///
/// Returns `None` for a zero direction or one parallel to up.
pub fn look_rotation(direction: Vec3) -> Option<Quat> {
    let forward = Dir3::new(direction).ok()?;
    if forward.cross(Vec3::Y).length_squared() < LOOK_EPSILON_SQUARED {
        return None;
    }
    Some(Transform::IDENTITY.looking_to(forward, Vec3::Y).rotation)
}

/// Euler angles (pitch, yaw, roll) as `Vec3(x, y, z)`, yaw applied first.
pub fn euler(rotation: Quat) -> Vec3 {
    let (yaw, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
    Vec3::new(pitch, yaw, roll)
}

/// Corrective torque toward `target`.
pub fn upright_torque(
    config: &UprightSpringConfig,
    target: Quat,
    current: Quat,
    angular_velocity: Vec3,
) -> Vec3 {
    let to_goal = shortest_rotation(target, current);
    let (axis, angle) = to_goal.to_axis_angle();
    let axis = axis.normalize_or_zero();

    axis * (angle * config.strength) - angular_velocity * config.damper
}

/// Desired facing for this tick.
///
/// Only the horizontal part of velocity is considered. In `Acceleration`
/// mode `previous_velocity` is updated on every call.
pub fn look_direction(
    mode: LookDirection,
    velocity: Vec3,
    steering: Vec3,
    previous_velocity: &mut Vec3,
    dt: f32,
) -> Vec3 {
    let horizontal = Vec3::new(velocity.x, 0.0, velocity.z);
    match mode {
        LookDirection::Velocity => horizontal,
        LookDirection::Acceleration => {
            let delta = horizontal - *previous_velocity;
            *previous_velocity = horizontal;
            if dt > 0.0 {
                delta / dt
            } else {
                Vec3::ZERO
            }
        }
        LookDirection::Steering => Vec3::new(steering.x, 0.0, steering.z),
    }
}

/// Advance the target-rotation state machine for one tick.
///
/// * `look` - Desired facing this tick, zero for none.
/// * `probe_detached` - Whether this tick's ground probe has no attached body.
/// * `platform` - World rotation of the character's parent, if it has one.
pub fn update_target_rotation(
    controller: &mut CharacterController,
    look: Vec3,
    probe_detached: bool,
    platform: Option<Quat>,
) {
    let platform_euler = platform.map(euler).unwrap_or(Vec3::ZERO);

    // Re-anchor while not riding a body, so the anchor freezes at the moment
    // the character steps onto one.
    if controller.last_probe_detached {
        controller.last_target = controller.upright_target;
        controller.platform_initial_rotation = platform_euler;
    }
    controller.last_probe_detached = probe_detached;

    let desired = (look.length_squared() > LOOK_EPSILON_SQUARED)
        .then(|| look_rotation(look))
        .flatten();

    if let Some(target) = desired {
        controller.upright_target = target;
        controller.last_target = target;
        controller.platform_initial_rotation = platform_euler;
    } else if platform.is_some() {
        let delta = platform_euler - controller.platform_initial_rotation;
        let yaw = euler(controller.last_target).y + delta.y;
        controller.upright_target = Quat::from_rotation_y(yaw);
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_6, PI};

    use super::*;

    fn config() -> UprightSpringConfig {
        UprightSpringConfig {
            enabled: true,
            strength: 40.0,
            damper: 5.0,
            look_direction: LookDirection::Velocity,
        }
    }

    #[test]
    fn shortest_rotation_picks_short_path() {
        let a = Quat::from_rotation_y(0.1);
        // Same orientation, opposite quaternion sign.
        let b = -Quat::from_rotation_y(-0.1);
        let (_, angle) = shortest_rotation(a, b).to_axis_angle();
        assert!((angle - 0.2).abs() < 1e-4, "angle {angle}");
    }

    #[test]
    fn upright_no_torque_at_target() {
        let torque = upright_torque(&config(), Quat::IDENTITY, Quat::IDENTITY, Vec3::ZERO);
        assert!(torque.length() < 1e-5);
    }

    #[test]
    fn upright_torque_corrects_tilt() {
        let tilted = Quat::from_rotation_z(FRAC_PI_2);
        let torque = upright_torque(&config(), Quat::IDENTITY, tilted, Vec3::ZERO);

        // Rotating back about -Z by 90 degrees.
        assert!(torque.z < 0.0);
        assert!((torque.length() - FRAC_PI_2 * 40.0).abs() < 1e-3);
    }

    #[test]
    fn upright_damps_spin() {
        let torque = upright_torque(&config(), Quat::IDENTITY, Quat::IDENTITY, Vec3::new(0.0, 2.0, 0.0));
        assert!((torque - Vec3::new(0.0, -10.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn look_rotation_faces_direction() {
        let rotation = look_rotation(Vec3::X).unwrap();
        let forward = rotation * Vec3::NEG_Z;
        assert!((forward - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn look_rotation_rejects_degenerate() {
        assert!(look_rotation(Vec3::ZERO).is_none());
        assert!(look_rotation(Vec3::Y).is_none());
    }

    #[test]
    fn velocity_look_is_horizontal() {
        let mut previous = Vec3::ZERO;
        let look = look_direction(LookDirection::Velocity, Vec3::new(1.0, 5.0, 2.0), Vec3::ZERO, &mut previous, 0.1);
        assert_eq!(look, Vec3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn acceleration_look_tracks_previous() {
        let mut previous = Vec3::ZERO;
        let look = look_direction(LookDirection::Acceleration, Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, &mut previous, 0.5);
        assert_eq!(look, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(previous, Vec3::X);

        let look = look_direction(LookDirection::Acceleration, Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, &mut previous, 0.5);
        assert_eq!(look, Vec3::ZERO);
    }

    #[test]
    fn steering_look_uses_intent() {
        let mut previous = Vec3::ZERO;
        let look = look_direction(LookDirection::Steering, Vec3::X, Vec3::new(0.0, 0.3, -1.0), &mut previous, 0.1);
        assert_eq!(look, Vec3::NEG_Z);
    }

    #[test]
    fn explicit_look_sets_target() {
        let mut controller = CharacterController::new();
        update_target_rotation(&mut controller, Vec3::X, true, None);

        let forward = controller.upright_target * Vec3::NEG_Z;
        assert!((forward - Vec3::X).length() < 1e-5);
        assert_eq!(controller.last_target, controller.upright_target);
    }

    #[test]
    fn no_look_no_platform_holds_target() {
        let mut controller = CharacterController::new();
        update_target_rotation(&mut controller, Vec3::X, true, None);
        let held = controller.upright_target;

        update_target_rotation(&mut controller, Vec3::ZERO, true, None);
        assert_eq!(controller.upright_target, held);
    }

    #[test]
    fn follows_platform_yaw() {
        let mut controller = CharacterController::new();
        let start_yaw = 0.4;
        let facing = Quat::from_rotation_y(start_yaw) * Vec3::NEG_Z;

        // Face a direction while standing on the platform body, then stop steering.
        update_target_rotation(&mut controller, facing, true, Some(Quat::IDENTITY));
        update_target_rotation(&mut controller, Vec3::ZERO, false, Some(Quat::IDENTITY));
        let before = euler(controller.upright_target);
        assert!((before.y - start_yaw).abs() < 1e-4);

        // Platform yaws +30 degrees in one tick.
        update_target_rotation(&mut controller, Vec3::ZERO, false, Some(Quat::from_rotation_y(FRAC_PI_6)));
        let after = euler(controller.upright_target);

        assert!((after.y - before.y - FRAC_PI_6).abs() < 1e-4, "yaw {} -> {}", before.y, after.y);
        assert!(after.x.abs() < 1e-5);
        assert!(after.z.abs() < 1e-5);
    }

    #[test]
    fn platform_follow_wraps_past_half_turn() {
        let mut controller = CharacterController::new();
        let facing = Quat::from_rotation_y(PI - 0.1) * Vec3::NEG_Z;
        update_target_rotation(&mut controller, facing, false, Some(Quat::IDENTITY));

        update_target_rotation(&mut controller, Vec3::ZERO, false, Some(Quat::from_rotation_y(0.3)));
        let expected = Quat::from_rotation_y(PI + 0.2);
        let (_, angle) = shortest_rotation(expected, controller.upright_target).to_axis_angle();
        assert!(angle.abs() < 1e-3);
    }

    #[test]
    fn detached_probe_reanchors_each_tick() {
        let mut controller = CharacterController::new();
        update_target_rotation(&mut controller, Vec3::NEG_Z, true, Some(Quat::IDENTITY));

        // Parent rotates but nothing is being ridden: anchor follows the parent,
        // so the target does not drift.
        update_target_rotation(&mut controller, Vec3::ZERO, true, Some(Quat::from_rotation_y(0.5)));
        assert!(euler(controller.upright_target).y.abs() < 1e-5);
    }
}
