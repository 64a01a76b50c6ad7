//! Persistent per-character controller state.

use std::time::Duration;

use bevy::prelude::*;

use crate::detection::GroundProbe;

/// Convert a slow duration in seconds. Negative and NaN mean "already over";
/// anything too long for a `Duration` (including infinity) never runs out.
fn slow_duration(secs: f32) -> Duration {
    Duration::try_from_secs_f32(secs.max(0.0)).unwrap_or(Duration::MAX)
}

/// A time-limited uniform speed multiplier.
#[derive(Debug, Clone)]
pub struct SlowEffect {
    /// Multiplier on the target velocity while active.
    pub factor: f32,
    timer: Timer,
}

impl SlowEffect {
    pub fn new(factor: f32, duration_secs: f32) -> Self {
        Self {
            factor,
            timer: Timer::new(slow_duration(duration_secs), TimerMode::Once),
        }
    }

    /// Advance the effect. Returns true once it has run out.
    pub fn tick(&mut self, delta: Duration) -> bool {
        self.timer.tick(delta).finished()
    }

    /// Time left before the effect ends.
    pub fn remaining(&self) -> Duration {
        self.timer.remaining()
    }
}

/// Core character controller component.
///
/// Holds everything the controller carries between fixed ticks. Owned by a
/// single character and only mutated by the controller systems (and the
/// modifier setters below, which the game calls between ticks).
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct CharacterController {
    // === Sensing ===
    /// This tick's ground probe.
    #[reflect(ignore)]
    pub probe: GroundProbe,
    /// Whether this tick's probe classifies as grounded.
    pub is_grounded: bool,
    /// Grounded state of the previous tick, for edge detection.
    pub(crate) was_grounded: bool,

    // === Steering ===
    /// Steering direction resolved for this tick. `None` makes the tick a no-op.
    pub steering: Option<Vec3>,
    /// Whether the character is grounded and steering, for edge detection.
    pub is_moving: bool,

    // === Locomotion ===
    /// Ramped target velocity the locomotion force chases.
    pub goal_velocity: Vec3,
    /// Horizontal velocity seen by the previous acceleration look sample.
    pub(crate) previous_velocity: Vec3,

    // === Upright ===
    /// Orientation the upright spring is pulling toward.
    pub upright_target: Quat,
    /// Target captured when the platform anchor was last taken.
    pub(crate) last_target: Quat,
    /// Platform euler rotation (YXZ, radians) captured with `last_target`.
    pub(crate) platform_initial_rotation: Vec3,
    /// Whether the previous probe missed or hit something without a body.
    pub(crate) last_probe_detached: bool,

    // === Modifiers ===
    speed_factor: f32,
    max_accel_force_factor: f32,
    #[reflect(ignore)]
    slow: Option<SlowEffect>,

    // === Gravity ===
    /// Gravitational acceleration acting on the body.
    /// The height spring cancels `mass * gravity` while grounded.
    pub gravity: Vec3,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self {
            probe: GroundProbe::miss(),
            is_grounded: false,
            was_grounded: false,
            steering: None,
            is_moving: false,
            goal_velocity: Vec3::ZERO,
            previous_velocity: Vec3::ZERO,
            upright_target: Quat::IDENTITY,
            last_target: Quat::IDENTITY,
            platform_initial_rotation: Vec3::ZERO,
            last_probe_detached: false,
            speed_factor: 1.0,
            max_accel_force_factor: 1.0,
            slow: None,
            gravity: Vec3::new(0.0, -9.81, 0.0),
        }
    }
}

impl CharacterController {
    /// Create a new controller with standard gravity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new controller with custom gravity.
    pub fn with_gravity(gravity: Vec3) -> Self {
        Self { gravity, ..default() }
    }

    /// Re-initialize all carried state, keeping gravity.
    pub fn reset(&mut self) {
        *self = Self::with_gravity(self.gravity);
    }

    /// Slow the character by `factor` for `duration_secs`.
    ///
    /// A second call before expiry replaces the first: its factor and
    /// duration win and the earlier timer is discarded.
    pub fn apply_slow(&mut self, factor: f32, duration_secs: f32) {
        debug!("slow applied: factor {factor} for {duration_secs}s");
        self.slow = Some(SlowEffect::new(factor, duration_secs));
    }

    /// Whether a slow effect is active.
    pub fn is_slowed(&self) -> bool {
        self.slow.is_some()
    }

    /// Active slow factor, 1.0 when not slowed.
    pub fn slow_factor(&self) -> f32 {
        self.slow.as_ref().map(|s| s.factor).unwrap_or(1.0)
    }

    /// The active slow effect, if any.
    pub fn slow(&self) -> Option<&SlowEffect> {
        self.slow.as_ref()
    }

    /// Set the uniform speed multiplier.
    pub fn set_speed_factor(&mut self, factor: f32) {
        self.speed_factor = factor;
    }

    pub fn speed_factor(&self) -> f32 {
        self.speed_factor
    }

    /// Set the multiplier on the maximum locomotion force.
    pub fn set_max_accel_force_factor(&mut self, factor: f32) {
        self.max_accel_force_factor = factor;
    }

    pub fn max_accel_force_factor(&self) -> f32 {
        self.max_accel_force_factor
    }

    /// Combined multiplier on the locomotion target velocity.
    #[inline]
    pub fn speed_scale(&self) -> f32 {
        self.speed_factor * self.slow_factor()
    }

    /// Advance time-limited modifiers by one tick.
    pub fn tick_modifiers(&mut self, delta: Duration) {
        let expired = self.slow.as_mut().is_some_and(|slow| slow.tick(delta));
        if expired {
            debug!("slow expired");
            self.slow = None;
        }
    }

    /// Whether the ground ray hit anything this tick.
    pub fn ground_detected(&self) -> bool {
        self.probe.is_hit()
    }

    /// Distance to the ground, `f32::MAX` if not detected.
    pub fn ground_distance(&self) -> f32 {
        self.probe.distance()
    }

    /// Rigid body under the character, if any.
    pub fn ground_entity(&self) -> Option<Entity> {
        self.probe.body()
    }

    /// Grounded this tick but not the one before.
    pub fn just_landed(&self) -> bool {
        self.is_grounded && !self.was_grounded
    }

    /// Grounded the tick before but not this one.
    pub fn just_left_ground(&self) -> bool {
        self.was_grounded && !self.is_grounded
    }

    /// Whether the regulators should run this tick.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.steering.is_some() && self.is_grounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance(controller: &mut CharacterController, secs: f32) {
        // Step in fixed 10ms ticks like the fixed schedule would.
        let steps = (secs / 0.01).round() as u32;
        for _ in 0..steps {
            controller.tick_modifiers(Duration::from_millis(10));
        }
    }

    #[test]
    fn controller_defaults() {
        let controller = CharacterController::new();
        assert!(!controller.is_grounded);
        assert!(!controller.is_slowed());
        assert_eq!(controller.speed_scale(), 1.0);
        assert_eq!(controller.max_accel_force_factor(), 1.0);
        assert_eq!(controller.gravity, Vec3::new(0.0, -9.81, 0.0));
        assert!(!controller.is_active());
    }

    #[test]
    fn slow_expires() {
        let mut controller = CharacterController::new();
        controller.apply_slow(0.5, 1.0);
        assert!(controller.is_slowed());
        assert_eq!(controller.slow_factor(), 0.5);

        advance(&mut controller, 0.9);
        assert!(controller.is_slowed());

        advance(&mut controller, 0.2);
        assert!(!controller.is_slowed());
        assert_eq!(controller.slow_factor(), 1.0);
    }

    #[test]
    fn second_slow_overrides_first() {
        let mut controller = CharacterController::new();
        controller.apply_slow(0.5, 2.0);
        advance(&mut controller, 0.5);

        controller.apply_slow(0.2, 1.0);
        assert_eq!(controller.slow_factor(), 0.2);

        // 1.4s total: still under the second call's timer.
        advance(&mut controller, 0.9);
        assert!(controller.is_slowed());
        assert_eq!(controller.slow_factor(), 0.2);

        // 1.6s total: second timer done. The first would still have 0.4s left.
        advance(&mut controller, 0.2);
        assert!(!controller.is_slowed());
    }

    #[test]
    fn unbounded_slow_lasts() {
        let mut controller = CharacterController::new();
        controller.apply_slow(0.5, f32::INFINITY);
        advance(&mut controller, 5.0);
        assert!(controller.is_slowed());
        assert_eq!(controller.slow_factor(), 0.5);

        controller.apply_slow(0.3, 1.0e20);
        advance(&mut controller, 5.0);
        assert!(controller.is_slowed());
        assert_eq!(controller.slow_factor(), 0.3);
    }

    #[test]
    fn degenerate_slow_runs_out_at_once() {
        let mut controller = CharacterController::new();
        controller.apply_slow(0.5, f32::NAN);
        advance(&mut controller, 0.01);
        assert!(!controller.is_slowed());

        controller.apply_slow(0.5, -3.0);
        advance(&mut controller, 0.01);
        assert!(!controller.is_slowed());
    }

    #[test]
    fn speed_scale_combines_factors() {
        let mut controller = CharacterController::new();
        controller.set_speed_factor(0.8);
        controller.apply_slow(0.5, 1.0);
        assert!((controller.speed_scale() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn reset_keeps_gravity() {
        let gravity = Vec3::new(0.0, -20.0, 0.0);
        let mut controller = CharacterController::with_gravity(gravity);
        controller.goal_velocity = Vec3::X;
        controller.apply_slow(0.5, 1.0);

        controller.reset();
        assert_eq!(controller.goal_velocity, Vec3::ZERO);
        assert!(!controller.is_slowed());
        assert_eq!(controller.gravity, gravity);
    }
}
