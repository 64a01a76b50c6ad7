//! Controller configuration components.
//!
//! This module defines the tuning for a floating capsule: the height spring,
//! the upright spring, and locomotion. The stock values in
//! [`ControllerConfig::enemy`] are tuned for a capsule roughly two units tall
//! with unit-ish mass under standard gravity.

use bevy::prelude::*;

use crate::curve::ResponseCurve;
use crate::detection::GROUNDED_SLACK;
use crate::error::ConfigError;

/// Source of the direction a character wants to face.
///
/// Exactly one mode is active per character.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LookDirection {
    /// Face along the horizontal velocity.
    #[default]
    Velocity,
    /// Face along the horizontal acceleration, estimated from the velocity
    /// change since the previous tick.
    Acceleration,
    /// Face along the steering intent.
    Steering,
}

/// Configuration for the height spring.
#[derive(Reflect, Debug, Clone, Copy)]
pub struct HeightSpringConfig {
    /// Desired distance from the body origin to the ground along the ray.
    pub ride_height: f32,

    /// Length of the ground ray. Must be greater than `ride_height`.
    pub ray_length: f32,

    /// Spring strength.
    pub strength: f32,

    /// Spring damping coefficient.
    pub damper: f32,

    /// Whether the height spring is applied at all.
    pub maintain_height: bool,
}

impl Default for HeightSpringConfig {
    fn default() -> Self {
        Self {
            ride_height: 1.75,
            ray_length: 3.0,
            strength: 50.0,
            damper: 5.0,
            maintain_height: true,
        }
    }
}

impl HeightSpringConfig {
    /// Maximum probe distance still classified as grounded.
    #[inline]
    pub fn grounded_distance(&self) -> f32 {
        self.ride_height * GROUNDED_SLACK
    }
}

/// Configuration for the upright (torsional) spring.
#[derive(Reflect, Debug, Clone, Copy)]
pub struct UprightSpringConfig {
    /// Whether to apply torque to keep the character upright.
    pub enabled: bool,

    /// Strength of the upright torque spring.
    pub strength: f32,

    /// Damping coefficient for the upright torque.
    pub damper: f32,

    /// How the desired facing is derived.
    pub look_direction: LookDirection,
}

impl Default for UprightSpringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 40.0,
            damper: 5.0,
            look_direction: LookDirection::Velocity,
        }
    }
}

/// Configuration for locomotion.
#[derive(Reflect, Debug, Clone)]
pub struct LocomotionConfig {
    /// Maximum horizontal speed (units/second).
    pub max_speed: f32,

    /// Rate at which the goal velocity ramps toward the target (units/second^2).
    pub acceleration: f32,

    /// Upper bound on the corrective acceleration (units/second^2, before mass).
    pub max_accel_force: f32,

    /// Height of the force application point above the body origin,
    /// as a fraction of the body's vertical scale. Produces lean.
    pub lean_factor: f32,

    /// Multiplier on `acceleration`, keyed by alignment of the desired
    /// direction with the current goal velocity.
    pub acceleration_curve: ResponseCurve,

    /// Multiplier on `max_accel_force`, keyed the same way.
    pub max_accel_force_curve: ResponseCurve,

    /// Per-axis mask applied to the locomotion force.
    /// The vertical axis is zeroed by default so it doesn't fight the height spring.
    pub force_scale: Vec3,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            max_speed: 8.0,
            acceleration: 200.0,
            max_accel_force: 150.0,
            lean_factor: 0.25,
            acceleration_curve: ResponseCurve::reversal_boost(2.0),
            max_accel_force_curve: ResponseCurve::reversal_boost(2.0),
            force_scale: Vec3::new(1.0, 0.0, 1.0),
        }
    }
}

/// Configuration parameters for the character controller.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct ControllerConfig {
    /// Height spring settings.
    pub height: HeightSpringConfig,

    /// Upright spring settings.
    pub upright: UprightSpringConfig,

    /// Locomotion settings.
    pub locomotion: LocomotionConfig,

    /// Collision filter bits the ground ray tests against.
    pub ground_mask: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            height: HeightSpringConfig::default(),
            upright: UprightSpringConfig::default(),
            locomotion: LocomotionConfig::default(),
            ground_mask: u32::MAX,
        }
    }
}

impl ControllerConfig {
    /// Defaults tuned for AI-driven enemies chasing a target.
    pub fn enemy() -> Self {
        Self::default()
    }

    /// A stiffer, more responsive config for player-adjacent characters
    /// steered by raw input.
    pub fn player() -> Self {
        Self {
            height: HeightSpringConfig {
                strength: 80.0,
                damper: 8.0,
                ..default()
            },
            upright: UprightSpringConfig {
                strength: 60.0,
                damper: 6.0,
                look_direction: LookDirection::Steering,
                ..default()
            },
            locomotion: LocomotionConfig {
                max_speed: 10.0,
                acceleration: 250.0,
                ..default()
            },
            ground_mask: u32::MAX,
        }
    }

    /// Check that the config describes a controllable character.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let height = &self.height;
        if height.ride_height.is_nan() || height.ride_height <= 0.0 {
            return Err(ConfigError::RideHeight(height.ride_height));
        }
        if height.ray_length.is_nan() || height.ray_length <= height.ride_height {
            return Err(ConfigError::RayTooShort {
                ray_length: height.ray_length,
                ride_height: height.ride_height,
            });
        }

        non_negative("height spring strength", height.strength)?;
        non_negative("height spring damper", height.damper)?;
        non_negative("upright spring strength", self.upright.strength)?;
        non_negative("upright spring damper", self.upright.damper)?;

        positive("max speed", self.locomotion.max_speed)?;
        positive("acceleration", self.locomotion.acceleration)?;
        positive("max acceleration force", self.locomotion.max_accel_force)?;

        self.locomotion.acceleration_curve.validate()?;
        self.locomotion.max_accel_force_curve.validate()?;

        Ok(())
    }

    /// Builder: set ride height and ray length.
    pub fn with_ride_height(mut self, ride_height: f32, ray_length: f32) -> Self {
        self.height.ride_height = ride_height;
        self.height.ray_length = ray_length;
        self
    }

    /// Builder: set height spring parameters.
    pub fn with_height_spring(mut self, strength: f32, damper: f32) -> Self {
        self.height.strength = strength;
        self.height.damper = damper;
        self
    }

    /// Builder: enable or disable the height spring.
    pub fn with_maintain_height(mut self, enabled: bool) -> Self {
        self.height.maintain_height = enabled;
        self
    }

    /// Builder: set upright spring parameters.
    pub fn with_upright_spring(mut self, strength: f32, damper: f32) -> Self {
        self.upright.strength = strength;
        self.upright.damper = damper;
        self
    }

    /// Builder: enable or disable the upright torque.
    pub fn with_upright_enabled(mut self, enabled: bool) -> Self {
        self.upright.enabled = enabled;
        self
    }

    /// Builder: set the look direction mode.
    pub fn with_look_direction(mut self, mode: LookDirection) -> Self {
        self.upright.look_direction = mode;
        self
    }

    /// Builder: set movement parameters.
    pub fn with_movement(mut self, max_speed: f32, acceleration: f32, max_accel_force: f32) -> Self {
        self.locomotion.max_speed = max_speed;
        self.locomotion.acceleration = acceleration;
        self.locomotion.max_accel_force = max_accel_force;
        self
    }

    /// Builder: set both acceleration shaping curves.
    pub fn with_curves(mut self, acceleration: ResponseCurve, max_accel_force: ResponseCurve) -> Self {
        self.locomotion.acceleration_curve = acceleration;
        self.locomotion.max_accel_force_curve = max_accel_force;
        self
    }

    /// Builder: set the lean factor.
    pub fn with_lean_factor(mut self, lean_factor: f32) -> Self {
        self.locomotion.lean_factor = lean_factor;
        self
    }

    /// Builder: set the ground collision mask.
    pub fn with_ground_mask(mut self, mask: u32) -> Self {
        self.ground_mask = mask;
        self
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enemy_preset_is_valid() {
        assert_eq!(ControllerConfig::enemy().validate(), Ok(()));
    }

    #[test]
    fn player_preset_is_valid() {
        let player = ControllerConfig::player();
        assert_eq!(player.validate(), Ok(()));
        assert_eq!(player.upright.look_direction, LookDirection::Steering);
        assert!(player.height.strength >= ControllerConfig::enemy().height.strength);
    }

    #[test]
    fn enemy_preset_values() {
        let config = ControllerConfig::enemy();
        assert_eq!(config.height.ride_height, 1.75);
        assert_eq!(config.height.ray_length, 3.0);
        assert_eq!(config.locomotion.max_speed, 8.0);
        assert_eq!(config.locomotion.force_scale, Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn grounded_distance_uses_slack() {
        let config = ControllerConfig::enemy().with_ride_height(2.0, 4.0);
        assert!((config.height.grounded_distance() - 2.6).abs() < 1e-6);
    }

    #[test]
    fn ray_must_exceed_ride_height() {
        let config = ControllerConfig::enemy().with_ride_height(2.0, 2.0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::RayTooShort {
                ray_length: 2.0,
                ride_height: 2.0
            })
        );
    }

    #[test]
    fn ride_height_must_be_positive() {
        let config = ControllerConfig::enemy().with_ride_height(0.0, 1.0);
        assert_eq!(config.validate(), Err(ConfigError::RideHeight(0.0)));
    }

    #[test]
    fn negative_spring_is_rejected() {
        let config = ControllerConfig::enemy().with_height_spring(-1.0, 5.0);
        assert!(matches!(config.validate(), Err(ConfigError::Negative { .. })));
    }

    #[test]
    fn zero_speed_is_rejected() {
        let config = ControllerConfig::enemy().with_movement(0.0, 200.0, 150.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { name: "max speed", .. })
        ));
    }

    #[test]
    fn unsorted_curve_is_rejected() {
        let unsorted = ResponseCurve::Keyframes(vec![
            Vec2::new(-1.0, 1.0),
            Vec2::new(1.0, 3.0),
            Vec2::new(0.0, 2.0),
            Vec2::new(1.0, 1.0),
        ]);
        let config = ControllerConfig::enemy().with_curves(unsorted, ResponseCurve::default());
        assert_eq!(config.validate(), Err(ConfigError::UnsortedKey { index: 2 }));
    }

    #[test]
    fn empty_force_curve_is_rejected() {
        let config = ControllerConfig::enemy()
            .with_curves(ResponseCurve::default(), ResponseCurve::Keyframes(Vec::new()));
        assert_eq!(config.validate(), Err(ConfigError::EmptyCurve));
    }

    #[test]
    fn nan_ride_height_is_rejected() {
        let config = ControllerConfig::enemy().with_ride_height(f32::NAN, 3.0);
        assert!(matches!(config.validate(), Err(ConfigError::RideHeight(_))));
    }
}
