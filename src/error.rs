//! Configuration errors.

use thiserror::Error;

/// Errors produced when validating a [`ControllerConfig`](crate::config::ControllerConfig)
/// or building a [`ResponseCurve`](crate::curve::ResponseCurve).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("ride height must be positive, got {0}")]
    RideHeight(f32),

    #[error("ground ray length {ray_length} must exceed ride height {ride_height}")]
    RayTooShort { ray_length: f32, ride_height: f32 },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },

    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },

    #[error("response curve needs at least one keyframe")]
    EmptyCurve,

    #[error("response curve keyframe {index} is not finite")]
    NonFiniteKey { index: usize },

    #[error("response curve keyframe {index} does not come after the one before it")]
    UnsortedKey { index: usize },
}
