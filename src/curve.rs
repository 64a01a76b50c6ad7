//! Authored response curves.
//!
//! The locomotion driver shapes its acceleration with curves keyed by the
//! alignment between the desired direction and the current goal velocity
//! (a dot product in `[-1, 1]`). Curves are piecewise linear between
//! keyframes and clamp to the first/last value outside their domain.

use bevy::prelude::*;

use crate::error::ConfigError;

/// A mapping from a scalar key to a multiplier.
#[derive(Reflect, Debug, Clone, PartialEq)]
pub enum ResponseCurve {
    /// Same value for every key.
    Constant(f32),
    /// Keyframes as `(key, value)` pairs, sorted by key.
    Keyframes(Vec<Vec2>),
}

impl Default for ResponseCurve {
    fn default() -> Self {
        Self::Constant(1.0)
    }
}

impl ResponseCurve {
    /// Build a keyframed curve. Keys are sorted; duplicates keep the last value.
    pub fn from_keys(keys: impl IntoIterator<Item = (f32, f32)>) -> Result<Self, ConfigError> {
        let mut keys: Vec<Vec2> = keys.into_iter().map(|(k, v)| Vec2::new(k, v)).collect();
        if keys.is_empty() {
            return Err(ConfigError::EmptyCurve);
        }
        if let Some(index) = keys.iter().position(|k| !k.is_finite()) {
            return Err(ConfigError::NonFiniteKey { index });
        }

        keys.sort_by(|a, b| a.x.total_cmp(&b.x));
        keys.dedup_by(|later, earlier| {
            if later.x == earlier.x {
                earlier.y = later.y;
                true
            } else {
                false
            }
        });

        Ok(Self::Keyframes(keys))
    }

    /// Check the curve can be sampled: keyframes present, finite, and with
    /// strictly increasing keys. Catches curves built without
    /// [`from_keys`](Self::from_keys), e.g. through reflection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let keys = match self {
            Self::Constant(value) if value.is_finite() => return Ok(()),
            Self::Constant(_) => return Err(ConfigError::NonFiniteKey { index: 0 }),
            Self::Keyframes(keys) => keys,
        };
        if keys.is_empty() {
            return Err(ConfigError::EmptyCurve);
        }
        if let Some(index) = keys.iter().position(|k| !k.is_finite()) {
            return Err(ConfigError::NonFiniteKey { index });
        }
        if let Some(index) = keys.windows(2).position(|pair| pair[1].x <= pair[0].x) {
            return Err(ConfigError::UnsortedKey { index: index + 1 });
        }
        Ok(())
    }

    /// Curve used by the stock presets: full rate when moving along the
    /// current goal velocity, doubled when reversing so turns feel snappy.
    pub fn reversal_boost(boost: f32) -> Self {
        Self::Keyframes(vec![Vec2::new(-1.0, boost), Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0)])
    }

    /// Sample the curve.
    pub fn evaluate(&self, key: f32) -> f32 {
        let keys = match self {
            Self::Constant(value) => return *value,
            Self::Keyframes(keys) => keys,
        };

        let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
            return 1.0;
        };
        if key <= first.x {
            return first.y;
        }
        if key >= last.x {
            return last.y;
        }

        // First keyframe strictly past the key; the one before it is <= key.
        let upper = keys.partition_point(|k| k.x <= key);
        let a = keys[upper - 1];
        let b = keys[upper];
        let t = (key - a.x) / (b.x - a.x);
        a.y + (b.y - a.y) * t
    }
}
