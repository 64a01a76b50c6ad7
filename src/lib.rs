//! # `floating_capsule_controller`
//!
//! A floating rigidbody character controller for 3D, with physics backend abstraction.
//!
//! This crate provides a force-driven character controller that:
//! - Rides above the ground on a spring-damper along a downward ray
//! - Stays upright with a torsional spring, facing where it moves
//! - Follows the yaw of a rotating parent platform
//! - Accelerates with response curves that favour sharp reversals
//! - Pushes back on dynamic bodies it stands on
//! - Abstracts the physics backend (Rapier3D included)
//!
//! ## Architecture
//!
//! The controller uses a **floating rigidbody** approach where:
//! 1. A dynamic rigidbody handles collisions normally
//! 2. A raycast measures the distance to the ground
//! 3. A spring-damper holds the body at its ride height, cancelling gravity
//! 4. Movement, height and orientation are all applied as forces and torques
//!
//! The controller never writes positions or velocities.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use floating_capsule_controller::prelude::*;
//!
//! let controller = CharacterController::new();
//! let config = ControllerConfig::enemy();
//! let mut intent = SteeringIntent::default();
//! intent.set_direction(Vec3::X);
//!
//! assert!(config.validate().is_ok());
//! // Spawn these together with the physics components of your backend.
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod controller;
pub mod curve;
pub mod detection;
pub mod error;
pub mod intent;
pub mod locomotion;
pub mod oscillator;
pub mod spring;
pub mod state;
pub mod systems;
pub mod upright;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::{CharacterPhysicsBackend, ForceAccumulator};
    pub use crate::collision::CollisionData;
    pub use crate::config::{
        ControllerConfig, HeightSpringConfig, LocomotionConfig, LookDirection, UprightSpringConfig,
    };
    pub use crate::controller::CharacterController;
    pub use crate::curve::ResponseCurve;
    pub use crate::detection::GroundProbe;
    pub use crate::error::ConfigError;
    pub use crate::intent::SteeringIntent;
    pub use crate::oscillator::SquashStretch;
    pub use crate::state::{Airborne, ControllerEvent, ControllerEventKind, Grounded};
    pub use crate::{CharacterControllerPlugin, CharacterControllerSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, Rapier3dCharacterBundle};
}

/// Phases of a controller tick, chained in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CharacterControllerSet {
    /// Take back last tick's forces, advance modifiers, resolve steering.
    Preparation,
    /// Backend ground sensing.
    Sensors,
    /// Grounded classification and the three regulators.
    Regulation,
    /// Hand accumulated forces to the physics engine.
    FinalApplication,
}

/// Main plugin for the character controller system.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (raycasting, force application, etc.).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier3dBackend`)
///
/// # Examples
///
/// With Rapier3D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use floating_capsule_controller::prelude::*;
///
/// App::new()
///     .add_plugins(MinimalPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
///     .add_plugins(CharacterControllerPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct CharacterControllerPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for CharacterControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for CharacterControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<controller::CharacterController>();
        app.register_type::<config::ControllerConfig>();
        app.register_type::<config::HeightSpringConfig>();
        app.register_type::<config::UprightSpringConfig>();
        app.register_type::<config::LocomotionConfig>();
        app.register_type::<config::LookDirection>();
        app.register_type::<curve::ResponseCurve>();
        app.register_type::<intent::SteeringIntent>();
        app.register_type::<oscillator::SquashStretch>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();

        app.add_event::<state::ControllerEvent>();

        app.configure_sets(
            FixedUpdate,
            (
                CharacterControllerSet::Preparation,
                CharacterControllerSet::Sensors,
                CharacterControllerSet::Regulation,
                CharacterControllerSet::FinalApplication,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (systems::validate_configs, systems::prepare_controllers::<B>)
                .chain()
                .in_set(CharacterControllerSet::Preparation),
        );

        // Order inside a tick: classify, then locomotion, height, upright.
        app.add_systems(
            FixedUpdate,
            (
                systems::update_grounded_state,
                systems::apply_locomotion::<B>,
                systems::apply_height_spring::<B>,
                systems::apply_upright_torque::<B>,
                oscillator::animate_squash_stretch,
            )
                .chain()
                .in_set(CharacterControllerSet::Regulation),
        );
    }
}
