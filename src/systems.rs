//! Core controller systems.
//!
//! These systems run the per-tick control loop. They are generic over the
//! physics backend so the same control code drives any engine.
//!
//! A tick only does work for characters whose steering resolved this tick
//! and whose probe classified as grounded; everything else is left to the
//! engine.

use std::time::Duration;

use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::config::ControllerConfig;
use crate::controller::CharacterController;
use crate::detection::GroundProbe;
use crate::intent::SteeringIntent;
use crate::locomotion::{lean_point, locomotion_step, LocomotionInput};
use crate::oscillator::SquashStretch;
use crate::spring::height_spring;
use crate::state::{transitions, Airborne, ControllerEvent, ControllerEventKind, Grounded};
use crate::upright::{look_direction, update_target_rotation, upright_torque};

/// Squared steering length above which a grounded character counts as moving.
const MOVING_EPSILON_SQUARED: f32 = 1e-6;

/// Start a tick: advance modifiers, refresh gravity, reset the probe and
/// resolve steering.
///
/// A [`SteeringIntent::Target`] whose entity no longer exists resolves to
/// no steering, as does a missing intent.
pub fn prepare_controllers<B: CharacterPhysicsBackend>(world: &mut World) {
    let delta = Duration::from_secs_f32(B::get_fixed_timestep(world));

    let entities: Vec<(Entity, SteeringIntent)> = world
        .query_filtered::<(Entity, Option<&SteeringIntent>), With<CharacterController>>()
        .iter(world)
        .map(|(e, intent)| (e, intent.copied().unwrap_or_default()))
        .collect();

    for (entity, intent) in entities {
        let position = B::get_position(world, entity);
        let target_position = match intent {
            SteeringIntent::Target(target) => world
                .get_entity(target)
                .is_ok()
                .then(|| B::get_position(world, target)),
            _ => None,
        };
        let gravity = B::get_gravity(world, entity);

        let Some(mut controller) = world.get_mut::<CharacterController>(entity) else {
            continue;
        };
        controller.tick_modifiers(delta);
        if let Some(gravity) = gravity {
            controller.gravity = gravity;
        }
        controller.probe = GroundProbe::miss();
        controller.steering = intent.resolve(position, target_position);
    }
}

/// Classify the probe, send edge events and sync the state markers.
pub fn update_grounded_state(world: &mut World) {
    let mut events = Vec::new();
    let mut markers = Vec::new();

    let mut query = world.query::<(Entity, &ControllerConfig, &mut CharacterController)>();
    for (entity, config, mut controller) in query.iter_mut(world) {
        let Some(steering) = controller.steering else {
            continue;
        };

        let grounded = controller.probe.is_grounded(config.height.ride_height);
        let moving = grounded && steering.length_squared() > MOVING_EPSILON_SQUARED;

        controller.was_grounded = controller.is_grounded;
        for kind in transitions(controller.was_grounded, grounded, controller.is_moving, moving) {
            match kind {
                ControllerEventKind::Landed => {
                    debug!("{entity} landed at {:.3}", controller.probe.distance());
                }
                ControllerEventKind::LeftGround => debug!("{entity} left the ground"),
                _ => {}
            }
            events.push(ControllerEvent::new(entity, kind));
        }

        controller.is_grounded = grounded;
        controller.is_moving = moving;
        markers.push((entity, grounded));
    }

    for (entity, grounded) in markers {
        let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
            continue;
        };
        if grounded && !entity_mut.contains::<Grounded>() {
            entity_mut.insert(Grounded).remove::<Airborne>();
        } else if !grounded && !entity_mut.contains::<Airborne>() {
            entity_mut.insert(Airborne).remove::<Grounded>();
        }
    }

    if !events.is_empty() {
        world.send_event_batch(events);
    }
}

/// Collect the controllers that are steering and grounded this tick.
fn active_controllers(world: &mut World) -> Vec<(Entity, ControllerConfig, CharacterController)> {
    world
        .query::<(Entity, &ControllerConfig, &CharacterController)>()
        .iter(world)
        .filter(|(_, _, controller)| controller.is_active())
        .map(|(e, config, controller)| (e, config.clone(), controller.clone()))
        .collect()
}

/// Drive the body toward its steering direction.
///
/// The force is applied above the body origin so the character leans into
/// its acceleration.
pub fn apply_locomotion<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    for (entity, config, controller) in active_controllers(world) {
        let Some(direction) = controller.steering else {
            continue;
        };

        let input = LocomotionInput {
            direction,
            goal_velocity: controller.goal_velocity,
            velocity: B::get_velocity(world, entity),
            speed_scale: controller.speed_scale(),
            max_accel_force_factor: controller.max_accel_force_factor(),
            mass: B::get_mass(world, entity),
            dt,
        };
        let step = locomotion_step(&config.locomotion, input);

        let point = lean_point(
            B::get_position(world, entity),
            B::get_scale(world, entity).y,
            config.locomotion.lean_factor,
        );
        B::apply_force_at_point(world, entity, step.force, point);
        trace!("{entity} locomotion: goal {} force {}", step.goal_velocity, step.force);

        if let Some(mut controller) = world.get_mut::<CharacterController>(entity) {
            controller.goal_velocity = step.goal_velocity;
        }
    }
}

/// Hold the body at its ride height.
///
/// A dynamic body under the character gets the opposite force at the hit
/// point, so characters weigh down what they stand on.
pub fn apply_height_spring<B: CharacterPhysicsBackend>(world: &mut World) {
    for (entity, config, controller) in active_controllers(world) {
        if !config.height.maintain_height {
            continue;
        }
        let Some(hit) = controller.probe.hit else {
            continue;
        };

        let velocity = B::get_velocity(world, entity);
        let ground_velocity = hit
            .entity
            .map(|body| B::get_velocity(world, body))
            .unwrap_or(Vec3::ZERO);
        let mass = B::get_mass(world, entity);

        let spring = height_spring(
            &config.height,
            hit.distance,
            velocity,
            ground_velocity,
            controller.gravity * mass,
        );
        B::apply_force(world, entity, spring.applied_force);
        trace!("{entity} height spring: {} at {:.3}", spring.spring_force, hit.distance);

        if let Some(mut oscillator) = world.get_mut::<SquashStretch>(entity) {
            oscillator.apply_force(spring.oscillation_force());
        }

        if let Some(body) = hit.entity {
            if B::is_dynamic(world, body) {
                B::apply_force_at_point(world, body, spring.reaction_force(), hit.point);
            }
        }
    }
}

/// Keep the body upright and facing its look direction.
///
/// With no look direction, a character parented to a platform follows the
/// platform's yaw.
pub fn apply_upright_torque<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let entities: Vec<(Entity, ControllerConfig, Option<Entity>)> = world
        .query::<(Entity, &ControllerConfig, &CharacterController, Option<&ChildOf>)>()
        .iter(world)
        .filter(|(_, config, controller, _)| controller.is_active() && config.upright.enabled)
        .map(|(e, config, _, child_of)| (e, config.clone(), child_of.map(ChildOf::parent)))
        .collect();

    for (entity, config, parent) in entities {
        let velocity = B::get_velocity(world, entity);
        let rotation = B::get_rotation(world, entity);
        let angular_velocity = B::get_angular_velocity(world, entity);
        let platform = parent
            .and_then(|p| world.get::<GlobalTransform>(p))
            .map(GlobalTransform::rotation);

        let Some(mut controller) = world.get_mut::<CharacterController>(entity) else {
            continue;
        };
        let steering = controller.steering.unwrap_or(Vec3::ZERO);
        let look = look_direction(
            config.upright.look_direction,
            velocity,
            steering,
            &mut controller.previous_velocity,
            dt,
        );
        let detached = controller.probe.is_detached();
        update_target_rotation(&mut controller, look, detached, platform);
        let target = controller.upright_target;

        let torque = upright_torque(&config.upright, target, rotation, angular_velocity);
        B::apply_torque(world, entity, torque);
        trace!("{entity} upright torque: {torque}");
    }
}

/// Warn about controller configs that cannot work.
pub fn validate_configs(query: Query<(Entity, &ControllerConfig), Changed<ControllerConfig>>) {
    for (entity, config) in &query {
        if let Err(error) = config.validate() {
            warn!("invalid controller config on {entity}: {error}");
        }
    }
}
