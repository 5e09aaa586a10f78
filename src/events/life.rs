//! Life and destruction events, and the observer that pauses destroyed
//! entities.
//!
//! - [`LifeChangedEvent`] is triggered whenever a [`Life`](crate::components::life::Life)
//!   value moves (UI collaborators).
//! - [`EntityDestroyedEvent`] is triggered when an entity must go away: its
//!   life reached zero, it was a spent `destroy_after_hit` emitter, or one of
//!   its actuators asked for it.
//!
//! [`observe_entity_destroyed`] handles the latter: it marks the entity
//! [`Destroyed`], switches its own emitter off, disables the current state's
//! actuators and freezes its body. With
//! [`SimConfig::despawn_destroyed`](crate::resources::simconfig::SimConfig)
//! it also tears the FSM down and despawns the entity.

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::info;
use rustc_hash::FxHashMap;

use crate::components::behaviorcontext::{BehaviorContext, BehaviorOutput, Motion, WorldView};
use crate::components::destroyed::Destroyed;
use crate::components::fsm::Fsm;
use crate::components::rigidbody::RigidBody;
use crate::resources::simconfig::SimConfig;
use crate::systems::fsm::BehaviorSinks;

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct LifeChangedEvent {
    pub entity: Entity,
    pub previous: f32,
    pub current: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyCause {
    /// Life reached zero.
    Killed,
    /// A `destroy_after_hit` emitter delivered its hit.
    EmitterSpent,
    /// An actuator requested it (e.g. destroy on collision).
    Actuator,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDestroyedEvent {
    pub entity: Entity,
    pub cause: DestroyCause,
}

pub fn observe_entity_destroyed(
    trigger: On<EntityDestroyedEvent>,
    destroyed: Query<(), With<Destroyed>>,
    mut fsms: Query<&mut Fsm>,
    mut bodies: Query<&mut RigidBody>,
    config: Option<Res<SimConfig>>,
    mut sinks: BehaviorSinks,
) {
    let EntityDestroyedEvent { entity, cause } = *trigger.event();
    if destroyed.contains(entity) {
        return;
    }
    info!("{:?} destroyed ({:?})", entity, cause);

    sinks.commands.entity(entity).try_insert(Destroyed);
    if let Ok(mut emitter) = sinks.emitters.get_mut(entity) {
        emitter.set_emitting(false);
    }

    let mut body = bodies.get_mut(entity).ok();
    let mut fsm = fsms.get_mut(entity).ok();
    match fsm.as_deref_mut() {
        Some(fsm) => fsm.deactivate_current_actuators(body.as_deref_mut()),
        None => {
            if let Some(body) = body.as_deref_mut() {
                body.freeze();
            }
        }
    }

    let despawn = config.map(|c| c.despawn_destroyed).unwrap_or(false);
    if !despawn {
        return;
    }
    if let Some(fsm) = fsm.as_deref_mut() {
        let positions = FxHashMap::default();
        let mut motion = Motion::default();
        let mut output = BehaviorOutput::default();
        {
            let mut ctx = BehaviorContext::new(
                entity,
                0.0,
                &mut motion,
                WorldView::new(&positions, &[]),
                &mut output,
            );
            fsm.teardown(&mut ctx);
        }
        sinks.apply(entity, output);
    }
    sinks.commands.entity(entity).try_despawn();
}
