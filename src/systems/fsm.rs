//! FSM systems.
//!
//! This module drives every [`Fsm`] component once per frame:
//!
//! - [`rotate_messages`] – swap the message buffers read during the frame
//! - [`fsm_activation_system`] – validate and enter the initial state of new FSMs
//! - [`fsm_actuator_system`] – run the current state's actuators
//! - [`fsm_sensor_system`] – evaluate sensors and record pending transitions
//! - [`fsm_transition_system`] – perform at most one state swap per FSM
//!
//! # System Ordering
//!
//! The four FSM systems must run chained in the order listed, so a transition
//! requested by a sensor only takes effect after all sensors of the frame
//! were evaluated. See [`crate::simulation::build_schedule`].
//!
//! Each FSM call receives a [`BehaviorContext`] built from the entity's
//! [`MapPosition`] and [`RigidBody`], a snapshot of all positions and this
//! frame's contacts. Side effects the call collected in its
//! [`BehaviorOutput`] are applied through [`BehaviorSinks`] right after.

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemParam;
use glam::Vec2;
use log::{error, warn};
use rustc_hash::FxHashMap;

use crate::components::behaviorcontext::{BehaviorContext, BehaviorOutput, Motion, WorldView};
use crate::components::damageemitter::DamageEmitter;
use crate::components::damagesensor::DamageSensor;
use crate::components::destroyed::Destroyed;
use crate::components::fsm::Fsm;
use crate::components::mapposition::MapPosition;
use crate::components::rigidbody::RigidBody;
use crate::events::contact::ContactEvent;
use crate::events::damage::DamageNotice;
use crate::events::life::{DestroyCause, EntityDestroyedEvent};
use crate::events::spawn::SpawnRequest;
use crate::events::statechange::StateChangeEvent;
use crate::resources::simconfig::SimConfig;
use crate::resources::worldtime::WorldTime;

/// Bundled system parameters that apply a [`BehaviorOutput`] to the world.
#[derive(SystemParam)]
pub struct BehaviorSinks<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub emitters: Query<'w, 's, &'static mut DamageEmitter>,
    pub damage_sensors: Query<'w, 's, &'static mut DamageSensor>,
    pub spawns: MessageWriter<'w, SpawnRequest>,
}

impl BehaviorSinks<'_, '_> {
    pub fn apply(&mut self, entity: Entity, output: BehaviorOutput) {
        for (emitter_entity, on) in output.emitter_switches {
            match self.emitters.get_mut(emitter_entity) {
                Ok(mut emitter) => emitter.set_emitting(on),
                Err(_) => warn!(
                    "{:?}: damage emitter {:?} not found, cannot switch it {}",
                    entity,
                    emitter_entity,
                    if on { "on" } else { "off" }
                ),
            }
        }
        for (sensor_entity, armed) in output.damage_sensor_switches {
            match self.damage_sensors.get_mut(sensor_entity) {
                Ok(mut sensor) if armed => sensor.arm(),
                Ok(mut sensor) => sensor.disarm(),
                Err(_) => warn!("{:?}: damage sensor {:?} not found", entity, sensor_entity),
            }
        }
        for request in output.spawns {
            self.spawns.write(request);
        }
        for change in output.state_changes {
            self.commands.trigger(StateChangeEvent {
                entity,
                from: change.from,
                to: change.to,
                from_name: change.from_name,
                to_name: change.to_name,
            });
        }
        if output.destroy_requested {
            self.commands.trigger(EntityDestroyedEvent {
                entity,
                cause: DestroyCause::Actuator,
            });
        }
    }
}

/// Advance the double buffers of the messages read inside the frame.
///
/// Runs first each frame. Messages written before the frame (contacts from
/// the physics collaborator) stay readable for the whole frame.
/// [`SpawnRequest`]s are read outside the schedule and only rotate when
/// [`Simulation::take_spawn_requests`](crate::simulation::Simulation::take_spawn_requests)
/// drains them.
pub fn rotate_messages(
    mut contacts: ResMut<Messages<ContactEvent>>,
    mut notices: ResMut<Messages<DamageNotice>>,
) {
    contacts.update();
    notices.update();
}

pub(crate) fn snapshot_positions(
    positions: &Query<(Entity, &mut MapPosition)>,
) -> FxHashMap<Entity, Vec2> {
    positions.iter().map(|(e, p)| (e, p.pos)).collect()
}

/// Build a context for `entity`, run `f`, then write the resulting motion
/// back unless the body is frozen.
fn drive<R>(
    entity: Entity,
    dt: f32,
    snapshot: &FxHashMap<Entity, Vec2>,
    contacts: &[ContactEvent],
    positions: &mut Query<(Entity, &mut MapPosition)>,
    bodies: &mut Query<&mut RigidBody>,
    f: impl FnOnce(&mut BehaviorContext) -> R,
) -> (R, BehaviorOutput) {
    let body = bodies.get(entity).ok();
    let frozen = body.is_some_and(|b| b.is_frozen());
    let mut motion = Motion::new(
        snapshot.get(&entity).copied().unwrap_or(Vec2::ZERO),
        body.map(|b| b.velocity).unwrap_or(Vec2::ZERO),
    );
    let before = motion;
    let mut output = BehaviorOutput::default();
    let result = {
        let mut ctx = BehaviorContext::new(
            entity,
            dt,
            &mut motion,
            WorldView::new(snapshot, contacts),
            &mut output,
        );
        f(&mut ctx)
    };

    if !frozen {
        if motion.position != before.position {
            if let Ok((_, mut position)) = positions.get_mut(entity) {
                position.pos = motion.position;
            }
        }
        if motion.velocity != before.velocity {
            if let Ok(mut body) = bodies.get_mut(entity) {
                body.velocity = motion.velocity;
            }
        }
    }
    (result, output)
}

/// Validate and activate FSMs that have not entered their initial state yet.
///
/// Damage emitters owned by the initial state are marked `active_from_start`.
/// An FSM that fails validation is logged once and left inactive.
pub fn fsm_activation_system(
    mut fsms: Query<(Entity, &mut Fsm), Without<Destroyed>>,
    mut positions: Query<(Entity, &mut MapPosition)>,
    mut bodies: Query<&mut RigidBody>,
    mut contacts: MessageReader<ContactEvent>,
    time: Res<WorldTime>,
    config: Option<Res<SimConfig>>,
    mut sinks: BehaviorSinks,
) {
    let contacts: Vec<ContactEvent> = contacts.read().copied().collect();
    if !fsms.iter().any(|(_, fsm)| fsm.needs_activation()) {
        return;
    }
    let snapshot = snapshot_positions(&positions);
    let debug_all = config.map(|c| c.debug).unwrap_or(false);

    for (entity, mut fsm) in fsms.iter_mut() {
        if !fsm.needs_activation() {
            continue;
        }
        if debug_all {
            fsm.enable_debug();
        }
        if let Err(e) = fsm.validate() {
            error!("FSM on {:?} is invalid and stays inactive: {}", entity, e);
            fsm.mark_invalid();
            continue;
        }
        for emitter_entity in fsm.initial_damage_emitters().to_vec() {
            if let Ok(mut emitter) = sinks.emitters.get_mut(emitter_entity) {
                emitter.active_from_start = true;
            }
        }
        let (_, output) = drive(
            entity,
            time.delta,
            &snapshot,
            &contacts,
            &mut positions,
            &mut bodies,
            |ctx| fsm.activate(ctx),
        );
        sinks.apply(entity, output);
    }
}

/// Run the current state's actuators.
pub fn fsm_actuator_system(
    mut fsms: Query<(Entity, &mut Fsm), Without<Destroyed>>,
    mut positions: Query<(Entity, &mut MapPosition)>,
    mut bodies: Query<&mut RigidBody>,
    mut contacts: MessageReader<ContactEvent>,
    time: Res<WorldTime>,
    mut sinks: BehaviorSinks,
) {
    let contacts: Vec<ContactEvent> = contacts.read().copied().collect();
    let snapshot = snapshot_positions(&positions);

    for (entity, mut fsm) in fsms.iter_mut() {
        let (_, output) = drive(
            entity,
            time.delta,
            &snapshot,
            &contacts,
            &mut positions,
            &mut bodies,
            |ctx| fsm.tick(ctx),
        );
        if !output.is_empty() {
            sinks.apply(entity, output);
        }
    }
}

/// Evaluate every sensor of every FSM and forward notifications.
pub fn fsm_sensor_system(
    mut fsms: Query<(Entity, &mut Fsm), Without<Destroyed>>,
    positions: Query<(Entity, &MapPosition)>,
    mut contacts: MessageReader<ContactEvent>,
    time: Res<WorldTime>,
) {
    let contacts: Vec<ContactEvent> = contacts.read().copied().collect();
    let snapshot: FxHashMap<Entity, Vec2> = positions.iter().map(|(e, p)| (e, p.pos)).collect();
    let view = WorldView::new(&snapshot, &contacts);

    for (entity, mut fsm) in fsms.iter_mut() {
        fsm.evaluate_sensors(entity, time.delta, &view);
    }
}

/// Swap states for FSMs with a pending transition and publish the change.
pub fn fsm_transition_system(
    mut fsms: Query<(Entity, &mut Fsm), Without<Destroyed>>,
    mut positions: Query<(Entity, &mut MapPosition)>,
    mut bodies: Query<&mut RigidBody>,
    time: Res<WorldTime>,
    mut sinks: BehaviorSinks,
) {
    let mut snapshot: Option<FxHashMap<Entity, Vec2>> = None;

    for (entity, mut fsm) in fsms.iter_mut() {
        if fsm.pending_transition().is_none() {
            continue;
        }
        let snapshot = snapshot.get_or_insert_with(|| snapshot_positions(&positions));
        let (_, output) = drive(
            entity,
            time.delta,
            snapshot,
            &[],
            &mut positions,
            &mut bodies,
            |ctx| fsm.resolve_transitions(ctx),
        );
        sinks.apply(entity, output);
    }
}
