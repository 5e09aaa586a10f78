//! Per-entity context handed to states, sensors and actuators.
//!
//! The FSM never touches the ECS world directly. Systems snapshot what a
//! behavior may read ([`WorldView`]), copy the entity's kinematics into a
//! [`Motion`], and collect everything a behavior wants to change in a
//! [`BehaviorOutput`] that is applied once the FSM call returns. This keeps
//! the FSM testable with a plain `World::spawn_empty()` entity and no
//! schedule.

use bevy_ecs::prelude::Entity;
use glam::Vec2;
use rustc_hash::FxHashMap;

use crate::components::state::StateId;
use crate::events::contact::ContactEvent;
use crate::events::spawn::SpawnRequest;

/// Kinematic intent of the entity for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Motion {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl Motion {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self { position, velocity }
    }
}

/// Read-only snapshot of the surroundings for one frame.
#[derive(Debug, Clone, Copy)]
pub struct WorldView<'a> {
    positions: &'a FxHashMap<Entity, Vec2>,
    contacts: &'a [ContactEvent],
}

impl<'a> WorldView<'a> {
    pub fn new(positions: &'a FxHashMap<Entity, Vec2>, contacts: &'a [ContactEvent]) -> Self {
        Self {
            positions,
            contacts,
        }
    }

    pub fn position_of(&self, entity: Entity) -> Option<Vec2> {
        self.positions.get(&entity).copied()
    }

    /// Contacts addressed to `entity` this frame, in arrival order.
    pub fn contacts_for(&self, entity: Entity) -> impl Iterator<Item = &'a ContactEvent> + use<'a> {
        self.contacts.iter().filter(move |c| c.entity == entity)
    }
}

/// A swap performed by the FSM, reported to collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub from: StateId,
    pub to: StateId,
    pub from_name: String,
    pub to_name: String,
}

/// Side effects requested during an FSM call, applied by the calling system.
#[derive(Debug, Default)]
pub struct BehaviorOutput {
    /// `(emitter entity, emitting)` in request order.
    pub emitter_switches: Vec<(Entity, bool)>,
    /// `(damage sensor entity, armed)` in request order.
    pub damage_sensor_switches: Vec<(Entity, bool)>,
    pub spawns: Vec<SpawnRequest>,
    pub destroy_requested: bool,
    pub state_changes: Vec<StateChange>,
}

impl BehaviorOutput {
    pub fn is_empty(&self) -> bool {
        self.emitter_switches.is_empty()
            && self.damage_sensor_switches.is_empty()
            && self.spawns.is_empty()
            && !self.destroy_requested
            && self.state_changes.is_empty()
    }
}

/// Everything a state, sensor or actuator may see or change during one call.
pub struct BehaviorContext<'a> {
    /// The entity driven by the FSM.
    pub entity: Entity,
    /// Scaled frame delta in seconds, never negative.
    pub dt: f32,
    /// Debug flag of the state currently running.
    pub debug: bool,
    pub motion: &'a mut Motion,
    pub view: WorldView<'a>,
    pub output: &'a mut BehaviorOutput,
}

impl<'a> BehaviorContext<'a> {
    pub fn new(
        entity: Entity,
        dt: f32,
        motion: &'a mut Motion,
        view: WorldView<'a>,
        output: &'a mut BehaviorOutput,
    ) -> Self {
        Self {
            entity,
            dt: dt.max(0.0),
            debug: false,
            motion,
            view,
            output,
        }
    }
}
