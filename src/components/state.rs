//! FSM states: bundles of actuators, sensor-driven transitions and damage
//! emitters that are active as a unit.
//!
//! # Entry sequence ([`State::start`])
//!
//! 1. Start every actuator in declared order. A failing actuator is logged
//!    and disabled; the others still start.
//! 2. Arm every transition's sensor.
//! 3. Switch every owned damage emitter on (and arm gated damage sensors).
//! 4. Subscribe this state's handler to every transition's sensor.
//!
//! # Exit sequence ([`State::destroy`])
//!
//! Destroy actuators, clear the pending transition, unsubscribe from every
//! sensor, disarm them, then switch damage emitters off.
//!
//! # Transition tie-break
//!
//! The handler overwrites `pending` on every notification, so when several
//! sensors fire in the same frame the **last notification wins**. There is no
//! priority between transitions; authors keep sensor conditions disjoint.

use bevy_ecs::prelude::Entity;
use log::{error, warn};
use thiserror::Error;

use crate::components::actuator::{Actuator, ActuatorSlot};
use crate::components::behaviorcontext::BehaviorContext;
use crate::components::sensor::{Sensor, SensorId};

/// Index of a state inside its FSM arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) usize);

impl StateId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Errors raised while authoring an FSM graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthoringError {
    #[error("state '{state}' already has an actuator of kind '{kind}'")]
    DuplicateActuatorKind { state: String, kind: &'static str },

    #[error("unknown state {0:?}")]
    UnknownState(StateId),

    #[error("unknown sensor {0:?}")]
    UnknownSensor(SensorId),

    #[error("no initial state configured")]
    MissingInitialState,
}

/// Static pairing of a sensor with the state it leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub sensor: SensorId,
    /// `None` is a configuration error: the sensor is armed but never listened to.
    pub target: Option<StateId>,
}

#[derive(Debug)]
pub struct State {
    name: String,
    actuators: Vec<ActuatorSlot>,
    transitions: Vec<Transition>,
    damage_emitters: Vec<Entity>,
    damage_sensors: Vec<Entity>,
    pending: Option<StateId>,
    debug: bool,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actuators: Vec::new(),
            transitions: Vec::new(),
            damage_emitters: Vec::new(),
            damage_sensors: Vec::new(),
            pending: None,
            debug: false,
        }
    }

    /// Attach an actuator. A second actuator of an already present kind is
    /// discarded and reported.
    pub fn add_actuator(&mut self, actuator: Box<dyn Actuator>) -> Result<(), AuthoringError> {
        let kind = actuator.kind();
        if self.actuators.iter().any(|slot| slot.kind() == kind) {
            error!(
                "An attempt was made to add a second actuator of kind '{}' to state '{}'",
                kind, self.name
            );
            return Err(AuthoringError::DuplicateActuatorKind {
                state: self.name.clone(),
                kind,
            });
        }
        self.actuators.push(ActuatorSlot::new(actuator));
        Ok(())
    }

    /// Builder form of [`State::add_actuator`]; duplicates are dropped after
    /// being logged.
    pub fn with_actuator(mut self, actuator: impl Actuator) -> Self {
        let _ = self.add_actuator(Box::new(actuator));
        self
    }

    pub fn with_damage_emitter(mut self, emitter: Entity) -> Self {
        self.damage_emitters.push(emitter);
        self
    }

    /// Damage sensors that only accept hits while this state is current.
    pub fn with_damage_sensor(mut self, sensor: Entity) -> Self {
        self.damage_sensors.push(sensor);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub(crate) fn push_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    pub(crate) fn start(&mut self, id: StateId, sensors: &mut [Sensor], ctx: &mut BehaviorContext) {
        ctx.debug = self.debug;
        for slot in self.actuators.iter_mut() {
            if let Err(e) = slot.start(ctx) {
                warn!("State '{}': {}; actuator disabled", self.name, e);
            }
        }

        for transition in &self.transitions {
            if let Some(sensor) = sensors.get_mut(transition.sensor.0) {
                sensor.arm();
            }
        }

        for emitter in &self.damage_emitters {
            ctx.output.emitter_switches.push((*emitter, true));
        }
        for sensor in &self.damage_sensors {
            ctx.output.damage_sensor_switches.push((*sensor, true));
        }

        for transition in &self.transitions {
            if transition.target.is_none() {
                continue;
            }
            if let Some(sensor) = sensors.get_mut(transition.sensor.0) {
                sensor.subscribe(id);
            }
        }
    }

    pub(crate) fn update(&mut self, ctx: &mut BehaviorContext) {
        ctx.debug = self.debug;
        for slot in self.actuators.iter_mut() {
            slot.update(ctx);
        }
    }

    pub(crate) fn destroy(
        &mut self,
        id: StateId,
        sensors: &mut [Sensor],
        ctx: &mut BehaviorContext,
    ) {
        ctx.debug = self.debug;
        for slot in self.actuators.iter_mut() {
            slot.destroy(ctx);
        }

        self.pending = None;

        for transition in &self.transitions {
            if transition.target.is_none() {
                continue;
            }
            if let Some(sensor) = sensors.get_mut(transition.sensor.0) {
                if let Err(e) = sensor.unsubscribe(id) {
                    error!(
                        "State '{}' could not unsubscribe from sensor '{}': {}",
                        self.name,
                        sensor.name(),
                        e
                    );
                }
            }
        }

        for transition in &self.transitions {
            if let Some(sensor) = sensors.get_mut(transition.sensor.0) {
                sensor.disarm();
            }
        }

        for emitter in &self.damage_emitters {
            ctx.output.emitter_switches.push((*emitter, false));
        }
        for sensor in &self.damage_sensors {
            ctx.output.damage_sensor_switches.push((*sensor, false));
        }
    }

    /// Internal handler invoked once per notification of a subscribed sensor.
    pub(crate) fn on_sensor_notified(&mut self, sensor: SensorId) {
        if let Some(target) = self
            .transitions
            .iter()
            .filter(|t| t.sensor == sensor)
            .find_map(|t| t.target)
        {
            self.pending = Some(target);
        }
    }

    pub(crate) fn take_pending(&mut self) -> Option<StateId> {
        self.pending.take()
    }

    /// Disable every actuator without leaving the state.
    pub fn deactivate_all_actuators(&mut self) {
        for slot in self.actuators.iter_mut() {
            slot.disable();
        }
    }

    pub fn pending_transition(&self) -> Option<StateId> {
        self.pending
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn damage_emitters(&self) -> &[Entity] {
        &self.damage_emitters
    }

    pub fn damage_sensors(&self) -> &[Entity] {
        &self.damage_sensors
    }

    pub fn actuator_count(&self) -> usize {
        self.actuators.len()
    }

    pub fn actuator_kinds(&self) -> Vec<&'static str> {
        self.actuators.iter().map(|slot| slot.kind()).collect()
    }

    /// Clear every later slot whose kind already appeared; returns the
    /// dropped kinds.
    pub(crate) fn drop_duplicate_actuators(&mut self) -> Vec<&'static str> {
        let mut seen: Vec<&'static str> = Vec::with_capacity(self.actuators.len());
        let mut dropped = Vec::new();
        self.actuators.retain(|slot| {
            let kind = slot.kind();
            if seen.contains(&kind) {
                dropped.push(kind);
                false
            } else {
                seen.push(kind);
                true
            }
        });
        dropped
    }

    pub fn is_actuator_enabled(&self, index: usize) -> bool {
        self.actuators
            .get(index)
            .map(|slot| slot.is_enabled())
            .unwrap_or(false)
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }
}
