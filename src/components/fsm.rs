//! Finite state machine component driving one entity's behavior.
//!
//! The [`Fsm`] component owns an arena of [`State`]s and an arena of
//! [`Sensor`]s. States refer to sensors through [`SensorId`] handles, so the
//! same sensor can back transitions declared by several states. Exactly one
//! state is current after activation.
//!
//! # Frame protocol
//!
//! The FSM systems call, in this order and never interleaved:
//!
//! 1. [`Fsm::activate`] once, the first frame the component is seen
//! 2. [`Fsm::tick`] runs the current state's actuators
//! 3. [`Fsm::evaluate_sensors`] evaluates every armed sensor and forwards
//!    notifications to the subscribed state's handler
//! 4. [`Fsm::resolve_transitions`] swaps to the pending state, if any
//!
//! A transition requested in step 3 therefore takes effect only after all of
//! that frame's sensor evaluations completed.
//!
//! # Example
//!
//! ```ignore
//! let mut fsm = Fsm::new();
//! let idle = fsm.add_state(State::new("idle"));
//! let chase = fsm.add_state(State::new("chase").with_actuator(MoveToTargetActuator::new(player, 2.0)));
//! let near = fsm.add_sensor(Sensor::new("near", SensorKind::Distance(DistanceSensor::new(Some(player), 50.0))));
//! fsm.add_transition(idle, near, Some(chase))?;
//! fsm.set_initial(idle)?;
//! commands.spawn((fsm, MapPosition::new(0.0, 0.0), RigidBody::new()));
//! ```

use bevy_ecs::prelude::*;
use log::{info, warn};

use crate::components::behaviorcontext::{BehaviorContext, StateChange, WorldView};
use crate::components::rigidbody::RigidBody;
use crate::components::sensor::{Sensor, SensorId};
use crate::components::state::{AuthoringError, State, StateId, Transition};

#[derive(Component, Debug, Default)]
pub struct Fsm {
    states: Vec<State>,
    sensors: Vec<Sensor>,
    initial: Option<StateId>,
    current: Option<StateId>,
    torn_down: bool,
    invalid: bool,
}

impl Fsm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_state(&mut self, state: State) -> StateId {
        self.states.push(state);
        StateId(self.states.len() - 1)
    }

    pub fn add_sensor(&mut self, sensor: Sensor) -> SensorId {
        self.sensors.push(sensor);
        SensorId(self.sensors.len() - 1)
    }

    /// Declare a transition owned by `from`. `to == None` is accepted and
    /// reported by [`Fsm::validate`].
    pub fn add_transition(
        &mut self,
        from: StateId,
        sensor: SensorId,
        to: Option<StateId>,
    ) -> Result<(), AuthoringError> {
        if sensor.0 >= self.sensors.len() {
            return Err(AuthoringError::UnknownSensor(sensor));
        }
        if let Some(target) = to {
            if target.0 >= self.states.len() {
                return Err(AuthoringError::UnknownState(target));
            }
        }
        let state = self
            .states
            .get_mut(from.0)
            .ok_or(AuthoringError::UnknownState(from))?;
        state.push_transition(Transition { sensor, target: to });
        Ok(())
    }

    pub fn set_initial(&mut self, state: StateId) -> Result<(), AuthoringError> {
        if state.0 >= self.states.len() {
            return Err(AuthoringError::UnknownState(state));
        }
        self.initial = Some(state);
        Ok(())
    }

    /// Authoring pass run before activation.
    ///
    /// Clears actuator slots repeating a kind already present in their
    /// state, requires an initial state, copies each state's debug flag onto
    /// the sensors its transitions reference, and warns about transitions
    /// with no target.
    pub fn validate(&mut self) -> Result<(), AuthoringError> {
        for state in &mut self.states {
            for kind in state.drop_duplicate_actuators() {
                warn!(
                    "State '{}' had a second actuator of kind '{}'; the slot was cleared",
                    state.name(),
                    kind
                );
            }
        }

        if self.initial.is_none() {
            return Err(AuthoringError::MissingInitialState);
        }

        for state in &self.states {
            for transition in state.transitions() {
                if transition.target.is_none() {
                    warn!(
                        "Transition in state '{}' has no target state; its sensor will be ignored",
                        state.name()
                    );
                }
                if state.is_debug() {
                    if let Some(sensor) = self.sensors.get_mut(transition.sensor.0) {
                        sensor.set_debug(true);
                    }
                }
            }
        }
        Ok(())
    }

    /// Damage emitters owned by the initial state; they emit from the first
    /// frame.
    pub fn initial_damage_emitters(&self) -> &[Entity] {
        self.initial
            .and_then(|id| self.states.get(id.0))
            .map(|state| state.damage_emitters())
            .unwrap_or(&[])
    }

    /// Turn on debug logging for every state and sensor.
    pub fn enable_debug(&mut self) {
        for state in &mut self.states {
            state.set_debug(true);
        }
        for sensor in &mut self.sensors {
            sensor.set_debug(true);
        }
    }

    pub fn needs_activation(&self) -> bool {
        self.current.is_none() && !self.torn_down && !self.invalid
    }

    pub(crate) fn mark_invalid(&mut self) {
        self.invalid = true;
    }

    /// Enter the initial state.
    pub fn activate(&mut self, ctx: &mut BehaviorContext) {
        if !self.needs_activation() {
            return;
        }
        let Some(initial) = self.initial else {
            warn!("FSM on {:?} has no initial state; it stays inactive", ctx.entity);
            return;
        };
        self.current = Some(initial);
        if let Some(state) = self.states.get_mut(initial.0) {
            state.start(initial, &mut self.sensors, ctx);
        }
    }

    /// Run the current state's per-frame update.
    pub fn tick(&mut self, ctx: &mut BehaviorContext) {
        if self.torn_down {
            return;
        }
        if let Some(state) = self.current.and_then(|id| self.states.get_mut(id.0)) {
            state.update(ctx);
        }
    }

    /// Evaluate every sensor in arena order and deliver notifications.
    pub fn evaluate_sensors(&mut self, owner: Entity, dt: f32, view: &WorldView) {
        if self.torn_down {
            return;
        }
        for index in 0..self.sensors.len() {
            if self.sensors[index].evaluate(owner, dt, view) {
                self.deliver(SensorId(index));
            }
        }
    }

    /// Fire a sensor's notification as if it had detected its condition.
    pub fn notify(&mut self, sensor: SensorId) -> Result<(), AuthoringError> {
        if sensor.0 >= self.sensors.len() {
            return Err(AuthoringError::UnknownSensor(sensor));
        }
        self.deliver(sensor);
        Ok(())
    }

    fn deliver(&mut self, sensor: SensorId) {
        for observer in self.sensors[sensor.0].notify() {
            if let Some(state) = self.states.get_mut(observer.0) {
                state.on_sensor_notified(sensor);
            }
        }
    }

    /// Perform at most one state swap. Returns the change, also pushed to
    /// `ctx.output.state_changes`.
    pub fn resolve_transitions(&mut self, ctx: &mut BehaviorContext) -> Option<StateChange> {
        if self.torn_down {
            return None;
        }
        let from = self.current?;
        let to = self.states.get_mut(from.0)?.take_pending()?;
        if to == from || to.0 >= self.states.len() {
            return None;
        }

        self.states[from.0].destroy(from, &mut self.sensors, ctx);
        self.current = Some(to);
        self.states[to.0].start(to, &mut self.sensors, ctx);

        let change = StateChange {
            from,
            to,
            from_name: self.states[from.0].name().to_string(),
            to_name: self.states[to.0].name().to_string(),
        };
        info!(
            "{:?}: state '{}' -> '{}'",
            ctx.entity, change.from_name, change.to_name
        );
        ctx.output.state_changes.push(change.clone());
        Some(change)
    }

    /// Run the current state's exit sequence. Safe to call more than once.
    pub fn teardown(&mut self, ctx: &mut BehaviorContext) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        if let Some(id) = self.current {
            if let Some(state) = self.states.get_mut(id.0) {
                state.destroy(id, &mut self.sensors, ctx);
            }
        }
    }

    /// Pause the entity without changing state: disable the current state's
    /// actuators and freeze its body.
    pub fn deactivate_current_actuators(&mut self, body: Option<&mut RigidBody>) {
        if let Some(state) = self.current.and_then(|id| self.states.get_mut(id.0)) {
            state.deactivate_all_actuators();
        }
        if let Some(body) = body {
            body.freeze();
        }
    }

    pub fn current_state(&self) -> Option<StateId> {
        self.current
    }

    pub fn current_state_name(&self) -> Option<&str> {
        self.current
            .and_then(|id| self.states.get(id.0))
            .map(|state| state.name())
    }

    pub fn initial_state(&self) -> Option<StateId> {
        self.initial
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id.0)
    }

    pub fn sensor(&self, id: SensorId) -> Option<&Sensor> {
        self.sensors.get(id.0)
    }

    pub fn sensor_mut(&mut self, id: SensorId) -> Option<&mut Sensor> {
        self.sensors.get_mut(id.0)
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn pending_transition(&self) -> Option<StateId> {
        self.current
            .and_then(|id| self.states.get(id.0))
            .and_then(|state| state.pending_transition())
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}
