//! ECS components for entities.
//!
//! This module groups the component types attached to simulated entities and
//! the plain data types the FSM is built from (states, sensors, actuators).
//!
//! Submodules overview:
//! - [`actuator`] – the [`Actuator`](actuator::Actuator) trait and the per-state slot wrapping it
//! - [`behaviorcontext`] – per-call context: motion, world snapshot and requested side effects
//! - [`damageemitter`] – damage contract carried by hazards and projectiles
//! - [`damagesensor`] – contact detector forwarding damage edges to lives
//! - [`destroyed`] – marker for entities whose destruction has been handled
//! - [`fsm`] – the behavior state machine component
//! - [`life`] – health pool applying instant, permanence and residual damage
//! - [`mapposition`] – world-space position for an entity
//! - [`rigidbody`] – simple kinematic body storing velocity
//! - [`sensor`] – armable condition detector with subscriber notification
//! - [`sensorkind`] – the concrete sensor conditions (collision, area, distance, elapsed)
//! - [`state`] – one FSM state: actuators, transitions, owned damage parts
//! - [`subscribers`] – ordered subscriber list shared by sensors
//! - [`timer`] – countdown used for arm delays and elapsed sensors

pub mod actuator;
pub mod behaviorcontext;
pub mod damageemitter;
pub mod damagesensor;
pub mod destroyed;
pub mod fsm;
pub mod life;
pub mod mapposition;
pub mod rigidbody;
pub mod sensor;
pub mod sensorkind;
pub mod state;
pub mod subscribers;
pub mod timer;
