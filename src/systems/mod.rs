//! Simulation systems.
//!
//! Submodules overview
//! - [`damage`] – damage sensors, Life subscription and damage application
//! - [`fsm`] – FSM activation, actuators, sensors and transitions
//! - [`movement`] – integrate positions from rigid body velocities and time
//! - [`time`] – update simulation time and delta
//!
//! See [`crate::simulation::build_schedule`] for the order they run in.

pub mod damage;
pub mod fsm;
pub mod movement;
pub mod time;
