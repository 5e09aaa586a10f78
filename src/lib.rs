//! Aberred Behavior library.
//!
//! Reactive per-entity behavior for 2D games: a finite state machine whose
//! states run actuators and whose transitions are driven by sensors, plus a
//! damage protocol between emitters, damage sensors and lives. Everything
//! runs on bevy_ecs; see [`simulation::Simulation`] for a ready-made world
//! and schedule.

pub mod actuators;
pub mod components;
pub mod events;
pub mod resources;
pub mod simulation;
pub mod systems;
