//! Event and message types exchanged with collaborators.
//!
//! Messages (`Messages<T>`) are buffered per frame and read by systems;
//! events are triggered and handled immediately by observers.
//!
//! Submodules:
//! - [`contact`] – collision and area contacts reported by the physics collaborator
//! - [`damage`] – damage notices from damage sensors to lives
//! - [`life`] – life changes, destruction, and the observer handling destruction
//! - [`spawn`] – spawn intents emitted by spawning actuators
//! - [`statechange`] – FSM state swaps
pub mod contact;
pub mod damage;
pub mod life;
pub mod spawn;
pub mod statechange;
