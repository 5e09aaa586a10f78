//! FSM state change event.
//!
//! [`StateChangeEvent`] is triggered after an entity's
//! [`Fsm`](crate::components::fsm::Fsm) swapped states, once the new state's
//! entry sequence has run. Animation collaborators observe it to switch clips.
//!
//! ```ignore
//! world.add_observer(|trigger: On<StateChangeEvent>| {
//!     let ev = trigger.event();
//!     log::info!("{:?}: {} -> {}", ev.entity, ev.from_name, ev.to_name);
//! });
//! ```

use bevy_ecs::prelude::*;

use crate::components::state::StateId;

#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct StateChangeEvent {
    pub entity: Entity,
    pub from: StateId,
    pub to: StateId,
    pub from_name: String,
    pub to_name: String,
}
