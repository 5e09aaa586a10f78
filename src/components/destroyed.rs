//! Destroyed entity marker component.
//!
//! Inserted when an [`EntityDestroyedEvent`](crate::events::life::EntityDestroyedEvent)
//! is handled. FSM and damage systems skip marked entities, so a destroyed
//! entity stays paused until it is despawned.

use bevy_ecs::prelude::Component;

#[derive(Component, Clone, Copy, Debug)]
pub struct Destroyed;
