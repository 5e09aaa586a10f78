//! Spawn intents emitted by spawning actuators.
//!
//! The core does not know how to build entities from a template; whoever owns
//! the prefabs reads `Messages<SpawnRequest>` after each tick and spawns them.

use bevy_ecs::prelude::*;
use glam::Vec2;

/// Request to instantiate `template` at `position` on behalf of `spawner`.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub spawner: Entity,
    pub template: String,
    pub position: Vec2,
}
