use bevy_ecs::prelude::*;

use crate::components::destroyed::Destroyed;
use crate::components::mapposition::MapPosition;
use crate::components::rigidbody::RigidBody;
use crate::resources::worldtime::WorldTime;

/// Integrate positions from rigid body velocities. Frozen bodies stay put.
pub fn movement_system(
    mut query: Query<(&mut MapPosition, &RigidBody), Without<Destroyed>>,
    time: Res<WorldTime>,
) {
    for (mut position, rigidbody) in query.iter_mut() {
        if rigidbody.is_frozen() {
            continue;
        }
        let delta = rigidbody.clamped_velocity() * time.delta;
        if delta != glam::Vec2::ZERO {
            position.pos += delta;
        }
    }
}
