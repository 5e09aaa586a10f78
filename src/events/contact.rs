//! Contact signals produced by the physics collaborator.
//!
//! The behavior core does no overlap testing of its own. Whatever resolves
//! collisions writes one [`ContactEvent`] per participant and frame into
//! `Messages<ContactEvent>`; sensors, damage sensors and actuators read them
//! during the same tick.
//!
//! # Example
//!
//! ```ignore
//! world
//!     .resource_mut::<Messages<ContactEvent>>()
//!     .write(ContactEvent::collision(enemy, wall, 3, ContactPhase::Began));
//! ```

use bevy_ecs::prelude::*;
use glam::Vec2;

/// Which physical shape reported the contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactShape {
    /// Solid collision (collisionBegan / Sustained / Ended).
    Collision,
    /// Trigger zone overlap (areaEntered / Sustained / Exited).
    Area,
}

/// Lifecycle of a contact between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    Began,
    Sustained,
    Ended,
}

/// One side of a resolved contact, addressed to `entity`.
///
/// `other_layer` is the collision layer index of `other` (0..32) and `normal`
/// points from `other` towards `entity` when the collaborator knows it.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub entity: Entity,
    pub other: Entity,
    pub other_layer: u32,
    pub shape: ContactShape,
    pub phase: ContactPhase,
    pub normal: Vec2,
}

impl ContactEvent {
    pub fn collision(entity: Entity, other: Entity, other_layer: u32, phase: ContactPhase) -> Self {
        Self {
            entity,
            other,
            other_layer,
            shape: ContactShape::Collision,
            phase,
            normal: Vec2::ZERO,
        }
    }

    pub fn area(entity: Entity, other: Entity, phase: ContactPhase) -> Self {
        Self {
            entity,
            other,
            other_layer: 0,
            shape: ContactShape::Area,
            phase,
            normal: Vec2::ZERO,
        }
    }

    pub fn with_normal(mut self, normal: Vec2) -> Self {
        self.normal = normal;
        self
    }

    /// Collision contact that is starting or still ongoing.
    pub fn is_touching(&self) -> bool {
        matches!(self.phase, ContactPhase::Began | ContactPhase::Sustained)
    }
}
