//! Damage notices sent from damage sensors to the lives listening to them.

use bevy_ecs::prelude::*;

use crate::components::damageemitter::DamageEmitter;
use crate::components::damagesensor::DamageContact;

/// One contact edge reported by a damage sensor to one subscribed Life.
///
/// `emitter` is a copy of the other side's contract taken when the contact
/// was detected, so the emitter entity may already be gone when it is
/// applied.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct DamageNotice {
    /// Entity carrying the Life.
    pub receiver: Entity,
    /// Entity carrying the damage sensor.
    pub sensor: Entity,
    pub emitter_entity: Entity,
    pub emitter: DamageEmitter,
    pub contact: DamageContact,
}
