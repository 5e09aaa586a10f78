//! Damage protocol systems.
//!
//! - [`damage_startup_system`] – switch on emitters and arm sensors flagged
//!   `active_from_start` when they are first seen
//! - [`life_attach_system`] – subscribe [`Life`] components to their damage sensor
//!   and drop removed ones
//! - [`damage_sensor_system`] – turn this frame's contacts into [`DamageNotice`]s
//! - [`life_system`] – advance ticking damage and apply notices
//!
//! Sensor and Life systems run after the FSM systems, so an emitter switched
//! on by a state entered this frame already hurts.

use bevy_ecs::prelude::*;
use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::components::damageemitter::DamageEmitter;
use crate::components::damagesensor::{DamageContact, DamageSensor};
use crate::components::destroyed::Destroyed;
use crate::components::life::{Life, LifeOutcome};
use crate::events::contact::ContactEvent;
use crate::events::damage::DamageNotice;
use crate::events::life::{DestroyCause, EntityDestroyedEvent, LifeChangedEvent};
use crate::resources::worldtime::WorldTime;

pub fn damage_startup_system(
    mut emitters: Query<&mut DamageEmitter, Added<DamageEmitter>>,
    mut sensors: Query<&mut DamageSensor, Added<DamageSensor>>,
) {
    for mut emitter in emitters.iter_mut() {
        if emitter.active_from_start {
            emitter.set_emitting(true);
        }
    }
    for mut sensor in sensors.iter_mut() {
        if sensor.is_active_from_start() {
            sensor.arm();
        }
    }
}

/// Keep damage sensor subscriptions in step with the lives listening to them.
///
/// A Life is subscribed when it appears, or when its damage sensor appears
/// after it. Lives removed or despawned since the previous run are
/// unsubscribed from every sensor still holding them.
pub fn life_attach_system(
    lives: Query<(Entity, Ref<Life>)>,
    mut sensors: Query<(Entity, &mut DamageSensor)>,
    mut removed_lives: RemovedComponents<Life>,
) {
    for gone in removed_lives.read() {
        if lives.contains(gone) {
            continue;
        }
        for (sensor_entity, mut sensor) in sensors.iter_mut() {
            while sensor.is_subscribed(gone) {
                if let Err(e) = sensor.unsubscribe(gone) {
                    warn!("Damage sensor {:?}: {}", sensor_entity, e);
                    break;
                }
            }
        }
    }

    for (entity, life) in lives.iter() {
        let sensor_entity = life.sensor.unwrap_or(entity);
        match sensors.get_mut(sensor_entity) {
            Ok((_, mut sensor)) => {
                if (life.is_added() || sensor.is_added()) && !sensor.is_subscribed(entity) {
                    sensor.subscribe(entity);
                }
            }
            Err(_) if life.is_added() => warn!(
                "Life on {:?}: no damage sensor on {:?} yet, it takes no damage until one is added",
                entity, sensor_entity
            ),
            Err(_) => {}
        }
    }
}

/// Advance arm delays, classify contacts and notify subscribed lives.
///
/// A `destroy_after_hit` emitter is destroyed on the frame its hit begins.
pub fn damage_sensor_system(
    mut sensors: Query<(Entity, &mut DamageSensor), Without<Destroyed>>,
    emitters: Query<&DamageEmitter>,
    mut contacts: MessageReader<ContactEvent>,
    mut notices: MessageWriter<DamageNotice>,
    time: Res<WorldTime>,
    mut commands: Commands,
) {
    for (_, mut sensor) in sensors.iter_mut() {
        sensor.update(time.delta);
    }

    for contact in contacts.read() {
        let Ok((sensor_entity, mut sensor)) = sensors.get_mut(contact.entity) else {
            continue;
        };
        let emitter = emitters.get(contact.other).ok();
        let Some(edge) = sensor.process(contact, emitter) else {
            continue;
        };
        // an End may outlive its emitter; its contract is not used then
        let emitter = emitter.copied().unwrap_or_default();
        debug!(
            "Damage sensor {:?}: {:?} from {:?}",
            sensor_entity, edge, contact.other
        );

        for receiver in sensor.subscribers() {
            notices.write(DamageNotice {
                receiver,
                sensor: sensor_entity,
                emitter_entity: contact.other,
                emitter,
                contact: edge,
            });
        }

        if edge == DamageContact::Begin && emitter.destroy_after_hit {
            commands.trigger(EntityDestroyedEvent {
                entity: contact.other,
                cause: DestroyCause::EmitterSpent,
            });
        }
    }
}

/// Advance every ticking Life, then apply this frame's notices.
///
/// One [`LifeChangedEvent`] per entity and frame spans all changes; reaching
/// zero triggers [`EntityDestroyedEvent`] once.
pub fn life_system(
    mut lives: Query<(Entity, &mut Life), Without<Destroyed>>,
    mut notices: MessageReader<DamageNotice>,
    time: Res<WorldTime>,
    mut commands: Commands,
) {
    let mut outcomes: FxHashMap<Entity, LifeOutcome> = FxHashMap::default();

    for (entity, mut life) in lives.iter_mut() {
        let outcome = life.tick(time.delta);
        if outcome != LifeOutcome::default() {
            outcomes.entry(entity).or_default().merge(outcome);
        }
    }

    for notice in notices.read() {
        let Ok((entity, mut life)) = lives.get_mut(notice.receiver) else {
            continue;
        };
        let outcome = life.apply(notice.contact, &notice.emitter);
        outcomes.entry(entity).or_default().merge(outcome);
    }

    let mut changed: Vec<(Entity, LifeOutcome)> = outcomes.into_iter().collect();
    changed.sort_by_key(|(entity, _)| *entity);

    for (entity, outcome) in changed {
        if let Some((previous, current)) = outcome.changed {
            let max = lives.get(entity).map(|(_, life)| life.max()).unwrap_or(current);
            commands.trigger(LifeChangedEvent {
                entity,
                previous,
                current,
                max,
            });
        }
        if outcome.died {
            commands.trigger(EntityDestroyedEvent {
                entity,
                cause: DestroyCause::Killed,
            });
        }
    }
}
