//! Contact detector pairing a receiving entity with incoming damage emitters.
//!
//! A [`DamageSensor`] looks at the contacts addressed to its entity and, when
//! the other side carries an emitting [`DamageEmitter`], reports a
//! [`DamageContact::Begin`] or [`DamageContact::End`] to its subscribers
//! (entities carrying [`Life`](super::life::Life)).
//!
//! Like transition sensors it is armed/disarmed, optionally after an arm
//! delay. It is armed either by the FSM state listing it in its damage
//! sensors, or at startup when `active_from_start` is set.
//!
//! The sensor remembers whether a contact is in progress. A `Sustained`
//! contact only reports when none is recorded, which catches contacts that
//! began while the sensor was disarmed without re-hitting every frame. Only
//! beginnings need an emitting emitter: once a hit is recorded, its `Ended`
//! contact is reported even if the emitter was switched off or removed in
//! the meantime.

use bevy_ecs::prelude::*;

use crate::components::damageemitter::DamageEmitter;
use crate::components::subscribers::{SubscriptionError, Subscribers};
use crate::components::timer::Timer;
use crate::events::contact::{ContactEvent, ContactPhase};

/// Edge reported by a damage sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageContact {
    Begin,
    End,
}

#[derive(Component, Debug, Clone)]
pub struct DamageSensor {
    arm_delay: f32,
    arm_timer: Timer,
    active: bool,
    armed: bool,
    active_from_start: bool,
    in_contact: bool,
    last_emitter: Option<Entity>,
    subscribers: Subscribers<Entity>,
}

impl Default for DamageSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl DamageSensor {
    pub fn new() -> Self {
        Self {
            arm_delay: 0.0,
            arm_timer: Timer::new(0.0),
            active: false,
            armed: false,
            active_from_start: false,
            in_contact: false,
            last_emitter: None,
            subscribers: Subscribers::new(),
        }
    }

    pub fn with_arm_delay(mut self, seconds: f32) -> Self {
        self.arm_delay = seconds.max(0.0);
        self
    }

    /// Arm at startup without being listed by any FSM state.
    pub fn active_from_start(mut self, active: bool) -> Self {
        self.active_from_start = active;
        self
    }

    pub fn is_active_from_start(&self) -> bool {
        self.active_from_start
    }

    pub fn arm(&mut self) {
        self.active = true;
        self.in_contact = false;
        self.arm_timer = Timer::new(self.arm_delay);
        if self.arm_delay > 0.0 {
            self.arm_timer.start();
            self.armed = false;
        } else {
            self.armed = true;
        }
    }

    pub fn disarm(&mut self) {
        self.active = false;
    }

    /// Advance the arm delay.
    pub fn update(&mut self, dt: f32) {
        if self.active && !self.armed {
            self.arm_timer.update(dt);
            if self.arm_timer.time_remaining() <= 0.0 {
                self.armed = true;
            }
        }
    }

    pub fn is_armed(&self) -> bool {
        self.active && self.armed
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn in_contact(&self) -> bool {
        self.in_contact
    }

    /// The emitter entity of the last reported contact.
    pub fn last_emitter(&self) -> Option<Entity> {
        self.last_emitter
    }

    /// Classify one contact. `emitter` is the other side's emitter, if any.
    pub fn process(
        &mut self,
        contact: &ContactEvent,
        emitter: Option<&DamageEmitter>,
    ) -> Option<DamageContact> {
        if !self.is_armed() {
            return None;
        }
        let emitting = emitter.is_some_and(|e| e.is_emitting());
        let edge = match contact.phase {
            ContactPhase::Began | ContactPhase::Sustained if !emitting => return None,
            ContactPhase::Began => {
                self.in_contact = true;
                DamageContact::Begin
            }
            ContactPhase::Sustained if !self.in_contact => {
                self.in_contact = true;
                DamageContact::Begin
            }
            ContactPhase::Sustained => return None,
            // a recorded hit always gets its end, even from a silenced emitter
            ContactPhase::Ended if !self.in_contact && !emitting => return None,
            ContactPhase::Ended => {
                self.in_contact = false;
                DamageContact::End
            }
        };
        self.last_emitter = Some(contact.other);
        Some(edge)
    }

    pub fn subscribe(&mut self, life: Entity) {
        self.subscribers.subscribe(life);
    }

    pub fn unsubscribe(&mut self, life: Entity) -> Result<(), SubscriptionError> {
        self.subscribers.unsubscribe(life)
    }

    pub fn is_subscribed(&self, life: Entity) -> bool {
        self.subscribers.contains(life)
    }

    pub fn subscribers(&self) -> smallvec::SmallVec<[Entity; 4]> {
        self.subscribers.snapshot()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.count()
    }
}
