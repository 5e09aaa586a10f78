//! Health pool and damage application state machine.
//!
//! [`Life`] consumes damage contacts reported by a
//! [`DamageSensor`](super::damagesensor::DamageSensor) and applies them
//! according to the emitter's [`DamageKind`]:
//!
//! - **Instant**: subtract `amount`, or drop to zero with `insta_kill`.
//! - **Permanence**: subtract `amount`, then keep ticking. While in contact a
//!   new hit lands each time the accumulated cooldown exceeds the emitter's
//!   cooldown.
//! - **Residual**: subtract `amount`, then `residual_ticks` hits of
//!   `residual_amount`, one per completed cooldown. A contact end does not
//!   cancel a residual sequence.
//!
//! Life is clamped to `[0, max]` after every change. Reaching zero is
//! terminal and reported once.

use bevy_ecs::prelude::*;

use crate::components::damageemitter::{DamageEmitter, DamageKind};
use crate::components::damagesensor::DamageContact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DamageState {
    #[default]
    Idle,
    Ticking,
}

/// What changed during one Life call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LifeOutcome {
    /// `(previous, current)` when the value moved.
    pub changed: Option<(f32, f32)>,
    /// True exactly once, on the call that brought life to zero.
    pub died: bool,
}

impl LifeOutcome {
    /// Fold a later outcome into this one, keeping the earliest previous value.
    pub fn merge(&mut self, later: LifeOutcome) {
        self.changed = match (self.changed, later.changed) {
            (Some((previous, _)), Some((_, current))) => Some((previous, current)),
            (first, None) => first,
            (None, second) => second,
        };
        self.died |= later.died;
    }
}

#[derive(Component, Debug, Clone)]
pub struct Life {
    initial: f32,
    max: f32,
    current: f32,
    state: DamageState,
    cooldown_elapsed: f32,
    remaining_residual_ticks: u32,
    source: Option<DamageEmitter>,
    /// Entity carrying the damage sensor; `None` means the Life's own entity.
    pub sensor: Option<Entity>,
    dead: bool,
}

impl Default for Life {
    fn default() -> Self {
        Self::new(5.0, 5.0)
    }
}

impl Life {
    /// `max` is at least a tiny positive value; `initial` is clamped into range.
    pub fn new(initial: f32, max: f32) -> Self {
        let max = max.max(f32::EPSILON);
        let initial = initial.clamp(0.0, max);
        Self {
            initial,
            max,
            current: initial,
            state: DamageState::Idle,
            cooldown_elapsed: 0.0,
            remaining_residual_ticks: 0,
            source: None,
            sensor: None,
            dead: false,
        }
    }

    /// Listen to a damage sensor on another entity (a hurtbox child).
    pub fn with_sensor(mut self, sensor: Entity) -> Self {
        self.sensor = Some(sensor);
        self
    }

    /// React to a damage sensor notification.
    pub fn apply(&mut self, contact: DamageContact, emitter: &DamageEmitter) -> LifeOutcome {
        match contact {
            DamageContact::Begin => match emitter.kind {
                DamageKind::Instant => {
                    if emitter.insta_kill {
                        self.change_to(0.0)
                    } else {
                        self.decrease(emitter.amount)
                    }
                }
                DamageKind::Permanence => {
                    self.source = Some(*emitter);
                    self.state = DamageState::Ticking;
                    self.cooldown_elapsed = 0.0;
                    self.decrease(emitter.amount)
                }
                DamageKind::Residual => {
                    self.source = Some(*emitter);
                    self.state = DamageState::Ticking;
                    self.remaining_residual_ticks = emitter.residual_ticks;
                    self.cooldown_elapsed = 0.0;
                    let outcome = self.decrease(emitter.amount);
                    if self.remaining_residual_ticks == 0 {
                        self.finish_ticking();
                    }
                    outcome
                }
            },
            DamageContact::End => {
                if self.remaining_residual_ticks == 0 {
                    self.finish_ticking();
                }
                LifeOutcome::default()
            }
        }
    }

    /// Advance the Ticking sub-state.
    pub fn tick(&mut self, dt: f32) -> LifeOutcome {
        if self.state != DamageState::Ticking {
            return LifeOutcome::default();
        }
        let Some(source) = self.source else {
            self.finish_ticking();
            return LifeOutcome::default();
        };
        self.cooldown_elapsed += dt.max(0.0);
        match source.kind {
            DamageKind::Permanence => {
                if self.cooldown_elapsed > source.cooldown {
                    self.cooldown_elapsed = 0.0;
                    return self.decrease(source.amount);
                }
                LifeOutcome::default()
            }
            DamageKind::Residual => {
                if self.cooldown_elapsed >= source.cooldown {
                    self.cooldown_elapsed = 0.0;
                    self.remaining_residual_ticks = self.remaining_residual_ticks.saturating_sub(1);
                    let outcome = self.decrease(source.residual_amount);
                    if self.remaining_residual_ticks == 0 {
                        self.finish_ticking();
                    }
                    return outcome;
                }
                LifeOutcome::default()
            }
            DamageKind::Instant => {
                self.finish_ticking();
                LifeOutcome::default()
            }
        }
    }

    fn finish_ticking(&mut self) {
        self.state = DamageState::Idle;
        self.cooldown_elapsed = 0.0;
        self.remaining_residual_ticks = 0;
        self.source = None;
    }

    fn decrease(&mut self, amount: f32) -> LifeOutcome {
        self.change_to(self.current - amount.max(0.0))
    }

    fn change_to(&mut self, value: f32) -> LifeOutcome {
        let previous = self.current;
        self.current = value.clamp(0.0, self.max);
        let mut outcome = LifeOutcome::default();
        if self.current != previous {
            outcome.changed = Some((previous, self.current));
        }
        if self.current <= 0.0 && !self.dead {
            self.dead = true;
            outcome.died = true;
        }
        outcome
    }

    /// Heal, capped at `max`.
    pub fn increase(&mut self, amount: f32) -> LifeOutcome {
        self.change_to(self.current + amount.max(0.0))
    }

    pub fn set(&mut self, value: f32) -> LifeOutcome {
        self.change_to(value)
    }

    /// Back to the initial value. Death stays terminal.
    pub fn reset(&mut self) -> LifeOutcome {
        self.finish_ticking();
        self.change_to(self.initial)
    }

    pub fn is_below(&self, value: f32) -> bool {
        self.current < value
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn initial(&self) -> f32 {
        self.initial
    }

    pub fn set_initial(&mut self, value: f32) {
        self.initial = value.clamp(0.0, self.max);
    }

    pub fn damage_state(&self) -> DamageState {
        self.state
    }

    pub fn remaining_residual_ticks(&self) -> u32 {
        self.remaining_residual_ticks
    }

    pub fn cooldown_elapsed(&self) -> f32 {
        self.cooldown_elapsed
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn residual_sequence() {
        let mut life = Life::new(100.0, 100.0);
        let emitter = DamageEmitter::residual(10.0, 5.0, 3, 1.0);

        life.apply(DamageContact::Begin, &emitter);
        assert!(approx_eq(life.current(), 90.0));
        assert_eq!(life.damage_state(), DamageState::Ticking);

        life.tick(0.5);
        assert!(approx_eq(life.current(), 90.0));
        life.tick(0.5);
        assert!(approx_eq(life.current(), 85.0));
        assert_eq!(life.remaining_residual_ticks(), 2);

        for _ in 0..4 {
            life.tick(0.5);
        }
        assert!(approx_eq(life.current(), 75.0));
        assert_eq!(life.remaining_residual_ticks(), 0);
        assert_eq!(life.damage_state(), DamageState::Idle);

        life.tick(5.0);
        assert!(approx_eq(life.current(), 75.0));
    }

    #[test]
    fn contact_end_does_not_cancel_residual() {
        let mut life = Life::new(100.0, 100.0);
        let emitter = DamageEmitter::residual(10.0, 5.0, 2, 1.0);
        life.apply(DamageContact::Begin, &emitter);
        life.apply(DamageContact::End, &emitter);
        assert_eq!(life.damage_state(), DamageState::Ticking);
        life.tick(1.0);
        life.tick(1.0);
        assert!(approx_eq(life.current(), 80.0));
        assert_eq!(life.damage_state(), DamageState::Idle);
    }

    #[test]
    fn permanence_hits_while_in_contact() {
        let mut life = Life::new(100.0, 100.0);
        let emitter = DamageEmitter::permanence(10.0, 1.0);
        life.apply(DamageContact::Begin, &emitter);
        assert!(approx_eq(life.current(), 90.0));

        // strictly greater than the cooldown
        life.tick(1.0);
        assert!(approx_eq(life.current(), 90.0));
        life.tick(0.1);
        assert!(approx_eq(life.current(), 80.0));
        assert!(approx_eq(life.cooldown_elapsed(), 0.0));

        life.apply(DamageContact::End, &emitter);
        assert_eq!(life.damage_state(), DamageState::Idle);
        life.tick(5.0);
        assert!(approx_eq(life.current(), 80.0));
    }

    #[test]
    fn insta_kill_signals_death_once() {
        let mut life = Life::new(42.0, 100.0);
        let emitter = DamageEmitter::insta_kill();

        let first = life.apply(DamageContact::Begin, &emitter);
        assert_eq!(life.current(), 0.0);
        assert!(first.died);
        assert_eq!(first.changed, Some((42.0, 0.0)));

        let second = life.apply(DamageContact::Begin, &emitter);
        assert!(!second.died);
        assert_eq!(second.changed, None);
        assert!(!life.apply(DamageContact::Begin, &DamageEmitter::instant(3.0)).died);
        assert!(life.is_dead());
    }

    #[test]
    fn life_is_clamped() {
        let mut life = Life::new(5.0, 10.0);
        life.increase(100.0);
        assert_eq!(life.current(), 10.0);
        life.apply(DamageContact::Begin, &DamageEmitter::instant(25.0));
        assert_eq!(life.current(), 0.0);
        life.set(-3.0);
        assert_eq!(life.current(), 0.0);
    }

    #[test]
    fn reset_and_is_below() {
        let mut life = Life::new(5.0, 10.0);
        life.apply(DamageContact::Begin, &DamageEmitter::instant(2.0));
        assert!(life.is_below(4.0));
        life.reset();
        assert_eq!(life.current(), 5.0);
        assert!(!life.is_below(5.0));
    }

    #[test]
    fn outcomes_merge_to_span_the_frame() {
        let mut total = LifeOutcome::default();
        total.merge(LifeOutcome {
            changed: Some((10.0, 8.0)),
            died: false,
        });
        total.merge(LifeOutcome::default());
        total.merge(LifeOutcome {
            changed: Some((8.0, 0.0)),
            died: true,
        });
        assert_eq!(total.changed, Some((10.0, 0.0)));
        assert!(total.died);
    }
}
