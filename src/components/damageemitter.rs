//! Damage delivery contract carried by damage-dealing entities.
//!
//! A [`DamageEmitter`] is passive data: kind, amounts, cooldown and residual
//! settings. The only runtime flag is `emitting`, switched on and off by the
//! owning FSM state on entry/exit, or forced on at startup when
//! `active_from_start` is set. Contracts can be authored in JSON:
//!
//! ```json
//! { "kind": "Residual", "amount": 10.0, "residual_amount": 5.0, "residual_ticks": 3 }
//! ```
//!
//! Missing fields take the [`Default`] values (cooldown of one second,
//! everything else zero/false).

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// How an emitter's damage is applied by [`Life`](super::life::Life).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DamageKind {
    /// Once per contact.
    #[default]
    Instant,
    /// Once on contact, then again every cooldown while contact lasts.
    Permanence,
    /// Once on contact, then `residual_ticks` extra hits of `residual_amount`.
    Residual,
}

#[derive(Component, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct DamageEmitter {
    pub kind: DamageKind,
    pub amount: f32,
    pub insta_kill: bool,
    /// Seconds between Permanence hits and between Residual ticks.
    pub cooldown: f32,
    pub residual_amount: f32,
    pub residual_ticks: u32,
    /// The emitter is destroyed after delivering a hit.
    pub destroy_after_hit: bool,
    #[serde(skip)]
    pub emitting: bool,
    pub active_from_start: bool,
}

impl Default for DamageEmitter {
    fn default() -> Self {
        Self {
            kind: DamageKind::Instant,
            amount: 0.0,
            insta_kill: false,
            cooldown: 1.0,
            residual_amount: 0.0,
            residual_ticks: 0,
            destroy_after_hit: false,
            emitting: false,
            active_from_start: false,
        }
    }
}

impl DamageEmitter {
    pub fn instant(amount: f32) -> Self {
        Self {
            amount: amount.max(0.0),
            ..Self::default()
        }
    }

    /// Instant emitter that drops life straight to zero.
    pub fn insta_kill() -> Self {
        Self {
            insta_kill: true,
            ..Self::default()
        }
    }

    pub fn permanence(amount: f32, cooldown: f32) -> Self {
        Self {
            kind: DamageKind::Permanence,
            amount: amount.max(0.0),
            cooldown: cooldown.max(0.0),
            ..Self::default()
        }
    }

    pub fn residual(amount: f32, residual_amount: f32, residual_ticks: u32, cooldown: f32) -> Self {
        Self {
            kind: DamageKind::Residual,
            amount: amount.max(0.0),
            residual_amount: residual_amount.max(0.0),
            residual_ticks,
            cooldown: cooldown.max(0.0),
            ..Self::default()
        }
    }

    pub fn destroy_after_hit(mut self, destroy: bool) -> Self {
        self.destroy_after_hit = destroy;
        self
    }

    pub fn active_from_start(mut self, active: bool) -> Self {
        self.active_from_start = active;
        self
    }

    pub fn set_emitting(&mut self, emitting: bool) {
        self.emitting = emitting;
    }

    pub fn is_emitting(&self) -> bool {
        self.emitting
    }

    /// Parse a contract from JSON. Negative quantities are clamped to zero.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let emitter: DamageEmitter = serde_json::from_str(json)?;
        Ok(emitter.sanitized())
    }

    /// Load a contract from a JSON file.
    pub fn load_from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    fn sanitized(mut self) -> Self {
        self.amount = self.amount.max(0.0);
        self.cooldown = self.cooldown.max(0.0);
        self.residual_amount = self.residual_amount.max(0.0);
        self
    }
}
