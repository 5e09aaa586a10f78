//! Eased travel from the entry position to another entity.

use bevy_ecs::prelude::Entity;
use glam::Vec2;
use log::warn;

use crate::actuators::easing::{Easing, ease};
use crate::components::actuator::{Actuator, ActuatorError};
use crate::components::behaviorcontext::BehaviorContext;

/// Eased progress past this counts as arrived.
const ALMOST_REACHED: f32 = 0.995;

/// Interpolates from where the entity stood on state entry to the target's
/// current position over `time_to_reach` seconds, then stops.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveToTargetActuator {
    pub target: Option<Entity>,
    pub time_to_reach: f32,
    pub easing: Option<Easing>,
    origin: Vec2,
    elapsed: f32,
    moving: bool,
}

impl MoveToTargetActuator {
    pub fn new(target: Entity, time_to_reach: f32) -> Self {
        Self {
            target: Some(target),
            time_to_reach: time_to_reach.max(0.0),
            easing: None,
            origin: Vec2::ZERO,
            elapsed: 0.0,
            moving: false,
        }
    }

    pub fn eased(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }
}

impl Actuator for MoveToTargetActuator {
    fn kind(&self) -> &'static str {
        "move_to_target"
    }

    fn start(&mut self, ctx: &mut BehaviorContext) -> Result<(), ActuatorError> {
        if self.target.is_none() {
            return Err(ActuatorError::MissingReference {
                actuator: "move_to_target",
                reference: "target",
            });
        }
        self.origin = ctx.motion.position;
        self.elapsed = 0.0;
        self.moving = true;
        Ok(())
    }

    fn update(&mut self, ctx: &mut BehaviorContext) {
        if !self.moving {
            return;
        }
        let Some(goal) = self.target.and_then(|t| ctx.view.position_of(t)) else {
            warn!("Move-to-target actuator on {:?}: target has no position", ctx.entity);
            return;
        };

        self.elapsed += ctx.dt;
        let mut t = if self.time_to_reach <= 0.0 {
            1.0
        } else {
            self.elapsed / self.time_to_reach
        };
        if let Some(easing) = self.easing {
            t = ease(easing, t);
            if t >= ALMOST_REACHED {
                t = 1.0;
            }
        }
        let t = t.min(1.0);

        ctx.motion.position = self.origin.lerp(goal, t);
        ctx.motion.velocity = Vec2::ZERO;
        if t >= 1.0 {
            self.moving = false;
        }
    }
}
