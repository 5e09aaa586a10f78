//! Left/right patrol along the X axis.

use bevy_ecs::prelude::Entity;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::actuators::easing::Acceleration;
use crate::actuators::{CollisionReaction, blocking_contacts};
use crate::components::actuator::{Actuator, ActuatorError};
use crate::components::behaviorcontext::BehaviorContext;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Left,
    Right,
}

impl Direction {
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Horizontal patrol. Vertical velocity is left untouched.
///
/// When `follow` is set, the direction tracks the target's X position and
/// only flips once the entity is more than `follow_tolerance` away from it.
/// Bounces only react to side contacts (normal mostly along X).
#[derive(Debug, Clone, PartialEq)]
pub struct HorizontalActuator {
    pub speed: f32,
    pub direction: Direction,
    pub acceleration: Option<Acceleration>,
    pub throw: bool,
    pub follow: Option<Entity>,
    pub follow_tolerance: f32,
    pub reaction: CollisionReaction,
    pub layer_mask: u32,
    current_direction: Direction,
    current_speed: f32,
    initial_speed: f32,
    time: f32,
}

impl HorizontalActuator {
    pub fn new(speed: f32, direction: Direction) -> Self {
        Self {
            speed,
            direction,
            acceleration: None,
            throw: false,
            follow: None,
            follow_tolerance: 0.0,
            reaction: CollisionReaction::None,
            layer_mask: u32::MAX,
            current_direction: direction,
            current_speed: speed,
            initial_speed: speed,
            time: 0.0,
        }
    }

    pub fn following(mut self, target: Entity, tolerance: f32) -> Self {
        self.follow = Some(target);
        self.follow_tolerance = tolerance.max(0.0);
        self
    }

    pub fn accelerated(mut self, acceleration: Acceleration) -> Self {
        self.acceleration = Some(acceleration);
        self
    }

    pub fn thrown(mut self) -> Self {
        self.throw = true;
        self
    }

    pub fn on_collision(mut self, reaction: CollisionReaction, layer_mask: u32) -> Self {
        self.reaction = reaction;
        self.layer_mask = layer_mask;
        self
    }

    pub fn current_direction(&self) -> Direction {
        self.current_direction
    }

    fn track_target(&mut self, ctx: &BehaviorContext) {
        let Some(target) = self.follow else {
            return;
        };
        let Some(target_pos) = ctx.view.position_of(target) else {
            warn!("Horizontal actuator on {:?}: follow target has no position", ctx.entity);
            return;
        };
        let x = ctx.motion.position.x;
        if x > target_pos.x + self.follow_tolerance {
            self.current_direction = Direction::Left;
        } else if x < target_pos.x - self.follow_tolerance {
            self.current_direction = Direction::Right;
        }
    }

    fn apply_force(&mut self, ctx: &mut BehaviorContext) {
        self.time += ctx.dt;
        self.track_target(ctx);
        if let Some(ramp) = self.acceleration {
            self.current_speed = ramp.sample(self.initial_speed, self.time).0;
        }
        ctx.motion.velocity.x = self.current_speed * self.current_direction.sign();
    }

    fn react_to_collisions(&mut self, ctx: &mut BehaviorContext) {
        if self.reaction == CollisionReaction::None {
            return;
        }
        let side_hit = blocking_contacts(ctx, self.layer_mask)
            .map(|c| c.normal)
            .find(|n| n.x.abs() > n.y.abs());
        let Some(normal) = side_hit else {
            return;
        };
        match self.reaction {
            CollisionReaction::Bounce => {
                let facing_wall = (self.current_direction == Direction::Left && normal.x > 0.0)
                    || (self.current_direction == Direction::Right && normal.x < 0.0);
                if facing_wall {
                    self.current_direction = self.current_direction.flipped();
                }
            }
            CollisionReaction::Destroy => ctx.output.destroy_requested = true,
            CollisionReaction::None => {}
        }
    }
}

impl Actuator for HorizontalActuator {
    fn kind(&self) -> &'static str {
        "horizontal"
    }

    fn start(&mut self, ctx: &mut BehaviorContext) -> Result<(), ActuatorError> {
        self.time = 0.0;
        self.current_direction = self.direction;
        self.current_speed = self.speed;
        if self.acceleration.is_some() {
            self.current_speed = ctx.motion.velocity.x.abs();
        }
        self.initial_speed = self.current_speed;

        if let Some(target) = self.follow {
            match ctx.view.position_of(target) {
                Some(target_pos) => {
                    self.current_direction = if target_pos.x > ctx.motion.position.x {
                        Direction::Right
                    } else {
                        Direction::Left
                    };
                }
                None => warn!(
                    "Horizontal actuator on {:?}: follow target not found, patrolling instead",
                    ctx.entity
                ),
            }
        }

        if self.throw {
            self.apply_force(ctx);
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut BehaviorContext) {
        if !self.throw {
            self.apply_force(ctx);
        }
        self.react_to_collisions(ctx);
    }
}
