//! Up/down motion along the Y axis, the vertical twin of
//! [`horizontal`](super::horizontal).

use bevy_ecs::prelude::Entity;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::actuators::easing::Acceleration;
use crate::actuators::{CollisionReaction, blocking_contacts};
use crate::components::actuator::{Actuator, ActuatorError};
use crate::components::behaviorcontext::BehaviorContext;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalDirection {
    #[default]
    Up,
    Down,
}

impl VerticalDirection {
    /// +Y is up.
    pub fn sign(self) -> f32 {
        match self {
            VerticalDirection::Up => 1.0,
            VerticalDirection::Down => -1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            VerticalDirection::Up => VerticalDirection::Down,
            VerticalDirection::Down => VerticalDirection::Up,
        }
    }
}

/// Vertical motion. Horizontal velocity is left untouched.
///
/// With `follow` set the direction points at the target's Y every frame.
/// Bounces only react to floor and ceiling contacts (normal mostly along Y).
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalActuator {
    pub speed: f32,
    pub direction: VerticalDirection,
    pub acceleration: Option<Acceleration>,
    pub throw: bool,
    pub follow: Option<Entity>,
    pub reaction: CollisionReaction,
    pub layer_mask: u32,
    current_direction: VerticalDirection,
    current_speed: f32,
    initial_speed: f32,
    time: f32,
}

impl VerticalActuator {
    pub fn new(speed: f32, direction: VerticalDirection) -> Self {
        Self {
            speed,
            direction,
            acceleration: None,
            throw: false,
            follow: None,
            reaction: CollisionReaction::None,
            layer_mask: u32::MAX,
            current_direction: direction,
            current_speed: speed,
            initial_speed: speed,
            time: 0.0,
        }
    }

    pub fn following(mut self, target: Entity) -> Self {
        self.follow = Some(target);
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

    pub fn current_direction(&self) -> VerticalDirection {
        self.current_direction
    }

    fn face_target(&mut self, ctx: &BehaviorContext) -> bool {
        let Some(target_pos) = self.follow.and_then(|t| ctx.view.position_of(t)) else {
            return false;
        };
        self.current_direction = if target_pos.y > ctx.motion.position.y {
            VerticalDirection::Up
        } else {
            VerticalDirection::Down
        };
        true
    }

    fn apply_force(&mut self, ctx: &mut BehaviorContext) {
        self.time += ctx.dt;
        if self.follow.is_some() && !self.face_target(ctx) {
            warn!("Vertical actuator on {:?}: follow target has no position", ctx.entity);
        }
        if let Some(ramp) = self.acceleration {
            self.current_speed = ramp.sample(self.initial_speed, self.time).0;
        }
        ctx.motion.velocity.y = self.current_speed * self.current_direction.sign();
    }

    fn react_to_collisions(&mut self, ctx: &mut BehaviorContext) {
        if self.reaction == CollisionReaction::None {
            return;
        }
        let floor_or_ceiling = blocking_contacts(ctx, self.layer_mask)
            .map(|c| c.normal)
            .find(|n| n.y.abs() > n.x.abs());
        let Some(normal) = floor_or_ceiling else {
            return;
        };
        match self.reaction {
            CollisionReaction::Bounce => {
                let facing_wall = (self.current_direction == VerticalDirection::Up && normal.y < 0.0)
                    || (self.current_direction == VerticalDirection::Down && normal.y > 0.0);
                if facing_wall {
                    self.current_direction = self.current_direction.flipped();
                }
            }
            CollisionReaction::Destroy => ctx.output.destroy_requested = true,
            CollisionReaction::None => {}
        }
    }
}

impl Actuator for VerticalActuator {
    fn kind(&self) -> &'static str {
        "vertical"
    }

    fn start(&mut self, ctx: &mut BehaviorContext) -> Result<(), ActuatorError> {
        self.time = 0.0;
        self.current_direction = self.direction;
        self.current_speed = self.speed;
        if self.acceleration.is_some() {
            self.current_speed = ctx.motion.velocity.y.abs();
        }
        self.initial_speed = self.current_speed;

        if self.follow.is_some() && !self.face_target(ctx) {
            warn!(
                "Vertical actuator on {:?}: follow target not found, keeping {:?}",
                ctx.entity, self.direction
            );
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
