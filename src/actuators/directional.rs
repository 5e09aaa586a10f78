//! Straight-line motion along an angle.

use bevy_ecs::prelude::Entity;
use glam::Vec2;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::actuators::easing::Acceleration;
use crate::actuators::{CollisionReaction, blocking_contacts};
use crate::components::actuator::{Actuator, ActuatorError};
use crate::components::behaviorcontext::BehaviorContext;

/// Moves the entity along `angle` (degrees, counter-clockwise from +X).
///
/// With an [`Acceleration`] the speed ramps from whatever the entity is moving
/// at on state entry to the goal speed. A `throw` applies the velocity on the
/// first update only and then lets the body coast.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DirectionalActuator {
    pub speed: f32,
    pub angle: f32,
    pub acceleration: Option<Acceleration>,
    pub throw: bool,
    /// Point at this entity when the state is entered.
    #[serde(skip)]
    pub aim_at: Option<Entity>,
    pub reaction: CollisionReaction,
    pub layer_mask: u32,
    #[serde(skip)]
    runtime: DirectionalRuntime,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct DirectionalRuntime {
    speed: f32,
    initial_speed: f32,
    angle: f32,
    time: f32,
    thrown: bool,
}

impl Default for DirectionalActuator {
    fn default() -> Self {
        Self::new(5.0, 0.0)
    }
}

impl DirectionalActuator {
    pub fn new(speed: f32, angle: f32) -> Self {
        Self {
            speed,
            angle,
            acceleration: None,
            throw: false,
            aim_at: None,
            reaction: CollisionReaction::None,
            layer_mask: u32::MAX,
            runtime: DirectionalRuntime::default(),
        }
    }

    pub fn accelerated(mut self, acceleration: Acceleration) -> Self {
        self.acceleration = Some(acceleration);
        self
    }

    pub fn thrown(mut self) -> Self {
        self.throw = true;
        self
    }

    pub fn aiming_at(mut self, target: Entity) -> Self {
        self.aim_at = Some(target);
        self
    }

    pub fn on_collision(mut self, reaction: CollisionReaction, layer_mask: u32) -> Self {
        self.reaction = reaction;
        self.layer_mask = layer_mask;
        self
    }

    /// Heading currently in use, in degrees.
    pub fn current_angle(&self) -> f32 {
        self.runtime.angle
    }

    pub fn current_speed(&self) -> f32 {
        self.runtime.speed
    }

    fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.runtime.angle.to_radians())
    }

    fn apply_force(&mut self, ctx: &mut BehaviorContext) {
        self.runtime.time += ctx.dt;
        if let Some(ramp) = self.acceleration {
            let (speed, _) = ramp.sample(self.runtime.initial_speed, self.runtime.time);
            self.runtime.speed = speed;
        }
        ctx.motion.velocity = self.direction() * self.runtime.speed;
    }

    fn react_to_collisions(&mut self, ctx: &mut BehaviorContext, previous: Vec2) {
        if self.reaction == CollisionReaction::None {
            return;
        }
        let Some(contact) = blocking_contacts(ctx, self.layer_mask).next() else {
            return;
        };
        match self.reaction {
            CollisionReaction::Bounce => {
                let normal = contact.normal;
                let along = previous.dot(normal);
                if along >= 0.0 {
                    return;
                }
                let reflected = previous - 2.0 * along * normal;
                ctx.motion.velocity = reflected;
                self.runtime.speed = reflected.length();
                self.runtime.angle = reflected.y.atan2(reflected.x).to_degrees();
            }
            CollisionReaction::Destroy => ctx.output.destroy_requested = true,
            CollisionReaction::None => {}
        }
    }
}

impl Actuator for DirectionalActuator {
    fn kind(&self) -> &'static str {
        "directional"
    }

    fn start(&mut self, ctx: &mut BehaviorContext) -> Result<(), ActuatorError> {
        self.runtime = DirectionalRuntime {
            speed: self.speed,
            initial_speed: self.speed,
            angle: self.angle,
            time: 0.0,
            thrown: false,
        };

        if let Some(target) = self.aim_at {
            match ctx.view.position_of(target) {
                Some(target_pos) => {
                    let d = target_pos - ctx.motion.position;
                    self.runtime.angle = d.y.atan2(d.x).to_degrees();
                }
                None => warn!(
                    "Directional actuator on {:?}: aim target {:?} has no position; keeping angle {}",
                    ctx.entity, target, self.angle
                ),
            }
        }

        if self.acceleration.is_some() {
            self.runtime.initial_speed = ctx.motion.velocity.length();
            self.runtime.speed = self.runtime.initial_speed;
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut BehaviorContext) {
        let previous = ctx.motion.velocity;
        if !self.throw || !self.runtime.thrown {
            self.apply_force(ctx);
            self.runtime.thrown = true;
        }
        self.react_to_collisions(ctx, previous);
    }
}
