//! Rotation around a pivot entity, as a full circle or a pendulum swing.
//!
//! The radius and starting angle come from the entity's position relative to
//! the pivot when the state is entered. With `max_angle < 360` the entity
//! swings between `start - max/2` and `start + max/2`.

use std::f32::consts::TAU;

use bevy_ecs::prelude::Entity;
use glam::Vec2;

use crate::actuators::easing::Acceleration;
use crate::components::actuator::{Actuator, ActuatorError};
use crate::components::behaviorcontext::BehaviorContext;

#[derive(Debug, Clone, PartialEq)]
pub struct CircularActuator {
    pub pivot: Option<Entity>,
    /// Degrees per second.
    pub angular_speed: f32,
    /// Swing amplitude in degrees; 360 means a full circle.
    pub max_angle: f32,
    /// Ramp of the angular speed (degrees per second).
    pub acceleration: Option<Acceleration>,
    radius: f32,
    start_angle: f32,
    angle: f32,
    speed: f32,
    initial_speed: f32,
    reversing: bool,
    time: f32,
}

impl CircularActuator {
    pub fn new(pivot: Entity, angular_speed: f32) -> Self {
        Self {
            pivot: Some(pivot),
            angular_speed,
            max_angle: 360.0,
            acceleration: None,
            radius: 0.0,
            start_angle: 0.0,
            angle: 0.0,
            speed: 0.0,
            initial_speed: 0.0,
            reversing: false,
            time: 0.0,
        }
    }

    pub fn pendulum(mut self, max_angle: f32) -> Self {
        self.max_angle = max_angle.clamp(0.0, 360.0);
        self
    }

    pub fn accelerated(mut self, acceleration: Acceleration) -> Self {
        self.acceleration = Some(acceleration);
        self
    }

    /// Current angle around the pivot, in radians.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    fn is_pendulum(&self) -> bool {
        self.max_angle < 360.0
    }
}

impl Actuator for CircularActuator {
    fn kind(&self) -> &'static str {
        "circular"
    }

    fn start(&mut self, ctx: &mut BehaviorContext) -> Result<(), ActuatorError> {
        let missing = ActuatorError::MissingReference {
            actuator: "circular",
            reference: "pivot",
        };
        let pivot = self.pivot.ok_or(missing.clone())?;
        let pivot_pos = ctx.view.position_of(pivot).ok_or(missing)?;

        let offset = ctx.motion.position - pivot_pos;
        self.radius = offset.length();
        self.start_angle = offset.y.atan2(offset.x);
        self.angle = self.start_angle;
        self.speed = self.angular_speed.to_radians();
        self.initial_speed = self.speed;
        self.reversing = false;
        self.time = 0.0;
        Ok(())
    }

    fn update(&mut self, ctx: &mut BehaviorContext) {
        let Some(pivot_pos) = self.pivot.and_then(|p| ctx.view.position_of(p)) else {
            return;
        };
        let dt = ctx.dt;
        self.time += dt;

        if let Some(ramp) = self.acceleration {
            let goal = Acceleration {
                goal: ramp.goal.to_radians(),
                ..ramp
            };
            self.speed = goal.sample(self.initial_speed, self.time).0;
        }

        if self.is_pendulum() {
            let half = self.max_angle.to_radians() / 2.0;
            let upper = self.start_angle + half;
            let lower = self.start_angle - half;
            if !self.reversing {
                self.angle += self.speed * dt;
                if self.angle > upper {
                    self.angle = upper;
                    self.reversing = true;
                }
            } else {
                self.angle -= self.speed * dt;
                if self.angle < lower {
                    self.angle = lower;
                    self.reversing = false;
                }
            }
        } else {
            self.angle = (self.angle + self.speed * dt).rem_euclid(TAU);
        }

        ctx.motion.position = pivot_pos + Vec2::from_angle(self.angle) * self.radius;
        ctx.motion.velocity = Vec2::ZERO;
    }
}
