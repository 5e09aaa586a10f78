//! Kinematic body component.
//!
//! The [`RigidBody`] stores the velocity the movement system integrates into
//! [`MapPosition`](super::mapposition::MapPosition). Actuators write it
//! through the behavior context's motion; the FSM freezes it when the entity
//! is paused.

use bevy_ecs::prelude::Component;
use glam::Vec2;
use log::warn;

/// Kinematic body storing velocity.
///
/// # Fields
/// - `velocity` - Current velocity in world units per second
/// - `max_speed` - Optional maximum speed clamp
/// - `frozen` - When true, movement and actuators leave this entity alone
#[derive(Component, Clone, Debug, Default)]
pub struct RigidBody {
    pub velocity: Vec2,
    pub max_speed: Option<f32>,
    pub frozen: bool,
}

impl RigidBody {
    /// Create a RigidBody with zero velocity.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_velocity(velocity: Vec2) -> Self {
        Self {
            velocity,
            ..Self::default()
        }
    }

    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = Some(max_speed.max(0.0));
        self
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Velocity after the optional speed clamp.
    pub fn clamped_velocity(&self) -> Vec2 {
        match self.max_speed {
            Some(max) => self.velocity.clamp_length_max(max),
            None => self.velocity,
        }
    }

    /// Freeze the rigid body, preventing movement system from updating it.
    pub fn freeze(&mut self) {
        self.frozen = true;
        self.velocity = Vec2::ZERO;
    }

    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Set speed while maintaining the current direction of velocity.
    ///
    /// With zero velocity there is no direction to keep and the call is ignored.
    pub fn set_speed(&mut self, new_speed: f32) {
        if self.velocity.length() > 0.0 {
            self.velocity = self.velocity.normalize() * new_speed;
        } else {
            warn!("RigidBody::set_speed called with zero velocity - operation ignored");
        }
    }
}
