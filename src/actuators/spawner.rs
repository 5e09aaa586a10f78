//! Periodic spawning.
//!
//! The actuator does not build entities itself: every interval it writes one
//! [`SpawnRequest`] per configured [`SpawnPoint`] into the behavior output,
//! and the FSM systems forward them to `Messages<SpawnRequest>`.

use bevy_ecs::prelude::Entity;
use glam::Vec2;
use log::warn;

use crate::components::actuator::{Actuator, ActuatorError};
use crate::components::behaviorcontext::BehaviorContext;
use crate::components::timer::Timer;
use crate::events::spawn::SpawnRequest;

/// What to spawn and where.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPoint {
    pub template: String,
    /// Spawn relative to this entity; `None` means the spawner itself.
    pub anchor: Option<Entity>,
    pub offset: Vec2,
}

impl SpawnPoint {
    pub fn new(template: impl Into<String>, offset: Vec2) -> Self {
        Self {
            template: template.into(),
            anchor: None,
            offset,
        }
    }

    pub fn anchored(mut self, anchor: Entity) -> Self {
        self.anchor = Some(anchor);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnerActuator {
    pub interval: f32,
    /// Number of spawn waves; `None` spawns forever.
    pub limit: Option<u32>,
    pub points: Vec<SpawnPoint>,
    timer: Timer,
    waves: u32,
}

impl Default for SpawnerActuator {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl SpawnerActuator {
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(0.0),
            limit: None,
            points: Vec::new(),
            timer: Timer::new(interval),
            waves: 0,
        }
    }

    pub fn with_point(mut self, point: SpawnPoint) -> Self {
        self.points.push(point);
        self
    }

    pub fn limited(mut self, waves: u32) -> Self {
        self.limit = Some(waves);
        self
    }

    pub fn waves_spawned(&self) -> u32 {
        self.waves
    }

    fn spawn_wave(&mut self, ctx: &mut BehaviorContext) {
        if self.limit.is_some_and(|limit| self.waves >= limit) {
            return;
        }
        self.waves += 1;
        for point in &self.points {
            let base = match point.anchor {
                Some(anchor) => ctx.view.position_of(anchor),
                None => Some(ctx.motion.position),
            };
            match base {
                Some(base) if !point.template.is_empty() => {
                    ctx.output.spawns.push(SpawnRequest {
                        spawner: ctx.entity,
                        template: point.template.clone(),
                        position: base + point.offset,
                    });
                }
                _ => warn!(
                    "Spawner on {:?}: spawn point '{}' has no template or position",
                    ctx.entity, point.template
                ),
            }
        }
    }
}

impl Actuator for SpawnerActuator {
    fn kind(&self) -> &'static str {
        "spawner"
    }

    fn start(&mut self, _ctx: &mut BehaviorContext) -> Result<(), ActuatorError> {
        self.timer = Timer::new(self.interval);
        self.timer.start();
        self.waves = 0;
        Ok(())
    }

    fn update(&mut self, ctx: &mut BehaviorContext) {
        self.timer.update(ctx.dt);
        if self.timer.time_remaining() <= 0.0 {
            self.spawn_wave(ctx);
            self.timer.start();
        }
    }
}
