//! Detection strategies for [`Sensor`](super::sensor::Sensor).
//!
//! Each variant only decides *whether* its condition holds this frame. Arming,
//! the arm delay and subscriber bookkeeping live in the sensor itself.

use bevy_ecs::prelude::Entity;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::components::behaviorcontext::WorldView;
use crate::components::timer::Timer;
use crate::events::contact::{ContactPhase, ContactShape};

/// Whether the detected condition is "inside" or "outside" a range or zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetectionCondition {
    #[default]
    Inside,
    Outside,
}

/// Fires while a collision with an accepted layer is starting or ongoing.
///
/// Sustained contacts fire again so a collision that began while the sensor
/// was disarmed is still picked up once it arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionSensor {
    /// Bit `n` set means layer `n` triggers the sensor.
    pub layer_mask: u32,
}

impl Default for CollisionSensor {
    fn default() -> Self {
        Self {
            layer_mask: u32::MAX,
        }
    }
}

impl CollisionSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layers(layer_mask: u32) -> Self {
        Self { layer_mask }
    }

    pub fn accepts(&self, layer: u32) -> bool {
        layer < 32 && self.layer_mask & (1 << layer) != 0
    }

    fn detect(&self, host: Entity, view: &WorldView) -> bool {
        view.contacts_for(host).any(|c| {
            c.shape == ContactShape::Collision && c.is_touching() && self.accepts(c.other_layer)
        })
    }
}

/// Fires when `target` is inside (enter/stay) or leaves (exit) the host's zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AreaSensor {
    pub target: Option<Entity>,
    pub condition: DetectionCondition,
}

impl AreaSensor {
    pub fn new(target: Entity, condition: DetectionCondition) -> Self {
        Self {
            target: Some(target),
            condition,
        }
    }

    fn detect(&self, host: Entity, view: &WorldView) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        view.contacts_for(host)
            .filter(|c| c.shape == ContactShape::Area && c.other == target)
            .any(|c| match self.condition {
                DetectionCondition::Inside => c.is_touching(),
                DetectionCondition::Outside => c.phase == ContactPhase::Ended,
            })
    }
}

/// How a [`DistanceSensor`] measures the gap to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMode {
    /// Euclidean distance between centers.
    #[default]
    Magnitude,
    /// Signed offset along one axis.
    SingleAxis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Axis {
    #[default]
    X,
    Y,
}

/// Which side of the axis counts for [`DistanceMode::SingleAxis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetectionSide {
    #[default]
    Both,
    /// Target left of / below the host.
    Negative,
    /// Target right of / above the host.
    Positive,
}

/// Compares host-to-target distance against a threshold every frame.
///
/// Continuous: fires on every frame the condition holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSensor {
    pub target: Option<Entity>,
    pub mode: DistanceMode,
    pub axis: Axis,
    pub side: DetectionSide,
    pub distance: f32,
    pub condition: DetectionCondition,
}

impl Default for DistanceSensor {
    fn default() -> Self {
        Self {
            target: None,
            mode: DistanceMode::Magnitude,
            axis: Axis::X,
            side: DetectionSide::Both,
            distance: 5.0,
            condition: DetectionCondition::Inside,
        }
    }
}

impl DistanceSensor {
    pub fn new(target: Option<Entity>, distance: f32) -> Self {
        Self {
            target,
            distance: distance.max(0.0),
            ..Self::default()
        }
    }

    pub fn with_condition(mut self, condition: DetectionCondition) -> Self {
        self.condition = condition;
        self
    }

    pub fn single_axis(mut self, axis: Axis, side: DetectionSide) -> Self {
        self.mode = DistanceMode::SingleAxis;
        self.axis = axis;
        self.side = side;
        self
    }

    pub fn set_target(&mut self, target: Option<Entity>) {
        self.target = target;
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.max(0.0);
    }

    fn detect(&self, host: Entity, view: &WorldView) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let (Some(own), Some(other)) = (view.position_of(host), view.position_of(target)) else {
            return false;
        };

        let in_range = match self.mode {
            DistanceMode::Magnitude => own.distance(other) <= self.distance,
            DistanceMode::SingleAxis => {
                let delta = match self.axis {
                    Axis::X => other.x - own.x,
                    Axis::Y => other.y - own.y,
                };
                let correct_side = match self.side {
                    DetectionSide::Both => true,
                    DetectionSide::Negative => delta < 0.0,
                    DetectionSide::Positive => delta > 0.0,
                };
                correct_side && delta.abs() <= self.distance
            }
        };

        match self.condition {
            DetectionCondition::Inside => in_range,
            DetectionCondition::Outside => !in_range,
        }
    }
}

/// Fires once per interval and restarts itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElapsedSensor {
    pub interval: f32,
    timer: Timer,
}

impl Default for ElapsedSensor {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl ElapsedSensor {
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(0.0),
            timer: Timer::new(interval),
        }
    }

    pub fn time_remaining(&self) -> f32 {
        self.timer.time_remaining()
    }

    fn restart(&mut self) {
        self.timer = Timer::new(self.interval);
        self.timer.start();
    }

    fn detect(&mut self, dt: f32) -> bool {
        self.timer.update(dt);
        if self.timer.is_finished() {
            self.timer.start();
            return true;
        }
        false
    }
}

/// Closed set of detection strategies a sensor can carry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorKind {
    Collision(CollisionSensor),
    Area(AreaSensor),
    Distance(DistanceSensor),
    Elapsed(ElapsedSensor),
}

impl SensorKind {
    pub fn name(&self) -> &'static str {
        match self {
            SensorKind::Collision(_) => "collision",
            SensorKind::Area(_) => "area",
            SensorKind::Distance(_) => "distance",
            SensorKind::Elapsed(_) => "elapsed",
        }
    }

    /// Reset per-arm state and report configuration problems.
    pub(crate) fn on_arm(&mut self, sensor_name: &str) {
        match self {
            SensorKind::Area(area) if area.target.is_none() => {
                warn!("No target set in area sensor '{}'; it will never fire", sensor_name);
            }
            SensorKind::Distance(distance) if distance.target.is_none() => {
                warn!("No target set in distance sensor '{}'; it will never fire", sensor_name);
            }
            SensorKind::Elapsed(elapsed) => elapsed.restart(),
            _ => {}
        }
    }

    pub(crate) fn detect(&mut self, host: Entity, dt: f32, view: &WorldView) -> bool {
        match self {
            SensorKind::Collision(collision) => collision.detect(host, view),
            SensorKind::Area(area) => area.detect(host, view),
            SensorKind::Distance(distance) => distance.detect(host, view),
            SensorKind::Elapsed(elapsed) => elapsed.detect(dt),
        }
    }
}
