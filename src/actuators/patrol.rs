//! Point-to-point patrol: a fixed waypoint route or random points inside an
//! area.
//!
//! Each leg interpolates from where the previous leg ended to the next point
//! over the leg's `time_to_reach`, optionally eased, and may dwell at the
//! point before moving on. Like [`movetotarget`](super::movetotarget) this is
//! kinematic: the position is written directly and the velocity zeroed.

use fastrand::Rng;
use glam::Vec2;

use crate::actuators::easing::{Easing, ease};
use crate::components::actuator::{Actuator, ActuatorError};
use crate::components::behaviorcontext::BehaviorContext;

/// Eased progress past this counts as arrived.
const ALMOST_REACHED: f32 = 0.999;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub point: Vec2,
    pub time_to_reach: f32,
    pub easing: Option<Easing>,
    /// Seconds to wait at the point once reached.
    pub dwell: f32,
}

impl Waypoint {
    pub fn new(point: Vec2, time_to_reach: f32) -> Self {
        Self {
            point,
            time_to_reach: time_to_reach.max(0.0),
            easing: None,
            dwell: 0.0,
        }
    }

    pub fn eased(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn dwelling(mut self, seconds: f32) -> Self {
        self.dwell = seconds.max(0.0);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatrolRoute {
    Waypoints(Vec<Waypoint>),
    /// Endless legs to random points inside the rectangle `min..max`, each
    /// `leg_time` seconds long with quadratic in-out easing.
    RandomArea { min: Vec2, max: Vec2, leg_time: f32 },
}

#[derive(Debug, Clone)]
pub struct PatrolActuator {
    pub route: PatrolRoute,
    /// Start over from the first waypoint after the last one.
    pub looping: bool,
    rng: Rng,
    leg: Option<Waypoint>,
    index: usize,
    origin: Vec2,
    travel: f32,
    dwelt: f32,
    progress: f32,
    moving: bool,
}

impl PatrolActuator {
    pub fn waypoints(waypoints: Vec<Waypoint>) -> Self {
        Self::with_route(PatrolRoute::Waypoints(waypoints))
    }

    pub fn random_area(min: Vec2, max: Vec2, leg_time: f32) -> Self {
        Self::with_route(PatrolRoute::RandomArea {
            min: min.min(max),
            max: min.max(max),
            leg_time: leg_time.max(0.0),
        })
    }

    fn with_route(route: PatrolRoute) -> Self {
        Self {
            route,
            looping: false,
            rng: Rng::new(),
            leg: None,
            index: 0,
            origin: Vec2::ZERO,
            travel: 0.0,
            dwelt: 0.0,
            progress: 0.0,
            moving: false,
        }
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Fix the random sequence of a random-area patrol.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Rng::with_seed(seed);
        self
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Point the current leg heads to.
    pub fn current_goal(&self) -> Option<Vec2> {
        self.leg.map(|leg| leg.point)
    }

    fn next_leg(&mut self) -> Option<Waypoint> {
        match &self.route {
            PatrolRoute::Waypoints(points) => points.get(self.index).copied(),
            PatrolRoute::RandomArea { min, max, leg_time } => {
                let point = Vec2::new(
                    min.x + self.rng.f32() * (max.x - min.x),
                    min.y + self.rng.f32() * (max.y - min.y),
                );
                Some(Waypoint::new(point, *leg_time).eased(Easing::QuadInOut))
            }
        }
    }

    fn begin_leg(&mut self, from: Vec2) {
        self.origin = from;
        self.travel = 0.0;
        self.dwelt = 0.0;
        self.progress = 0.0;
        self.leg = self.next_leg();
        self.moving = self.leg.is_some();
    }

    fn advance(&mut self, reached: Vec2) {
        self.index += 1;
        if let PatrolRoute::Waypoints(points) = &self.route {
            if self.index >= points.len() {
                if !self.looping {
                    self.leg = None;
                    self.moving = false;
                    return;
                }
                self.index = 0;
            }
        }
        self.begin_leg(reached);
    }
}

impl Actuator for PatrolActuator {
    fn kind(&self) -> &'static str {
        "patrol"
    }

    fn start(&mut self, ctx: &mut BehaviorContext) -> Result<(), ActuatorError> {
        if matches!(&self.route, PatrolRoute::Waypoints(points) if points.is_empty()) {
            return Err(ActuatorError::MissingReference {
                actuator: "patrol",
                reference: "waypoints",
            });
        }
        self.index = 0;
        self.begin_leg(ctx.motion.position);
        Ok(())
    }

    fn update(&mut self, ctx: &mut BehaviorContext) {
        if !self.moving {
            return;
        }
        let Some(leg) = self.leg else {
            return;
        };

        if self.progress >= 1.0 {
            self.dwelt += ctx.dt;
            if self.dwelt >= leg.dwell {
                self.advance(leg.point);
            }
            return;
        }

        self.travel += ctx.dt;
        let mut t = if leg.time_to_reach <= 0.0 {
            1.0
        } else {
            self.travel / leg.time_to_reach
        };
        if let Some(easing) = leg.easing {
            t = ease(easing, t);
            if t >= ALMOST_REACHED {
                t = 1.0;
            }
        }
        self.progress = t.min(1.0);

        ctx.motion.position = self.origin.lerp(leg.point, self.progress);
        ctx.motion.velocity = Vec2::ZERO;
        if self.progress >= 1.0 && leg.dwell <= 0.0 {
            self.advance(leg.point);
        }
    }
}
