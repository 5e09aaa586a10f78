//! Sensors: condition detectors that notify subscribed states.
//!
//! Sensors live in the [`Fsm`](super::fsm::Fsm) arena and are addressed by
//! [`SensorId`], so one sensor can back transitions of several states. A
//! state arms its transitions' sensors and subscribes its handler on entry,
//! then unsubscribes and disarms them on exit.
//!
//! # Lifecycle
//!
//! 1. [`Sensor::arm`] activates the sensor. With an arm delay the sensor
//!    stays unarmed until the delay elapses; without one it is armed at once.
//! 2. [`Sensor::evaluate`] runs once per frame. It returns `false` while
//!    inactive or unarmed, otherwise delegates to its [`SensorKind`].
//! 3. [`Sensor::disarm`] stops evaluation. Subscribers are kept until they
//!    unsubscribe explicitly.

use bevy_ecs::prelude::Entity;
use log::debug;
use smallvec::SmallVec;

use crate::components::behaviorcontext::WorldView;
use crate::components::sensorkind::SensorKind;
use crate::components::state::StateId;
use crate::components::subscribers::{SubscriptionError, Subscribers};
use crate::components::timer::Timer;

/// Index of a sensor inside its FSM arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorId(pub(crate) usize);

impl SensorId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Sensor {
    name: String,
    kind: SensorKind,
    /// Entity whose position/contacts are sensed; `None` means the FSM owner.
    host: Option<Entity>,
    arm_delay: f32,
    arm_timer: Timer,
    active: bool,
    armed: bool,
    subscribers: Subscribers<StateId>,
    debug: bool,
}

impl Sensor {
    pub fn new(name: impl Into<String>, kind: SensorKind) -> Self {
        Self {
            name: name.into(),
            kind,
            host: None,
            arm_delay: 0.0,
            arm_timer: Timer::new(0.0),
            active: false,
            armed: false,
            subscribers: Subscribers::new(),
            debug: false,
        }
    }

    /// Minimum time the sensor must be active before it starts detecting.
    pub fn with_arm_delay(mut self, seconds: f32) -> Self {
        self.arm_delay = seconds.max(0.0);
        self
    }

    /// Sense from another entity (a hitbox child, a detection zone...).
    pub fn hosted_on(mut self, host: Entity) -> Self {
        self.host = Some(host);
        self
    }

    pub fn arm(&mut self) {
        self.active = true;
        self.arm_timer = Timer::new(self.arm_delay);
        if self.arm_delay > 0.0 {
            self.arm_timer.start();
            self.armed = false;
        } else {
            self.armed = true;
        }
        self.kind.on_arm(&self.name);
    }

    pub fn disarm(&mut self) {
        self.active = false;
    }

    /// Whether the notification should fire this frame.
    pub fn evaluate(&mut self, owner: Entity, dt: f32, view: &WorldView) -> bool {
        if !self.active {
            return false;
        }
        if !self.armed {
            self.arm_timer.update(dt);
            if self.arm_timer.time_remaining() > 0.0 {
                return false;
            }
            self.armed = true;
        }
        let fired = self.kind.detect(self.host.unwrap_or(owner), dt, view);
        if fired && self.debug {
            debug!("Sensor '{}' ({}) fired", self.name, self.kind.name());
        }
        fired
    }

    pub fn subscribe(&mut self, observer: StateId) {
        self.subscribers.subscribe(observer);
    }

    pub fn unsubscribe(&mut self, observer: StateId) -> Result<(), SubscriptionError> {
        self.subscribers.unsubscribe(observer)
    }

    /// Observers to invoke for one notification, in subscription order.
    pub fn notify(&self) -> SmallVec<[StateId; 4]> {
        self.subscribers.snapshot()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.count()
    }

    pub fn is_subscribed(&self, observer: StateId) -> bool {
        self.subscribers.contains(observer)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Active and past its arm delay.
    pub fn is_armed(&self) -> bool {
        self.active && self.armed
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &SensorKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut SensorKind {
        &mut self.kind
    }

    pub fn host(&self) -> Option<Entity> {
        self.host
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }
}
