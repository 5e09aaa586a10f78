//! Actuator contract: continuous per-frame behaviors owned by a state.
//!
//! Concrete strategies live in [`crate::actuators`]. The FSM only relies on
//! the three lifecycle calls below and on [`Actuator::kind`], which must be
//! unique per concrete type because a state holds at most one actuator of
//! each kind.

use thiserror::Error;

use crate::components::behaviorcontext::BehaviorContext;

/// Problems that keep an actuator from starting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    #[error("{actuator} actuator is missing its {reference}")]
    MissingReference {
        actuator: &'static str,
        reference: &'static str,
    },
}

/// A per-frame behavior strategy bound to the lifetime of its state.
pub trait Actuator: Send + Sync + 'static {
    /// Stable identifier of the concrete kind.
    fn kind(&self) -> &'static str;

    /// Called on state entry. An error disables this actuator until the next
    /// entry; sibling actuators still start.
    fn start(&mut self, ctx: &mut BehaviorContext) -> Result<(), ActuatorError>;

    /// Called every frame while the state is current and the actuator enabled.
    fn update(&mut self, ctx: &mut BehaviorContext);

    /// Called on state exit.
    fn destroy(&mut self, _ctx: &mut BehaviorContext) {}
}

/// An actuator attached to a state plus its enabled flag.
pub struct ActuatorSlot {
    actuator: Box<dyn Actuator>,
    enabled: bool,
}

impl ActuatorSlot {
    pub fn new(actuator: Box<dyn Actuator>) -> Self {
        Self {
            actuator,
            enabled: true,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.actuator.kind()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub(crate) fn start(&mut self, ctx: &mut BehaviorContext) -> Result<(), ActuatorError> {
        self.enabled = true;
        let result = self.actuator.start(ctx);
        if result.is_err() {
            self.enabled = false;
        }
        result
    }

    pub(crate) fn update(&mut self, ctx: &mut BehaviorContext) {
        if self.enabled {
            self.actuator.update(ctx);
        }
    }

    pub(crate) fn destroy(&mut self, ctx: &mut BehaviorContext) {
        self.actuator.destroy(ctx);
    }
}

impl std::fmt::Debug for ActuatorSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActuatorSlot")
            .field("kind", &self.kind())
            .field("enabled", &self.enabled)
            .finish()
    }
}
