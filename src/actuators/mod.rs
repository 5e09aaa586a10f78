//! Concrete actuators: motion and spawning strategies behind the
//! [`Actuator`](crate::components::actuator::Actuator) contract.
//!
//! Submodules overview:
//! - [`circular`] – rotation or pendulum swing around a pivot entity
//! - [`directional`] – velocity along an angle, optionally eased, bounced or thrown once
//! - [`easing`] – easing curves and speed ramps shared by the motion actuators
//! - [`horizontal`] – left/right patrol with optional pursuit along X
//! - [`movetotarget`] – eased travel to another entity's position
//! - [`patrol`] – waypoint route or random points in an area, with per-leg easing and dwell
//! - [`spawner`] – periodic spawn requests at configured points
//! - [`vertical`] – up/down motion with optional pursuit along Y
//!
//! Velocity actuators write `ctx.motion.velocity` and let the movement system
//! integrate it. Kinematic actuators (circular, move-to-target, patrol) place the
//! entity through `ctx.motion.position` and zero its velocity.

pub mod circular;
pub mod directional;
pub mod easing;
pub mod horizontal;
pub mod movetotarget;
pub mod patrol;
pub mod spawner;
pub mod vertical;

use serde::{Deserialize, Serialize};

use crate::components::behaviorcontext::BehaviorContext;
use crate::events::contact::{ContactEvent, ContactShape};

/// What a moving actuator does when it hits something on an accepted layer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionReaction {
    #[default]
    None,
    Bounce,
    /// Ask for the entity to be destroyed.
    Destroy,
}

/// Ongoing solid contacts of the driven entity whose other side is on a layer
/// in `layer_mask`.
pub(crate) fn blocking_contacts<'a>(
    ctx: &BehaviorContext<'a>,
    layer_mask: u32,
) -> impl Iterator<Item = &'a ContactEvent> + use<'a> {
    ctx.view.contacts_for(ctx.entity).filter(move |c| {
        c.shape == ContactShape::Collision
            && c.is_touching()
            && c.other_layer < 32
            && layer_mask & (1 << c.other_layer) != 0
    })
}
