//! Headless simulation driver.
//!
//! [`Simulation`] owns a bevy_ecs [`World`] prepared with every resource,
//! message buffer and observer the behavior systems need, plus the
//! [`Schedule`] that runs them in frame order. Collaborators (a physics
//! engine, a renderer, tests) spawn entities into [`Simulation::world_mut`],
//! push contacts with [`Simulation::send_contact`] and call
//! [`Simulation::tick`] once per frame.

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemState;

use crate::events::contact::ContactEvent;
use crate::events::damage::DamageNotice;
use crate::events::life::observe_entity_destroyed;
use crate::events::spawn::SpawnRequest;
use crate::resources::simconfig::SimConfig;
use crate::resources::worldtime::WorldTime;
use crate::systems::damage::{
    damage_sensor_system, damage_startup_system, life_attach_system, life_system,
};
use crate::systems::fsm::{
    fsm_activation_system, fsm_actuator_system, fsm_sensor_system, fsm_transition_system,
    rotate_messages,
};
use crate::systems::movement::movement_system;
use crate::systems::time::update_world_time;

/// Frame order:
///
/// 1. message rotation
/// 2. damage startup, Life subscription
/// 3. FSM activation, actuators, sensors, transitions
/// 4. damage sensors, Life
/// 5. movement integration
pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            rotate_messages,
            damage_startup_system,
            life_attach_system,
            fsm_activation_system,
            fsm_actuator_system,
            fsm_sensor_system,
            fsm_transition_system,
            damage_sensor_system,
            life_system,
            movement_system,
        )
            .chain(),
    );
    schedule
}

pub struct Simulation {
    world: World,
    schedule: Schedule,
    spawn_reader: SystemState<MessageReader<'static, 'static, SpawnRequest>>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        let mut world = World::new();
        world.insert_resource(WorldTime::with_time_scale(config.time_scale));
        world.insert_resource(config);
        world.init_resource::<Messages<ContactEvent>>();
        world.init_resource::<Messages<SpawnRequest>>();
        world.init_resource::<Messages<DamageNotice>>();
        world.add_observer(observe_entity_destroyed);
        world.flush();
        let spawn_reader = SystemState::new(&mut world);

        Self {
            world,
            schedule: build_schedule(),
            spawn_reader,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Queue a contact reported by the physics collaborator for the next tick.
    pub fn send_contact(&mut self, contact: ContactEvent) {
        self.world.resource_mut::<Messages<ContactEvent>>().write(contact);
    }

    /// Spawn requests written since the previous call, however many ticks
    /// ago that was.
    pub fn take_spawn_requests(&mut self) -> Vec<SpawnRequest> {
        let requests: Vec<SpawnRequest> = {
            let mut reader = self.spawn_reader.get_mut(&mut self.world);
            reader.read().cloned().collect()
        };
        // read requests move to the back buffer and drop on the next take
        self.world.resource_mut::<Messages<SpawnRequest>>().update();
        requests
    }

    /// Advance one frame of `dt` unscaled seconds.
    pub fn tick(&mut self, dt: f32) {
        update_world_time(&mut self.world, dt);
        self.schedule.run(&mut self.world);
        self.world.clear_trackers();
    }

    pub fn time(&self) -> WorldTime {
        *self.world.resource::<WorldTime>()
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}
