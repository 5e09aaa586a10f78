//! FSM integration tests running the full simulation schedule.

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use glam::Vec2;

use aberredbehavior::actuators::CollisionReaction;
use aberredbehavior::actuators::directional::DirectionalActuator;
use aberredbehavior::actuators::horizontal::{Direction, HorizontalActuator};
use aberredbehavior::actuators::spawner::{SpawnPoint, SpawnerActuator};
use aberredbehavior::components::damagesensor::DamageSensor;
use aberredbehavior::components::destroyed::Destroyed;
use aberredbehavior::components::fsm::Fsm;
use aberredbehavior::components::mapposition::MapPosition;
use aberredbehavior::components::rigidbody::RigidBody;
use aberredbehavior::components::sensor::Sensor;
use aberredbehavior::components::sensorkind::{
    DetectionCondition, DistanceSensor, ElapsedSensor, SensorKind,
};
use aberredbehavior::components::state::State;
use aberredbehavior::events::contact::{ContactEvent, ContactPhase};
use aberredbehavior::events::life::{DestroyCause, EntityDestroyedEvent};
use aberredbehavior::events::statechange::StateChangeEvent;
use aberredbehavior::resources::simconfig::SimConfig;
use aberredbehavior::simulation::Simulation;

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

#[derive(Resource, Default)]
struct Recorded {
    changes: Vec<(Entity, String, String)>,
    destroyed: Vec<(Entity, DestroyCause)>,
}

fn recording_sim(config: SimConfig) -> Simulation {
    let mut sim = Simulation::new(config);
    let world = sim.world_mut();
    world.init_resource::<Recorded>();
    world.add_observer(|t: On<StateChangeEvent>, mut rec: ResMut<Recorded>| {
        let ev = t.event();
        rec.changes
            .push((ev.entity, ev.from_name.clone(), ev.to_name.clone()));
    });
    world.add_observer(|t: On<EntityDestroyedEvent>, mut rec: ResMut<Recorded>| {
        let ev = t.event();
        rec.destroyed.push((ev.entity, ev.cause));
    });
    world.flush();
    sim
}

fn current_name(sim: &Simulation, entity: Entity) -> Option<String> {
    sim.world()
        .get::<Fsm>(entity)
        .and_then(|fsm| fsm.current_state_name().map(str::to_string))
}

fn distance(target: Entity, d: f32) -> SensorKind {
    SensorKind::Distance(DistanceSensor::new(Some(target), d))
}

#[test]
fn guard_patrols_then_chases() {
    let mut sim = recording_sim(SimConfig::default());
    let world = sim.world_mut();
    let player = world.spawn(MapPosition::new(100.0, 0.0)).id();

    let mut fsm = Fsm::new();
    let patrol = fsm.add_state(
        State::new("patrol").with_actuator(HorizontalActuator::new(1.0, Direction::Left)),
    );
    let chase = fsm.add_state(
        State::new("chase")
            .with_actuator(HorizontalActuator::new(5.0, Direction::Left).following(player, 0.5)),
    );
    let near = fsm.add_sensor(Sensor::new("near", distance(player, 10.0)));
    fsm.add_transition(patrol, near, Some(chase)).unwrap();
    fsm.set_initial(patrol).unwrap();
    let guard = world
        .spawn((fsm, MapPosition::new(0.0, 0.0), RigidBody::new()))
        .id();

    sim.tick(1.0);
    assert_eq!(current_name(&sim, guard).as_deref(), Some("patrol"));
    let pos = sim.world().get::<MapPosition>(guard).unwrap().pos;
    assert!(approx_eq(pos.x, -1.0));

    sim.world_mut().get_mut::<MapPosition>(player).unwrap().pos = Vec2::new(5.0, 0.0);
    sim.tick(1.0);
    assert_eq!(current_name(&sim, guard).as_deref(), Some("chase"));
    assert_eq!(
        sim.world().resource::<Recorded>().changes,
        vec![(guard, "patrol".to_string(), "chase".to_string())]
    );

    // the chase actuator runs from the next frame on and heads right
    sim.tick(1.0);
    let body = sim.world().get::<RigidBody>(guard).unwrap();
    assert!(approx_eq(body.velocity.x, 5.0));
}

#[test]
fn same_frame_notifications_last_one_wins() {
    let mut sim = recording_sim(SimConfig::default());
    let world = sim.world_mut();
    let target = world.spawn(MapPosition::new(1.0, 0.0)).id();

    let mut fsm = Fsm::new();
    let s = fsm.add_state(State::new("s"));
    let x = fsm.add_state(State::new("x"));
    let y = fsm.add_state(State::new("y"));
    // arena order is evaluation order: b fires first, then a
    let b = fsm.add_sensor(Sensor::new("b", distance(target, 5.0)));
    let a = fsm.add_sensor(Sensor::new("a", distance(target, 5.0)));
    fsm.add_transition(s, a, Some(x)).unwrap();
    fsm.add_transition(s, b, Some(y)).unwrap();
    fsm.set_initial(s).unwrap();
    let e = world.spawn((fsm, MapPosition::new(0.0, 0.0))).id();

    sim.tick(0.1);
    assert_eq!(current_name(&sim, e).as_deref(), Some("x"));
    assert_eq!(sim.world().resource::<Recorded>().changes.len(), 1);
}

#[test]
fn exited_state_no_longer_reacts_to_its_sensors() {
    let mut sim = recording_sim(SimConfig::default());
    let world = sim.world_mut();
    let target = world.spawn(MapPosition::new(0.0, 0.0)).id();

    let mut fsm = Fsm::new();
    let idle = fsm.add_state(State::new("idle"));
    let alert = fsm.add_state(State::new("alert"));
    let calm = fsm.add_state(State::new("calm"));
    let close = fsm.add_sensor(Sensor::new("close", distance(target, 3.0)));
    let tick = fsm.add_sensor(Sensor::new("tick", SensorKind::Elapsed(ElapsedSensor::new(10.0))));
    fsm.add_transition(idle, close, Some(alert)).unwrap();
    fsm.add_transition(alert, tick, Some(calm)).unwrap();
    fsm.set_initial(idle).unwrap();
    let e = world.spawn((fsm, MapPosition::new(1.0, 0.0))).id();

    sim.tick(0.1);
    assert_eq!(current_name(&sim, e).as_deref(), Some("alert"));

    // `close` keeps detecting but nobody listens any more
    for _ in 0..5 {
        sim.tick(0.1);
    }
    assert_eq!(current_name(&sim, e).as_deref(), Some("alert"));
    let fsm = sim.world().get::<Fsm>(e).unwrap();
    assert!(!fsm.sensor(close).unwrap().is_active());
    assert_eq!(fsm.sensor(close).unwrap().subscriber_count(), 0);
    assert!(fsm.sensor(tick).unwrap().is_armed());
}

#[test]
fn elapsed_sensor_cycles_states() {
    let mut sim = recording_sim(SimConfig::default());
    let mut fsm = Fsm::new();
    let on = fsm.add_state(State::new("on"));
    let off = fsm.add_state(State::new("off"));
    let timer = fsm.add_sensor(Sensor::new("timer", SensorKind::Elapsed(ElapsedSensor::new(1.0))));
    fsm.add_transition(on, timer, Some(off)).unwrap();
    fsm.add_transition(off, timer, Some(on)).unwrap();
    fsm.set_initial(on).unwrap();
    let e = sim.world_mut().spawn(fsm).id();

    for _ in 0..4 {
        sim.tick(0.5);
    }
    let names: Vec<String> = sim
        .world()
        .resource::<Recorded>()
        .changes
        .iter()
        .map(|(_, _, to)| to.clone())
        .collect();
    assert_eq!(names, vec!["off".to_string(), "on".to_string()]);
    assert_eq!(current_name(&sim, e).as_deref(), Some("on"));
}

#[test]
fn arm_delay_postpones_detection() {
    let mut sim = recording_sim(SimConfig::default());
    let world = sim.world_mut();
    let target = world.spawn(MapPosition::new(0.0, 0.0)).id();
    let mut fsm = Fsm::new();
    let a = fsm.add_state(State::new("a"));
    let b = fsm.add_state(State::new("b"));
    let near = fsm.add_sensor(Sensor::new("near", distance(target, 1.0)).with_arm_delay(1.0));
    fsm.add_transition(a, near, Some(b)).unwrap();
    fsm.set_initial(a).unwrap();
    let e = world.spawn((fsm, MapPosition::new(0.0, 0.0))).id();

    sim.tick(0.4);
    sim.tick(0.4);
    assert_eq!(current_name(&sim, e).as_deref(), Some("a"));
    sim.tick(0.4);
    assert_eq!(current_name(&sim, e).as_deref(), Some("b"));
}

#[test]
fn outside_condition_fires_when_far() {
    let mut sim = recording_sim(SimConfig::default());
    let world = sim.world_mut();
    let target = world.spawn(MapPosition::new(0.0, 0.0)).id();
    let mut fsm = Fsm::new();
    let a = fsm.add_state(State::new("a"));
    let b = fsm.add_state(State::new("b"));
    let far = fsm.add_sensor(Sensor::new(
        "far",
        SensorKind::Distance(
            DistanceSensor::new(Some(target), 5.0).with_condition(DetectionCondition::Outside),
        ),
    ));
    fsm.add_transition(a, far, Some(b)).unwrap();
    fsm.set_initial(a).unwrap();
    let e = world.spawn((fsm, MapPosition::new(2.0, 0.0))).id();

    sim.tick(0.1);
    assert_eq!(current_name(&sim, e).as_deref(), Some("a"));
    sim.world_mut().get_mut::<MapPosition>(e).unwrap().pos = Vec2::new(8.0, 0.0);
    sim.tick(0.1);
    assert_eq!(current_name(&sim, e).as_deref(), Some("b"));
}

#[test]
fn fsm_without_initial_state_stays_inactive() {
    let mut sim = recording_sim(SimConfig::default());
    let mut fsm = Fsm::new();
    fsm.add_state(State::new("orphan").with_actuator(DirectionalActuator::new(3.0, 0.0)));
    let e = sim
        .world_mut()
        .spawn((fsm, MapPosition::new(0.0, 0.0), RigidBody::new()))
        .id();

    sim.tick(1.0);
    sim.tick(1.0);
    let fsm = sim.world().get::<Fsm>(e).unwrap();
    assert_eq!(fsm.current_state(), None);
    assert!(!fsm.needs_activation());
    assert_eq!(sim.world().get::<MapPosition>(e).unwrap().pos, Vec2::ZERO);
}

#[test]
fn projectile_destroyed_on_collision_is_paused() {
    let mut sim = recording_sim(SimConfig::default());
    let world = sim.world_mut();
    let wall = world.spawn(MapPosition::new(10.0, 0.0)).id();
    let mut fsm = Fsm::new();
    let fly = fsm.add_state(
        State::new("fly").with_actuator(
            DirectionalActuator::new(4.0, 0.0).on_collision(CollisionReaction::Destroy, 1 << 3),
        ),
    );
    fsm.set_initial(fly).unwrap();
    let bullet = world
        .spawn((fsm, MapPosition::new(0.0, 0.0), RigidBody::new()))
        .id();

    sim.tick(1.0);
    assert!(approx_eq(sim.world().get::<MapPosition>(bullet).unwrap().pos.x, 4.0));

    sim.send_contact(ContactEvent::collision(bullet, wall, 3, ContactPhase::Began));
    sim.tick(1.0);

    assert!(sim.world().get::<Destroyed>(bullet).is_some());
    assert!(sim.world().get::<RigidBody>(bullet).unwrap().is_frozen());
    assert_eq!(
        sim.world().resource::<Recorded>().destroyed,
        vec![(bullet, DestroyCause::Actuator)]
    );

    let frozen_at = sim.world().get::<MapPosition>(bullet).unwrap().pos;
    sim.tick(1.0);
    assert_eq!(sim.world().get::<MapPosition>(bullet).unwrap().pos, frozen_at);
}

#[test]
fn destroyed_entity_despawns_when_configured() {
    let mut config = SimConfig::default();
    config.despawn_destroyed = true;
    let mut sim = recording_sim(config);
    let world = sim.world_mut();
    let wall = world.spawn_empty().id();
    let mut fsm = Fsm::new();
    let fly = fsm.add_state(
        State::new("fly").with_actuator(
            DirectionalActuator::new(1.0, 0.0).on_collision(CollisionReaction::Destroy, u32::MAX),
        ),
    );
    fsm.set_initial(fly).unwrap();
    let bullet = world
        .spawn((fsm, MapPosition::new(0.0, 0.0), RigidBody::new()))
        .id();

    sim.tick(0.1);
    sim.send_contact(ContactEvent::collision(bullet, wall, 0, ContactPhase::Began));
    sim.tick(0.1);
    assert!(sim.world().get_entity(bullet).is_err());
}

#[test]
fn spawner_emits_requests_while_its_state_is_current() {
    let mut sim = recording_sim(SimConfig::default());
    let mut fsm = Fsm::new();
    let fire = fsm.add_state(
        State::new("fire").with_actuator(
            SpawnerActuator::new(1.0)
                .with_point(SpawnPoint::new("bullet", Vec2::new(0.0, 2.0)))
                .limited(2),
        ),
    );
    fsm.set_initial(fire).unwrap();
    let turret = sim
        .world_mut()
        .spawn((fsm, MapPosition::new(5.0, 5.0)))
        .id();

    let mut requests = Vec::new();
    for _ in 0..6 {
        sim.tick(0.5);
        requests.extend(sim.take_spawn_requests());
    }
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.spawner == turret && r.template == "bullet"));
    assert_eq!(requests[0].position, Vec2::new(5.0, 7.0));
}

#[test]
fn spawn_requests_wait_until_taken() {
    let mut sim = recording_sim(SimConfig::default());
    let mut fsm = Fsm::new();
    let fire = fsm.add_state(
        State::new("fire").with_actuator(
            SpawnerActuator::new(1.0)
                .with_point(SpawnPoint::new("bullet", Vec2::ZERO))
                .limited(2),
        ),
    );
    fsm.set_initial(fire).unwrap();
    sim.world_mut().spawn((fsm, MapPosition::new(0.0, 0.0)));

    for _ in 0..6 {
        sim.tick(0.5);
    }
    assert_eq!(sim.take_spawn_requests().len(), 2);
    assert!(sim.take_spawn_requests().is_empty());
    sim.tick(0.5);
    sim.tick(0.5);
    assert!(sim.take_spawn_requests().is_empty());
}

#[test]
fn state_arms_and_disarms_its_damage_sensors() {
    let mut sim = recording_sim(SimConfig::default());
    let world = sim.world_mut();
    let hurtbox = world.spawn(DamageSensor::new()).id();
    let mut fsm = Fsm::new();
    let vulnerable = fsm.add_state(State::new("vulnerable").with_damage_sensor(hurtbox));
    let shielded = fsm.add_state(State::new("shielded"));
    let timer = fsm.add_sensor(Sensor::new("timer", SensorKind::Elapsed(ElapsedSensor::new(1.0))));
    fsm.add_transition(vulnerable, timer, Some(shielded)).unwrap();
    fsm.set_initial(vulnerable).unwrap();
    world.spawn(fsm);

    sim.tick(0.5);
    assert!(sim.world().get::<DamageSensor>(hurtbox).unwrap().is_armed());
    sim.tick(0.5);
    assert!(!sim.world().get::<DamageSensor>(hurtbox).unwrap().is_active());
}
