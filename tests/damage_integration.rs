//! Damage protocol integration tests: emitters, damage sensors and lives
//! driven through the simulation schedule.

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;

use aberredbehavior::components::damageemitter::DamageEmitter;
use aberredbehavior::components::damagesensor::DamageSensor;
use aberredbehavior::components::destroyed::Destroyed;
use aberredbehavior::components::fsm::Fsm;
use aberredbehavior::components::life::{DamageState, Life};
use aberredbehavior::components::sensor::Sensor;
use aberredbehavior::components::sensorkind::{ElapsedSensor, SensorKind};
use aberredbehavior::components::state::State;
use aberredbehavior::events::contact::{ContactEvent, ContactPhase};
use aberredbehavior::events::life::{DestroyCause, EntityDestroyedEvent, LifeChangedEvent};
use aberredbehavior::resources::simconfig::SimConfig;
use aberredbehavior::simulation::Simulation;

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

#[derive(Resource, Default)]
struct Recorded {
    life_changes: Vec<(Entity, f32, f32)>,
    destroyed: Vec<(Entity, DestroyCause)>,
}

fn recording_sim() -> Simulation {
    let mut sim = Simulation::new(SimConfig::default());
    let world = sim.world_mut();
    world.init_resource::<Recorded>();
    world.add_observer(|t: On<LifeChangedEvent>, mut rec: ResMut<Recorded>| {
        let ev = t.event();
        rec.life_changes.push((ev.entity, ev.previous, ev.current));
    });
    world.add_observer(|t: On<EntityDestroyedEvent>, mut rec: ResMut<Recorded>| {
        let ev = t.event();
        rec.destroyed.push((ev.entity, ev.cause));
    });
    world.flush();
    sim
}

fn spawn_victim(sim: &mut Simulation, life: f32) -> Entity {
    sim.world_mut()
        .spawn((
            Life::new(life, 100.0),
            DamageSensor::new().active_from_start(true),
        ))
        .id()
}

fn spawn_hazard(sim: &mut Simulation, emitter: DamageEmitter) -> Entity {
    sim.world_mut()
        .spawn(emitter.active_from_start(true))
        .id()
}

fn life_of(sim: &Simulation, e: Entity) -> Life {
    sim.world().get::<Life>(e).unwrap().clone()
}

#[test]
fn residual_damage_runs_to_completion() {
    let mut sim = recording_sim();
    let victim = spawn_victim(&mut sim, 100.0);
    let hazard = spawn_hazard(&mut sim, DamageEmitter::residual(10.0, 5.0, 3, 1.0));

    sim.send_contact(ContactEvent::collision(victim, hazard, 0, ContactPhase::Began));
    sim.tick(0.5);
    assert!(approx_eq(life_of(&sim, victim).current(), 90.0));
    assert_eq!(life_of(&sim, victim).damage_state(), DamageState::Ticking);

    sim.tick(0.5);
    assert!(approx_eq(life_of(&sim, victim).current(), 90.0));
    sim.tick(0.5);
    let life = life_of(&sim, victim);
    assert!(approx_eq(life.current(), 85.0));
    assert_eq!(life.remaining_residual_ticks(), 2);

    // contact ends; the residual sequence keeps going
    sim.send_contact(ContactEvent::collision(victim, hazard, 0, ContactPhase::Ended));
    for _ in 0..4 {
        sim.tick(0.5);
    }
    let life = life_of(&sim, victim);
    assert!(approx_eq(life.current(), 75.0));
    assert_eq!(life.remaining_residual_ticks(), 0);
    assert_eq!(life.damage_state(), DamageState::Idle);

    let rec = sim.world().resource::<Recorded>();
    let currents: Vec<f32> = rec.life_changes.iter().map(|(_, _, c)| *c).collect();
    assert_eq!(currents.len(), 4);
    assert!(approx_eq(currents[0], 90.0));
    assert!(approx_eq(currents[3], 75.0));
    assert!(rec.destroyed.is_empty());
}

#[test]
fn insta_kill_signals_destruction_once() {
    let mut sim = recording_sim();
    let victim = spawn_victim(&mut sim, 73.0);
    let pit = spawn_hazard(&mut sim, DamageEmitter::insta_kill());
    let spike = spawn_hazard(&mut sim, DamageEmitter::instant(5.0));

    sim.send_contact(ContactEvent::collision(victim, pit, 0, ContactPhase::Began));
    sim.tick(0.1);
    assert_eq!(life_of(&sim, victim).current(), 0.0);

    sim.send_contact(ContactEvent::area(victim, pit, ContactPhase::Began));
    sim.send_contact(ContactEvent::collision(victim, spike, 0, ContactPhase::Began));
    sim.tick(0.1);
    sim.tick(0.1);

    let rec = sim.world().resource::<Recorded>();
    assert_eq!(rec.destroyed, vec![(victim, DestroyCause::Killed)]);
    assert_eq!(rec.life_changes, vec![(victim, 73.0, 0.0)]);
    assert!(sim.world().get::<Destroyed>(victim).is_some());
}

#[test]
fn permanence_keeps_hurting_while_in_contact() {
    let mut sim = recording_sim();
    let victim = spawn_victim(&mut sim, 100.0);
    let lava = spawn_hazard(&mut sim, DamageEmitter::permanence(10.0, 1.0));

    sim.send_contact(ContactEvent::collision(victim, lava, 0, ContactPhase::Began));
    sim.tick(0.6);
    assert!(approx_eq(life_of(&sim, victim).current(), 90.0));

    // sustained contacts do not start new hits
    sim.send_contact(ContactEvent::collision(victim, lava, 0, ContactPhase::Sustained));
    sim.tick(0.6);
    assert!(approx_eq(life_of(&sim, victim).current(), 90.0));
    sim.send_contact(ContactEvent::collision(victim, lava, 0, ContactPhase::Sustained));
    sim.tick(0.6);
    assert!(approx_eq(life_of(&sim, victim).current(), 80.0));

    sim.send_contact(ContactEvent::collision(victim, lava, 0, ContactPhase::Ended));
    sim.tick(0.6);
    assert_eq!(life_of(&sim, victim).damage_state(), DamageState::Idle);
    sim.tick(5.0);
    assert!(approx_eq(life_of(&sim, victim).current(), 80.0));
}

#[test]
fn destroy_after_hit_emitter_hits_once() {
    let mut sim = recording_sim();
    let victim = spawn_victim(&mut sim, 50.0);
    let bullet = spawn_hazard(&mut sim, DamageEmitter::instant(10.0).destroy_after_hit(true));

    sim.send_contact(ContactEvent::collision(victim, bullet, 2, ContactPhase::Began));
    sim.tick(0.1);
    assert!(approx_eq(life_of(&sim, victim).current(), 40.0));
    assert!(!sim.world().get::<DamageEmitter>(bullet).unwrap().is_emitting());
    assert!(sim.world().get::<Destroyed>(bullet).is_some());

    sim.send_contact(ContactEvent::collision(victim, bullet, 2, ContactPhase::Ended));
    sim.tick(0.1);
    sim.send_contact(ContactEvent::collision(victim, bullet, 2, ContactPhase::Began));
    sim.tick(0.1);
    assert!(approx_eq(life_of(&sim, victim).current(), 40.0));
    assert_eq!(
        sim.world().resource::<Recorded>().destroyed,
        vec![(bullet, DestroyCause::EmitterSpent)]
    );
}

#[test]
fn spent_permanence_emitter_still_ends_its_contact() {
    let mut sim = recording_sim();
    let victim = spawn_victim(&mut sim, 100.0);
    let mine = spawn_hazard(
        &mut sim,
        DamageEmitter::permanence(10.0, 1.0).destroy_after_hit(true),
    );

    sim.send_contact(ContactEvent::collision(victim, mine, 0, ContactPhase::Began));
    sim.tick(0.5);
    assert!(approx_eq(life_of(&sim, victim).current(), 90.0));
    assert!(!sim.world().get::<DamageEmitter>(mine).unwrap().is_emitting());

    sim.send_contact(ContactEvent::collision(victim, mine, 0, ContactPhase::Ended));
    sim.tick(0.5);
    assert_eq!(life_of(&sim, victim).damage_state(), DamageState::Idle);
    for _ in 0..10 {
        sim.tick(1.0);
    }
    assert!(approx_eq(life_of(&sim, victim).current(), 90.0));
}

#[test]
fn contact_ends_after_owning_state_switched_emitter_off() {
    let mut sim = recording_sim();
    let victim = spawn_victim(&mut sim, 100.0);
    let blade = sim
        .world_mut()
        .spawn(DamageEmitter::permanence(10.0, 2.0))
        .id();

    let mut fsm = Fsm::new();
    let attack = fsm.add_state(State::new("attack").with_damage_emitter(blade));
    let rest = fsm.add_state(State::new("rest"));
    let timer = fsm.add_sensor(Sensor::new("timer", SensorKind::Elapsed(ElapsedSensor::new(1.0))));
    fsm.add_transition(attack, timer, Some(rest)).unwrap();
    fsm.set_initial(attack).unwrap();
    sim.world_mut().spawn(fsm);

    sim.send_contact(ContactEvent::collision(victim, blade, 0, ContactPhase::Began));
    sim.tick(0.5);
    sim.tick(0.5);
    assert!(!sim.world().get::<DamageEmitter>(blade).unwrap().is_emitting());
    assert_eq!(life_of(&sim, victim).damage_state(), DamageState::Ticking);

    sim.send_contact(ContactEvent::collision(victim, blade, 0, ContactPhase::Ended));
    sim.tick(0.5);
    let life = life_of(&sim, victim);
    assert_eq!(life.damage_state(), DamageState::Idle);
    assert!(approx_eq(life.current(), 90.0));
    for _ in 0..10 {
        sim.tick(1.0);
    }
    assert!(approx_eq(life_of(&sim, victim).current(), 90.0));
}

#[test]
fn life_listens_to_a_sensor_on_another_entity() {
    let mut sim = recording_sim();
    let hurtbox = sim
        .world_mut()
        .spawn(DamageSensor::new().active_from_start(true))
        .id();
    let body = sim
        .world_mut()
        .spawn(Life::new(20.0, 20.0).with_sensor(hurtbox))
        .id();
    let spike = spawn_hazard(&mut sim, DamageEmitter::instant(5.0));

    sim.send_contact(ContactEvent::collision(hurtbox, spike, 0, ContactPhase::Began));
    sim.tick(0.1);
    assert!(approx_eq(life_of(&sim, body).current(), 15.0));
    assert_eq!(
        sim.world().get::<DamageSensor>(hurtbox).unwrap().subscriber_count(),
        1
    );
}

#[test]
fn sensor_added_after_its_life_still_delivers_damage() {
    let mut sim = recording_sim();
    let body = sim.world_mut().spawn(Life::new(20.0, 20.0)).id();
    let spike = spawn_hazard(&mut sim, DamageEmitter::instant(5.0));
    sim.tick(0.1);

    sim.world_mut()
        .entity_mut(body)
        .insert(DamageSensor::new().active_from_start(true));
    sim.send_contact(ContactEvent::collision(body, spike, 0, ContactPhase::Began));
    sim.tick(0.1);
    assert!(approx_eq(life_of(&sim, body).current(), 15.0));
    assert_eq!(
        sim.world().get::<DamageSensor>(body).unwrap().subscriber_count(),
        1
    );
}

#[test]
fn despawned_life_leaves_its_sensor() {
    let mut sim = recording_sim();
    let hurtbox = sim
        .world_mut()
        .spawn(DamageSensor::new().active_from_start(true))
        .id();
    let body = sim
        .world_mut()
        .spawn(Life::new(20.0, 20.0).with_sensor(hurtbox))
        .id();
    sim.tick(0.1);
    assert_eq!(
        sim.world().get::<DamageSensor>(hurtbox).unwrap().subscriber_count(),
        1
    );

    assert!(sim.world_mut().despawn(body));
    sim.tick(0.1);
    let sensor = sim.world().get::<DamageSensor>(hurtbox).unwrap();
    assert_eq!(sensor.subscriber_count(), 0);
    assert!(!sensor.is_subscribed(body));
}

#[test]
fn disarmed_sensor_ignores_contacts() {
    let mut sim = recording_sim();
    let victim = sim
        .world_mut()
        .spawn((Life::new(10.0, 10.0), DamageSensor::new()))
        .id();
    let spike = spawn_hazard(&mut sim, DamageEmitter::instant(5.0));

    sim.send_contact(ContactEvent::collision(victim, spike, 0, ContactPhase::Began));
    sim.tick(0.1);
    assert_eq!(life_of(&sim, victim).current(), 10.0);
}

#[test]
fn sensor_armed_during_contact_catches_sustained_contact() {
    let mut sim = recording_sim();
    let victim = sim
        .world_mut()
        .spawn((Life::new(10.0, 10.0), DamageSensor::new()))
        .id();
    let spike = spawn_hazard(&mut sim, DamageEmitter::instant(3.0));

    sim.send_contact(ContactEvent::collision(victim, spike, 0, ContactPhase::Began));
    sim.tick(0.1);
    sim.world_mut().get_mut::<DamageSensor>(victim).unwrap().arm();

    sim.send_contact(ContactEvent::collision(victim, spike, 0, ContactPhase::Sustained));
    sim.tick(0.1);
    assert_eq!(life_of(&sim, victim).current(), 7.0);
    sim.send_contact(ContactEvent::collision(victim, spike, 0, ContactPhase::Sustained));
    sim.tick(0.1);
    assert_eq!(life_of(&sim, victim).current(), 7.0);
}

#[test]
fn emitter_owned_by_state_only_hurts_while_state_is_current() {
    let mut sim = recording_sim();
    let victim = spawn_victim(&mut sim, 100.0);
    let blade = sim.world_mut().spawn(DamageEmitter::instant(10.0)).id();

    let mut fsm = Fsm::new();
    let attack = fsm.add_state(State::new("attack").with_damage_emitter(blade));
    let rest = fsm.add_state(State::new("rest"));
    let timer = fsm.add_sensor(Sensor::new("timer", SensorKind::Elapsed(ElapsedSensor::new(1.0))));
    fsm.add_transition(attack, timer, Some(rest)).unwrap();
    fsm.set_initial(attack).unwrap();
    sim.world_mut().spawn(fsm);

    sim.send_contact(ContactEvent::collision(victim, blade, 0, ContactPhase::Began));
    sim.tick(0.5);
    assert!(approx_eq(life_of(&sim, victim).current(), 90.0));
    assert!(sim.world().get::<DamageEmitter>(blade).unwrap().active_from_start);

    sim.send_contact(ContactEvent::collision(victim, blade, 0, ContactPhase::Ended));
    sim.tick(0.5);
    assert!(!sim.world().get::<DamageEmitter>(blade).unwrap().is_emitting());

    sim.send_contact(ContactEvent::collision(victim, blade, 0, ContactPhase::Began));
    sim.tick(0.5);
    assert!(approx_eq(life_of(&sim, victim).current(), 90.0));
}

#[test]
fn negative_dt_changes_nothing() {
    let mut sim = recording_sim();
    let victim = spawn_victim(&mut sim, 100.0);
    let lava = spawn_hazard(&mut sim, DamageEmitter::permanence(10.0, 0.1));
    sim.send_contact(ContactEvent::collision(victim, lava, 0, ContactPhase::Began));
    sim.tick(0.0);
    assert!(approx_eq(life_of(&sim, victim).current(), 90.0));
    for _ in 0..10 {
        sim.tick(-1.0);
    }
    assert!(approx_eq(life_of(&sim, victim).current(), 90.0));
    assert_eq!(sim.time().elapsed, 0.0);
}
