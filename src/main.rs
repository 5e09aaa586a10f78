//! Aberred Behavior headless demo.
//!
//! Builds a small arena and runs it without a window:
//! - a **player** walking right, with a Life and a damage sensor
//! - a **guard** walking a waypoint route until the player comes close, then chasing it
//!   and hurting it on contact (permanence damage)
//! - a **turret** alternating between idle and firing; bullets aim at the
//!   player, hit once and are destroyed
//!
//! Contacts come from a naive circle-overlap pass standing in for a physics
//! engine. State changes, life changes and destructions are logged by
//! observers.
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run -- --frames 900 --dt 0.016
//! ```

use std::path::PathBuf;

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use clap::Parser;
use glam::Vec2;
use log::{error, info, warn};
use rustc_hash::FxHashSet;

use aberredbehavior::actuators::directional::DirectionalActuator;
use aberredbehavior::actuators::easing::Easing;
use aberredbehavior::actuators::horizontal::{Direction, HorizontalActuator};
use aberredbehavior::actuators::patrol::{PatrolActuator, Waypoint};
use aberredbehavior::actuators::spawner::{SpawnPoint, SpawnerActuator};
use aberredbehavior::actuators::CollisionReaction;
use aberredbehavior::components::damageemitter::DamageEmitter;
use aberredbehavior::components::damagesensor::DamageSensor;
use aberredbehavior::components::fsm::Fsm;
use aberredbehavior::components::life::Life;
use aberredbehavior::components::mapposition::MapPosition;
use aberredbehavior::components::rigidbody::RigidBody;
use aberredbehavior::components::sensor::Sensor;
use aberredbehavior::components::sensorkind::{
    DetectionCondition, DistanceSensor, ElapsedSensor, SensorKind,
};
use aberredbehavior::components::state::{AuthoringError, State};
use aberredbehavior::events::contact::{ContactEvent, ContactPhase};
use aberredbehavior::events::life::{EntityDestroyedEvent, LifeChangedEvent};
use aberredbehavior::events::spawn::SpawnRequest;
use aberredbehavior::events::statechange::StateChangeEvent;
use aberredbehavior::resources::simconfig::SimConfig;
use aberredbehavior::simulation::Simulation;

const LAYER_PLAYER: u32 = 0;
const LAYER_ENEMY: u32 = 1;
const LAYER_BULLET: u32 = 2;

/// Aberred Behavior headless demo
#[derive(Parser)]
#[command(version, about = "Runs the behavior demo arena without a window.")]
struct Cli {
    /// INI configuration file (default: ./behavior.ini).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of frames to simulate (overrides the configuration).
    #[arg(long)]
    frames: Option<u32>,

    /// Fixed frame delta in seconds (overrides the configuration).
    #[arg(long)]
    dt: Option<f32>,

    /// Log sensor and state activity of every FSM.
    #[arg(long)]
    debug: bool,

    /// Write the effective configuration back to the INI file and exit.
    #[arg(long)]
    save_config: bool,
}

/// Circle used by the demo's overlap pass.
#[derive(Component, Debug, Clone, Copy)]
struct Hitbox {
    radius: f32,
    layer: u32,
}

#[derive(Component)]
struct Player;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(path) => SimConfig::with_path(path),
        None => SimConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        warn!("{}; using defaults", e);
    }
    if let Some(frames) = cli.frames {
        config.frames = frames;
    }
    if let Some(dt) = cli.dt {
        config.fixed_dt = dt.max(0.0);
    }
    config.debug |= cli.debug;

    if cli.save_config {
        match config.save_to_file() {
            Ok(()) => info!("Configuration written to {}", config.config_path.display()),
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let frames = config.frames;
    let dt = config.fixed_dt;
    let mut sim = Simulation::new(config);
    register_log_observers(sim.world_mut());

    let player = match build_scene(sim.world_mut()) {
        Ok(player) => player,
        Err(e) => {
            error!("Failed to build the demo scene: {}", e);
            std::process::exit(1);
        }
    };

    info!("Running {} frames of {:.4}s", frames, dt);
    let mut overlaps: FxHashSet<(Entity, Entity)> = FxHashSet::default();
    for _ in 0..frames {
        for contact in detect_contacts(sim.world_mut(), &mut overlaps) {
            sim.send_contact(contact);
        }
        sim.tick(dt);
        for request in sim.take_spawn_requests() {
            spawn_from_template(sim.world_mut(), &request, player);
        }
        let alive = sim
            .world()
            .get::<Life>(player)
            .is_some_and(|life| !life.is_dead());
        if !alive {
            info!("Player is down after {} frames", sim.time().frame_count);
            break;
        }
    }

    let time = sim.time();
    let life = sim.world().get::<Life>(player).map(|l| l.current());
    info!(
        "Simulated {:.2}s over {} frames; player life: {:?}",
        time.elapsed, time.frame_count, life
    );
}

fn register_log_observers(world: &mut World) {
    world.add_observer(|trigger: On<StateChangeEvent>| {
        let ev = trigger.event();
        info!("[state] {:?}: {} -> {}", ev.entity, ev.from_name, ev.to_name);
    });
    world.add_observer(|trigger: On<LifeChangedEvent>| {
        let ev = trigger.event();
        info!(
            "[life] {:?}: {:.1} -> {:.1} / {:.1}",
            ev.entity, ev.previous, ev.current, ev.max
        );
    });
    world.add_observer(|trigger: On<EntityDestroyedEvent>| {
        let ev = trigger.event();
        info!("[destroyed] {:?} ({:?})", ev.entity, ev.cause);
    });
    world.flush();
}

fn build_scene(world: &mut World) -> Result<Entity, AuthoringError> {
    let player = world
        .spawn((
            Player,
            MapPosition::new(-120.0, 0.0),
            RigidBody::with_velocity(Vec2::new(12.0, 0.0)),
            Hitbox {
                radius: 6.0,
                layer: LAYER_PLAYER,
            },
            Life::new(100.0, 100.0),
            DamageSensor::new().active_from_start(true),
        ))
        .id();

    // Guard: walks its route, chases when the player is within 40 units, gives up past 70.
    let guard = world.spawn_empty().id();
    let mut fsm = Fsm::new();
    let patrol = fsm.add_state(
        State::new("patrol")
            .with_actuator(
                PatrolActuator::waypoints(vec![
                    Waypoint::new(Vec2::new(-30.0, 0.0), 3.0)
                        .eased(Easing::QuadInOut)
                        .dwelling(0.5),
                    Waypoint::new(Vec2::new(20.0, 0.0), 4.0).eased(Easing::QuadInOut),
                ])
                .looping(true),
            )
            .with_debug(true),
    );
    let chase = fsm.add_state(
        State::new("chase")
            .with_actuator(HorizontalActuator::new(16.0, Direction::Left).following(player, 2.0))
            .with_damage_emitter(guard),
    );
    let near = fsm.add_sensor(Sensor::new(
        "player_near",
        SensorKind::Distance(DistanceSensor::new(Some(player), 40.0)),
    ));
    let far = fsm.add_sensor(Sensor::new(
        "player_far",
        SensorKind::Distance(
            DistanceSensor::new(Some(player), 70.0).with_condition(DetectionCondition::Outside),
        ),
    ));
    fsm.add_transition(patrol, near, Some(chase))?;
    fsm.add_transition(chase, far, Some(patrol))?;
    fsm.set_initial(patrol)?;
    world.entity_mut(guard).insert((
        fsm,
        MapPosition::new(0.0, 0.0),
        RigidBody::new(),
        Hitbox {
            radius: 8.0,
            layer: LAYER_ENEMY,
        },
        DamageEmitter::permanence(4.0, 0.5),
    ));

    // Turret: idles two seconds, then fires three bullets half a second apart.
    let turret = world.spawn_empty().id();
    let mut fsm = Fsm::new();
    let idle = fsm.add_state(State::new("idle"));
    let firing = fsm.add_state(
        State::new("firing").with_actuator(
            SpawnerActuator::new(0.5)
                .with_point(SpawnPoint::new("bullet", Vec2::new(0.0, -10.0)))
                .limited(3),
        ),
    );
    let rest = fsm.add_sensor(Sensor::new("rest", SensorKind::Elapsed(ElapsedSensor::new(2.0))));
    let burst = fsm.add_sensor(Sensor::new("burst", SensorKind::Elapsed(ElapsedSensor::new(1.6))));
    fsm.add_transition(idle, rest, Some(firing))?;
    fsm.add_transition(firing, burst, Some(idle))?;
    fsm.set_initial(idle)?;
    world.entity_mut(turret).insert((fsm, MapPosition::new(40.0, 60.0)));

    Ok(player)
}

/// Build the entity named by a spawn request. Only `bullet` is known.
fn spawn_from_template(world: &mut World, request: &SpawnRequest, player: Entity) {
    if request.template != "bullet" {
        warn!("Unknown spawn template '{}'", request.template);
        return;
    }
    let bullet = world.spawn_empty().id();
    let mut fsm = Fsm::new();
    let flying = fsm.add_state(
        State::new("flying")
            .with_actuator(
                DirectionalActuator::new(60.0, 0.0)
                    .aiming_at(player)
                    .on_collision(CollisionReaction::Destroy, 1 << LAYER_PLAYER),
            )
            .with_damage_emitter(bullet),
    );
    let spent = fsm.add_state(State::new("spent").with_actuator(DirectionalActuator::new(0.0, 0.0)));
    let timeout = fsm.add_sensor(Sensor::new("timeout", SensorKind::Elapsed(ElapsedSensor::new(3.0))));
    let wired = fsm
        .add_transition(flying, timeout, Some(spent))
        .and_then(|_| fsm.set_initial(flying));
    if let Err(e) = wired {
        error!("Bullet FSM for {:?}: {}", request.spawner, e);
        world.entity_mut(bullet).despawn();
        return;
    }
    world.entity_mut(bullet).insert((
        fsm,
        MapPosition::from_vec(request.position),
        RigidBody::new(),
        Hitbox {
            radius: 2.0,
            layer: LAYER_BULLET,
        },
        DamageEmitter::instant(15.0).destroy_after_hit(true),
    ));
}

/// Naive O(n²) circle overlap standing in for a physics engine.
///
/// Reports each overlapping pair in both directions, with `Began` on the
/// first frame, `Sustained` after and `Ended` once they separate.
fn detect_contacts(
    world: &mut World,
    overlaps: &mut FxHashSet<(Entity, Entity)>,
) -> Vec<ContactEvent> {
    let mut query = world.query::<(Entity, &MapPosition, &Hitbox)>();
    let bodies: Vec<(Entity, Vec2, Hitbox)> = query
        .iter(world)
        .map(|(e, p, h)| (e, p.pos, *h))
        .collect();

    let mut current: FxHashSet<(Entity, Entity)> = FxHashSet::default();
    let mut contacts = Vec::new();
    for (i, (a, pos_a, box_a)) in bodies.iter().enumerate() {
        for (b, pos_b, box_b) in bodies.iter().skip(i + 1) {
            if pos_a.distance(*pos_b) > box_a.radius + box_b.radius {
                continue;
            }
            current.insert((*a, *b));
            let phase = if overlaps.contains(&(*a, *b)) {
                ContactPhase::Sustained
            } else {
                ContactPhase::Began
            };
            let normal = (*pos_a - *pos_b).normalize_or_zero();
            contacts.push(ContactEvent::collision(*a, *b, box_b.layer, phase).with_normal(normal));
            contacts.push(ContactEvent::collision(*b, *a, box_a.layer, phase).with_normal(-normal));
        }
    }

    for (a, b) in overlaps.difference(&current) {
        let layer_of = |e: Entity| {
            bodies
                .iter()
                .find(|(other, _, _)| *other == e)
                .map(|(_, _, h)| h.layer)
                .unwrap_or(0)
        };
        contacts.push(ContactEvent::collision(*a, *b, layer_of(*b), ContactPhase::Ended));
        contacts.push(ContactEvent::collision(*b, *a, layer_of(*a), ContactPhase::Ended));
    }
    *overlaps = current;
    contacts
}
