//! CLI entry point: bootstraps logging and config, procedurally generates the starting area,
//! places the bunny and the fox/carrot spawners, and runs the headless fixed-timestep loop until
//! interrupted. Ground truth: `bunny/game.py::Game.__init__`/`onStartGameCommand`,
//! `bunny/gen.py::GenerateWorld`.

use std::io::Write as _;
use std::path::PathBuf;
use std::rc::Rc;

use clap::{App, Arg};
use common::{SeedableRng, SmallRng};
use event::{Event, EventBus, Subscriber};
use simulation::{GameLoop, PlayerController, Simulation, Spawner};
use slog_scope::info;
use world::{Entity, World};

/// Matches `shared/config`'s own `Default` impls; written out to a temp file on startup so the
/// hot-reload watcher has a concrete path to follow, same as any config the player hands in
/// with `--config`.
const DEFAULT_CONFIG: &str = r#"(
    simulation: (
        input_period: 0.05,
        physics_period: 0.05,
        physics_runs_max: 10,
        frame_period: 0.0166666,
        fox_spawn_period: 3.0,
        carrot_spawn_period: 10.0,
    ),
    world: (
        width: 64,
        height: 64,
        obstacle_density: 0.2,
        seed: None,
    ),
)"#;

fn log_time(out: &mut dyn std::io::Write) -> std::io::Result<()> {
    write!(out, "{:?}", std::time::SystemTime::now())
}

fn main() {
    let args = App::new(env!("CARGO_PKG_NAME"))
        .about("Apocalypse Bunny: headless simulation core")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .help("Path to a RON config file; a built-in default is used if omitted")
                .takes_value(true),
        )
        .get_matches();

    let _logging = logging::LoggerBuilder::with_env()
        .and_then(|builder| builder.init(log_time, || 0))
        .expect("failed to initialise logging");

    let config_path = match args.value_of("config") {
        Some(path) => PathBuf::from(path),
        None => {
            let path = std::env::temp_dir().join("apocalypse-bunny-default-config.ron");
            std::fs::write(&path, DEFAULT_CONFIG).expect("failed to write default config");
            path
        }
    };
    if let Err(e) = config::init(&config_path) {
        eprintln!("failed to load config from {:?}: {}", config_path, e);
        std::process::exit(1);
    }

    let bus = EventBus::new();

    let (world, area_id, fox_coords, carrot_coords) = generate_world(&bus);

    let player = PlayerController::new(bus.clone());
    let game_loop = GameLoop::new(bus.clone());

    let mut sim_seed_rng = seeded_rng();
    // A second, independently-seeded stream for AI/spawner randomness, so the terrain layout and
    // the runtime's random decisions don't share one RNG's position in its sequence.
    let sim_rng = SmallRng::from_rng(&mut sim_seed_rng).expect("failed to derive simulation rng");

    let fox_period = config::get().simulation.fox_spawn_period;
    let carrot_period = config::get().simulation.carrot_spawn_period;
    let spawners = vec![
        Spawner::new(area_id, fox_coords, Entity::zombie_fox, fox_period),
        Spawner::new(area_id, carrot_coords, Entity::carrot, carrot_period),
    ];

    let simulation = Simulation::new(bus.clone(), world, player.clone(), spawners, sim_rng);

    let player_dyn: Rc<dyn Subscriber> = player.clone();
    let game_loop_dyn: Rc<dyn Subscriber> = game_loop.clone();
    let simulation_dyn: Rc<dyn Subscriber> = simulation.clone();
    bus.register(&player_dyn).expect("failed to register player controller");
    bus.register(&game_loop_dyn).expect("failed to register game loop");
    bus.register(&simulation_dyn).expect("failed to register simulation");

    let (bunny_id, _) = {
        let world = simulation.world();
        let bunny_id = world.entities().find(|e| matches!(e.kind, world::EntityKind::Bunny { .. })).map(|e| e.id);
        (bunny_id, ())
    };
    if let Some(bunny_id) = bunny_id {
        bus.post(Event::ControlEntity { entity_id: bunny_id });
        bus.post(Event::ViewArea { area_id });
    }
    bus.post(Event::PausePhysicsRequest { paused: false });
    bus.pump();

    install_ctrlc_handler(game_loop.interrupt_flag());

    info!("running"; "area" => %area_id);
    game_loop.run();
    info!("exiting cleanly");
}

/// Generates the single starting area's terrain, places the bunny at the origin, and returns the
/// set of walkable coordinates the fox/carrot spawners are allowed to use. Ground truth:
/// `bunny/gen.py::GenerateWorld`.
fn generate_world(bus: &Rc<EventBus>) -> (World, common::AreaId, Vec<(i32, i32)>, Vec<(i32, i32)>) {
    let cfg = config::get();
    let (width, height, obstacle_density, seed) =
        (cfg.world.width, cfg.world.height, cfg.world.obstacle_density, cfg.world.seed);
    drop(cfg);

    let mut terrain_rng = match seed {
        Some(s) => SmallRng::seed_from_u64(s),
        None => SmallRng::from_entropy(),
    };

    let mut world = World::new();
    let area_id = world.create_area();

    let terrain = procgen::generate_terrain(width, height, obstacle_density, &mut terrain_rng);
    if let Some(area) = world.area_mut(area_id) {
        area.tiles = terrain.tiles;
    }

    let mut walkable: Vec<(i32, i32)> = terrain.walkable.into_iter().collect();
    walkable.sort_unstable();

    let bunny_id = world.create_entity(Entity::bunny, bus);
    world
        .move_entity_to_area(bunny_id, Some(area_id), bus)
        .expect("freshly created area must accept the bunny");

    (world, area_id, walkable.clone(), walkable)
}

fn seeded_rng() -> SmallRng {
    match config::get().world.seed {
        Some(s) => SmallRng::seed_from_u64(s),
        None => SmallRng::from_entropy(),
    }
}

/// Sets an atomic flag on SIGINT that [`simulation::GameLoop::run`] polls once per iteration on
/// its own thread, so the loop (and this process) exits with code 0 rather than being killed
/// outright. The flag is plain `Arc<AtomicBool>`, genuinely `Send`/`Sync` — unlike the bus, which
/// is `Rc`/`RefCell`-based and single-threaded by design (§5), so the signal thread never touches
/// it directly.
fn install_ctrlc_handler(interrupted: std::sync::Arc<std::sync::atomic::AtomicBool>) {
    ctrlc::set_handler(move || {
        interrupted.store(true, std::sync::atomic::Ordering::Relaxed);
    })
    .expect("failed to install ctrl-c handler");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let parsed: Result<config::Config, _> = ron::de::from_str(DEFAULT_CONFIG);
        assert!(parsed.is_ok());
    }
}
