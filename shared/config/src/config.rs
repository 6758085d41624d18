use serde::Deserialize;

#[derive(Deserialize)]
#[serde(default)]
pub struct Config {
    pub world: World,
    pub simulation: Simulation,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct World {
    pub width: u32,
    pub height: u32,
    /// Probability that a freshly planted/grown tile is solid (height 1).
    pub obstacle_density: f32,
    /// `None` seeds the generator from OS entropy.
    pub seed: Option<u64>,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct Simulation {
    pub input_period: f32,
    pub physics_period: f32,
    pub physics_runs_max: u32,
    pub frame_period: f32,
    pub fox_spawn_period: f32,
    pub carrot_spawn_period: f32,
}

impl Default for World {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            obstacle_density: 0.2,
            seed: None,
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            input_period: 1.0 / 20.0,
            physics_period: 1.0 / 20.0,
            physics_runs_max: 10,
            frame_period: 1.0 / 60.0,
            fox_spawn_period: 3.0,
            carrot_spawn_period: 10.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: World::default(),
            simulation: Simulation::default(),
        }
    }
}
