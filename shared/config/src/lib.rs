mod config;
mod load;

pub use config::{Config, Simulation, World};
pub use load::{get, init, load_time, ConfigError};
