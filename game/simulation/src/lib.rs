//! Everything that turns a bare [`World`](world::World) into a running game: the fixed-timestep
//! loop, keyboard-to-command-to-entity input translation, and the creature/item/spawner rules
//! that make the world move. Grounded in `infiniworld/controllers/loop.py`,
//! `infiniworld/controllers/{keyboard,player}.py`, `bunny/controllers/keyboard.py` and
//! `bunny/world.py`.

mod gameloop;
mod input;
mod rules;

pub use gameloop::GameLoop;
pub use input::{KeyboardController, PlayerController};
pub use rules::{Simulation, Spawner};
