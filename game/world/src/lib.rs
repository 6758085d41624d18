//! Tiles, materials, entities, areas and the world that owns them, plus the chunk-based spatial
//! index and the detection-correction collision cycle that drives per-area physics. Grounded in
//! `infiniworld/models/{area.py,entity.py,entitymap.py,world.py}` and `world/tile.py`.

mod area;
mod entity;
mod entitymap;
mod tile;
mod world;

use common::{AreaId, EntityId, Error};

pub use area::{Area, AreaStepResult};
pub use entity::{CreatureState, Entity, EntityFactory, EntityKind};
pub use entitymap::{chunk_coord_at, EntityMap, CHUNK_SCALE};
pub use tile::{tile_coord_at, tile_coords_around, Tile, TileMap};
pub use world::World;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
    #[error("area {0} not found")]
    AreaNotFound(AreaId),
    #[error("entity {0} is already in that area")]
    AlreadyInArea(EntityId),
    #[error("entity {0} is not in that area")]
    NotInArea(EntityId),
}
