use std::collections::{HashMap, HashSet};

use common::{EntityId, Vector2};

/// A chunk covers `scale x scale` tiles. Ground truth: `entitymap.py::chunkCoordAt`, same
/// half-integer boundary rule as tile coordinates, just scaled.
pub const CHUNK_SCALE: f32 = 8.0;

pub fn chunk_coord_at(pos: Vector2, scale: f32) -> (i32, i32) {
    let x = (0.5 + pos.x / scale).floor() as i32;
    let y = (0.5 + pos.y / scale).floor() as i32;
    (x, y)
}

fn chunk_coords_around(pos: Vector2, radius: f32, scale: f32) -> (i32, i32, i32, i32) {
    let x_min = (pos.x - radius) / scale;
    let x_max = (pos.x + radius) / scale;
    let y_min = (pos.y - radius) / scale;
    let y_max = (pos.y + radius) / scale;

    let cx_min = -((0.5 - x_min).floor() as i32);
    let cx_max = (0.5 + x_max).floor() as i32;
    let cy_min = -((0.5 - y_min).floor() as i32);
    let cy_max = (0.5 + y_max).floor() as i32;
    (cx_min, cx_max, cy_min, cy_max)
}

/// Spatial index of which chunk every entity in an [`Area`](crate::Area) currently occupies, used
/// to prune collision and proximity queries. Ground truth: `entitymap.py::EntityMap`. Uses plain
/// strong references (a `HashSet<EntityId>`, not a weak-entity set) per the source's own
/// performance note: `getNear` is hot and a weak-ref-backed set measurably slower. Empty chunks
/// are pruned eagerly.
#[derive(Clone, Debug, Default)]
pub struct EntityMap {
    chunks: HashMap<(i32, i32), HashSet<EntityId>>,
    coords: HashMap<EntityId, (i32, i32)>,
}

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entity` at `pos`. Does not remove it from any previous chunk; use [`Self::mov`] for
    /// that.
    pub fn add(&mut self, entity: EntityId, pos: Vector2) {
        let coord = chunk_coord_at(pos, CHUNK_SCALE);
        self.chunks.entry(coord).or_default().insert(entity);
        self.coords.insert(entity, coord);
    }

    pub fn remove(&mut self, entity: EntityId) {
        if let Some(coord) = self.coords.remove(&entity) {
            if let Some(set) = self.chunks.get_mut(&coord) {
                set.remove(&entity);
                if set.is_empty() {
                    self.chunks.remove(&coord);
                }
            }
        }
    }

    /// Re-files `entity` into the chunk matching its (already-updated) `pos`. Must be called
    /// after the entity's position has changed.
    pub fn mov(&mut self, entity: EntityId, pos: Vector2) {
        let new_coord = chunk_coord_at(pos, CHUNK_SCALE);
        let old_coord = self.coords.get(&entity).copied();
        if old_coord == Some(new_coord) {
            return;
        }
        if let Some(old_coord) = old_coord {
            if let Some(set) = self.chunks.get_mut(&old_coord) {
                set.remove(&entity);
                if set.is_empty() {
                    self.chunks.remove(&old_coord);
                }
            }
        }
        self.chunks.entry(new_coord).or_default().insert(entity);
        self.coords.insert(entity, new_coord);
    }

    /// All entities within the square of half-side `radius` centered on `pos`, chunk-pruned (not
    /// an exact circular query — callers filter further if they need one).
    pub fn get_near(&self, pos: Vector2, radius: f32) -> HashSet<EntityId> {
        let (x_min, x_max, y_min, y_max) = chunk_coords_around(pos, radius, CHUNK_SCALE);
        let mut result = HashSet::new();
        for x in x_min..=x_max {
            for y in y_min..=y_max {
                if let Some(set) = self.chunks.get(&(x, y)) {
                    result.extend(set.iter().copied());
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_get_near() {
        let mut map = EntityMap::new();
        map.add(EntityId(1), Vector2::new(0.0, 0.0));
        map.add(EntityId(2), Vector2::new(100.0, 100.0));

        let near = map.get_near(Vector2::new(0.0, 0.0), 1.0);
        assert!(near.contains(&EntityId(1)));
        assert!(!near.contains(&EntityId(2)));
    }

    #[test]
    fn move_reindexes_and_prunes_empty_chunks() {
        let mut map = EntityMap::new();
        map.add(EntityId(1), Vector2::new(0.0, 0.0));
        map.mov(EntityId(1), Vector2::new(100.0, 100.0));

        assert!(map.get_near(Vector2::new(0.0, 0.0), 1.0).is_empty());
        assert!(map
            .get_near(Vector2::new(100.0, 100.0), 1.0)
            .contains(&EntityId(1)));
        assert!(map.chunks.is_empty() == false); // only the new chunk remains
        assert_eq!(map.chunks.len(), 1);
    }

    #[test]
    fn remove_prunes_empty_chunk() {
        let mut map = EntityMap::new();
        map.add(EntityId(1), Vector2::new(0.0, 0.0));
        map.remove(EntityId(1));
        assert!(map.chunks.is_empty());
        assert!(map.coords.is_empty());
    }
}
