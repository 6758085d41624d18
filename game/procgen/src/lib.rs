//! Seeded region-growing tile layout generator. Ground truth: `bunny/gen.py::
//! GenerateInterestingTileMap`/`GenerateWorld`. The teacher's own `game/procgen` member
//! implements an unrelated noise/climate-layered 3D terrain algorithm (and pulls in `noise`,
//! `geo`, `tokio`, `image`...) and was dropped entirely in favour of this flat 8-neighbourhood
//! region grower, which is what the source actually does.

use std::collections::{HashMap, HashSet};

use common::{Rng, SmallRng, TileNature};
use slog_scope::debug;
use world::{Tile, TileMap};

/// The result of generating a tile layout: the tiles themselves, plus the set of walkable
/// (`height == 0`) coordinates, which `GenerateWorld` in the source hands to the fox/carrot
/// spawners as their legal spawn set.
pub struct GeneratedTerrain {
    pub tiles: TileMap,
    pub walkable: HashSet<(i32, i32)>,
}

/// Plants `⌊w·h/100⌋` seeds at random unique coordinates within a rectangle centered on the
/// origin, each given a random nature (never [`TileNature::ALL`]'s rubber-equivalent — there is
/// none, see `common::material`) and a height sampled against `obstacle_density`. Grows each seed
/// into its available 8-neighbourhood, assigning new cells the parent's nature and a freshly
/// sampled height, until every coordinate in the bounded rectangle has been claimed. Finally
/// forces the central 3x3 block to height 0 and the rectangle's border to height 1.
pub fn generate_terrain(width: u32, height: u32, obstacle_density: f32, rng: &mut SmallRng) -> GeneratedTerrain {
    let min_x = -(width as i32) / 2;
    let max_x = min_x + width as i32 - 1;
    let min_y = -(height as i32) / 2;
    let max_y = min_y + height as i32 - 1;

    let mut available: HashSet<(i32, i32)> = (min_x..=max_x)
        .flat_map(|x| (min_y..=max_y).map(move |y| (x, y)))
        .collect();

    let mut tiles: HashMap<(i32, i32), Tile> = HashMap::new();
    let mut seeds: HashSet<(i32, i32)> = HashSet::new();

    let seed_count = (width as u64 * height as u64 / 100) as usize;
    let available_vec: Vec<(i32, i32)> = {
        let mut v: Vec<(i32, i32)> = available.iter().copied().collect();
        v.sort_unstable();
        v
    };
    let mut pickable = available_vec;

    for _ in 0..seed_count.min(pickable.len()) {
        let idx = rng.gen_range(0, pickable.len());
        let coord = pickable.swap_remove(idx);
        available.remove(&coord);
        seeds.insert(coord);

        let nature = TileNature::ALL[rng.gen_range(0, TileNature::ALL.len())];
        let height = if rng.gen::<f32>() < obstacle_density { 1 } else { 0 };
        tiles.insert(coord, Tile::new(nature, height));
    }

    while !available.is_empty() {
        let wave: Vec<(i32, i32)> = {
            let mut v: Vec<(i32, i32)> = seeds.drain().collect();
            v.sort_unstable();
            v
        };
        for seed in wave {
            let nature = tiles[&seed].nature;
            let neighbours = [
                (seed.0 - 1, seed.1 - 1),
                (seed.0, seed.1 - 1),
                (seed.0 + 1, seed.1 - 1),
                (seed.0 - 1, seed.1),
                (seed.0 + 1, seed.1),
                (seed.0 - 1, seed.1 + 1),
                (seed.0, seed.1 + 1),
                (seed.0 + 1, seed.1 + 1),
            ];
            for coord in neighbours {
                if available.remove(&coord) {
                    let height = if rng.gen::<f32>() < obstacle_density { 1 } else { 0 };
                    tiles.insert(coord, Tile::new(nature, height));
                    seeds.insert(coord);
                }
            }
        }
    }

    for x in -1..=1 {
        for y in -1..=1 {
            if let Some(tile) = tiles.get_mut(&(x, y)) {
                tile.height = 0;
            }
        }
    }
    for x in min_x..=max_x {
        if let Some(t) = tiles.get_mut(&(x, min_y)) {
            t.height = 1;
        }
        if let Some(t) = tiles.get_mut(&(x, max_y)) {
            t.height = 1;
        }
    }
    for y in min_y..=max_y {
        if let Some(t) = tiles.get_mut(&(min_x, y)) {
            t.height = 1;
        }
        if let Some(t) = tiles.get_mut(&(max_x, y)) {
            t.height = 1;
        }
    }

    let walkable = tiles
        .iter()
        .filter(|(_, t)| t.height == 0)
        .map(|(&coord, _)| coord)
        .collect();

    debug!("generated terrain"; "tiles" => tiles.len(), "walkable" => walkable.len());

    let mut map = TileMap::new();
    map.tiles = tiles;
    GeneratedTerrain { tiles: map, walkable }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::SeedableRng;

    #[test]
    fn center_is_always_walkable() {
        let mut rng = SmallRng::seed_from_u64(0);
        let terrain = generate_terrain(64, 64, 0.2, &mut rng);
        for x in -1..=1 {
            for y in -1..=1 {
                let tile = terrain.tiles.tiles.get(&(x, y)).expect("center tile present");
                assert_eq!(tile.height, 0);
            }
        }
    }

    #[test]
    fn border_is_always_solid() {
        let mut rng = SmallRng::seed_from_u64(0);
        let terrain = generate_terrain(64, 64, 0.2, &mut rng);
        let min_x = -32;
        let max_x = min_x + 63;
        let min_y = -32;
        let max_y = min_y + 63;
        for x in min_x..=max_x {
            assert_eq!(terrain.tiles.tiles[&(x, min_y)].height, 1);
            assert_eq!(terrain.tiles.tiles[&(x, max_y)].height, 1);
        }
        for y in min_y..=max_y {
            assert_eq!(terrain.tiles.tiles[&(min_x, y)].height, 1);
            assert_eq!(terrain.tiles.tiles[&(max_x, y)].height, 1);
        }
    }

    #[test]
    fn deterministic_given_same_seed() {
        let mut rng_a = SmallRng::seed_from_u64(42);
        let mut rng_b = SmallRng::seed_from_u64(42);
        let a = generate_terrain(32, 32, 0.3, &mut rng_a);
        let b = generate_terrain(32, 32, 0.3, &mut rng_b);
        assert_eq!(a.tiles.tiles, b.tiles.tiles);
        assert_eq!(a.walkable, b.walkable);
    }

    #[test]
    fn every_coordinate_in_bounds_is_claimed() {
        let mut rng = SmallRng::seed_from_u64(7);
        let terrain = generate_terrain(16, 16, 0.2, &mut rng);
        assert_eq!(terrain.tiles.tiles.len(), 16 * 16);
    }
}
