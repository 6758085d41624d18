use std::collections::HashMap;

use common::{floor_half, Material, TileMapSummary, TileNature, Vector2};

/// One 1x1m square of landscape. `height` 1 is solid/unwalkable; 0 is floor. Ground truth:
/// `world/tile.py::Tile`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tile {
    pub nature: TileNature,
    pub height: u8,
}

impl Tile {
    pub fn new(nature: TileNature, height: u8) -> Self {
        Self { nature, height }
    }

    pub fn is_solid(&self) -> bool {
        self.height == 1
    }

    pub fn material(&self) -> Material {
        self.nature.material()
    }
}

/// Sparse tile grid, `(0,0)` centered on world position `(0,0)`.
#[derive(Clone, Debug, Default)]
pub struct TileMap {
    pub tiles: HashMap<(i32, i32), Tile>,
}

impl TileMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> TileMapSummary {
        self.tiles
            .iter()
            .map(|(&coord, tile)| (coord, (tile.nature, tile.height)))
            .collect()
    }
}

/// `floor(0.5 + p)` componentwise: the tile a world position lies in. Ground truth:
/// `area.py::tileCoordAt`.
pub fn tile_coord_at(pos: Vector2) -> (i32, i32) {
    (floor_half(pos.x), floor_half(pos.y))
}

/// The rectangle of tile coordinates that must be checked for collisions with a circle of the
/// given `radius` centered at `pos`. Ground truth: `area.py::tileCoordsAround`.
pub fn tile_coords_around(pos: Vector2, radius: f32) -> (i32, i32, i32, i32) {
    let x_min = pos.x - radius;
    let x_max = pos.x + radius;
    let y_min = pos.y - radius;
    let y_max = pos.y + radius;

    let tile_x_min = -((0.5 - x_min).floor() as i32);
    let tile_x_max = (0.5 + x_max).floor() as i32;
    let tile_y_min = -((0.5 - y_min).floor() as i32);
    let tile_y_max = (0.5 + y_max).floor() as i32;

    (tile_x_min, tile_x_max, tile_y_min, tile_y_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_coord_boundary_rule() {
        assert_eq!(tile_coord_at(Vector2::new(-0.5, 0.0)), (0, 0));
        assert_eq!(tile_coord_at(Vector2::new(0.5, 0.0)), (1, 0));
        assert_eq!(tile_coord_at(Vector2::new(0.0, 0.0)), (0, 0));
    }

    #[test]
    fn tile_coords_around_covers_radius() {
        let (x_min, x_max, y_min, y_max) = tile_coords_around(Vector2::new(0.0, 0.0), 0.5);
        assert_eq!((x_min, x_max, y_min, y_max), (0, 0, 0, 0));

        let (x_min, x_max, _, _) = tile_coords_around(Vector2::new(0.0, 0.0), 1.0);
        assert_eq!((x_min, x_max), (-1, 1));
    }
}
