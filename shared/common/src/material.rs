use crate::F;

/// `{friction, eff_n, eff_t}` as in `infiniworld/models/materials.py`. `friction` is a
/// non-positive kinetic-friction coefficient (negative slows bodies down); `eff_n`/`eff_t` in
/// `[0,1]` attenuate a body's normal/tangential velocity after an elastic collision.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub friction: F,
    pub eff_n: F,
    pub eff_t: F,
}

impl Material {
    pub const STONE: Material = Material {
        friction: -4.0,
        eff_n: 0.9,
        eff_t: 1.0,
    };
    pub const DIRT: Material = Material {
        friction: -5.0,
        eff_n: 0.8,
        eff_t: 1.0,
    };
    pub const GRASS: Material = Material {
        friction: -6.0,
        eff_n: 0.3,
        eff_t: 1.0,
    };
    pub const SAND: Material = Material {
        friction: -6.0,
        eff_n: 0.1,
        eff_t: 1.0,
    };
    pub const SHALLOW_WATER: Material = Material {
        friction: -8.0,
        eff_n: 0.0,
        eff_t: 1.0,
    };
    pub const DEEP_WATER: Material = Material {
        friction: -10.0,
        eff_n: 0.0,
        eff_t: 1.0,
    };
    pub const RUBBER: Material = Material {
        friction: -5.0,
        eff_n: 1.0,
        eff_t: 1.0,
    };
    pub const FLESH: Material = Material {
        friction: -5.0,
        eff_n: 0.7,
        eff_t: 1.0,
    };
}

/// A tile's surface. The world generator never emits [`TileNature::Rubber`] — it is not a
/// variant here at all, unlike the Python source where tile natures and body materials share
/// one namespace; bodies that need rubber/flesh reach [`Material::RUBBER`]/[`Material::FLESH`]
/// directly instead.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TileNature {
    Stone,
    Dirt,
    Grass,
    Sand,
    ShallowWater,
    DeepWater,
}

impl TileNature {
    pub const ALL: [TileNature; 6] = [
        TileNature::Stone,
        TileNature::Dirt,
        TileNature::Grass,
        TileNature::Sand,
        TileNature::ShallowWater,
        TileNature::DeepWater,
    ];

    pub fn material(self) -> Material {
        match self {
            TileNature::Stone => Material::STONE,
            TileNature::Dirt => Material::DIRT,
            TileNature::Grass => Material::GRASS,
            TileNature::Sand => Material::SAND,
            TileNature::ShallowWater => Material::SHALLOW_WATER,
            TileNature::DeepWater => Material::DEEP_WATER,
        }
    }
}
