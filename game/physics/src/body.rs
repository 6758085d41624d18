use common::{Material, SmallVec, Vector2};

use crate::force::Force;
use crate::rk4::rk4;

/// `{mass, one_over_mass, pos, vel, solid, material, forces}`, per `infiniworld/physics.py`'s
/// `Particle`/`Body`. Mass may be `f32::INFINITY`; `one_over_mass` is precomputed to 0 in that
/// case (storing the reciprocal, rather than dividing by mass every step, is how the source
/// forbids massless bodies while still accepting infinite ones).
#[derive(Clone, Debug)]
pub struct Body {
    pub mass: f32,
    pub one_over_mass: f32,
    pub pos: Vector2,
    pub vel: Vector2,
    pub solid: bool,
    pub material: Material,
    pub forces: SmallVec<[Force; 2]>,
}

impl Body {
    pub fn new(mass: f32, pos: Vector2, solid: bool, material: Material) -> Self {
        debug_assert!(mass > 0.0, "mass must be positive (or infinite)");
        Self {
            mass,
            one_over_mass: if mass.is_infinite() { 0.0 } else { 1.0 / mass },
            pos,
            vel: Vector2::new(0.0, 0.0),
            solid,
            material,
            forces: SmallVec::new(),
        }
    }

    fn accel(&self, pos: Vector2, vel: Vector2, dt: f32) -> Vector2 {
        let total: Vector2 = self
            .forces
            .iter()
            .fold(Vector2::new(0.0, 0.0), |acc, f| acc + f.eval(pos, vel, dt));
        total * self.one_over_mass
    }

    /// Returns the tentative `(pos', vel')` after time `dt`, without mutating `self`. The caller
    /// is expected to validate the result against collisions before applying it.
    pub fn integrate(&self, dt: f32) -> (Vector2, Vector2) {
        rk4(self.pos, self.vel, |p, v, t| self.accel(p, v, t), dt)
    }
}

/// A `Body` bounded by a circle for collision purposes. Every moving entity in the simulation is
/// one of these.
#[derive(Clone, Debug)]
pub struct CircularBody {
    pub body: Body,
    pub radius: f32,
}

impl CircularBody {
    pub fn new(mass: f32, pos: Vector2, solid: bool, material: Material, radius: f32) -> Self {
        Self {
            body: Body::new(mass, pos, solid, material),
            radius,
        }
    }
}

/// A `Body` bounded by an axis-aligned rectangle. Used exclusively for solid tiles in this
/// simulation (infinite mass, `size_x == size_y == 1`).
#[derive(Clone, Debug)]
pub struct RectangularBody {
    pub body: Body,
    pub size_x: f32,
    pub size_y: f32,
}

impl RectangularBody {
    pub fn new(
        mass: f32,
        pos: Vector2,
        solid: bool,
        material: Material,
        size_x: f32,
        size_y: f32,
    ) -> Self {
        Self {
            body: Body::new(mass, pos, solid, material),
            size_x,
            size_y,
        }
    }
}
