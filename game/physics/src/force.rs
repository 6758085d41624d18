use common::Vector2;

/// A force evaluated as a pure function of `(pos, vel, dt)`. A tagged variant rather than a
/// general closure, per the Design Notes: the engine only ever needs these two shapes, and
/// `SmallVec<[Force; 2]>` on every body stays `Copy` this way.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Force {
    /// Does not depend on time, position or velocity. Used to model walking/running.
    Constant(Vector2),
    /// Proportional to velocity. `mu` is the coefficient of kinetic friction; negative slows a
    /// body down, which is the only direction this engine ever uses it in.
    KineticFriction(f32),
}

impl Force {
    pub fn eval(&self, _pos: Vector2, vel: Vector2, _dt: f32) -> Vector2 {
        match self {
            Force::Constant(v) => *v,
            Force::KineticFriction(mu) => vel * *mu,
        }
    }
}
