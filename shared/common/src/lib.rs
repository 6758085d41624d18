pub use cgmath;
pub use cgmath::{Angle, EuclideanSpace, InnerSpace, MetricSpace, VectorSpace, Zero};
pub use float_cmp::ApproxEq;
pub use itertools::*;
pub use ordered_float::OrderedFloat;
pub use rand::prelude::*;
pub use smallvec::*;
pub use thiserror::{self, Error};

pub use lazy_static::lazy_static;
pub use logging::{self, prelude::*};

// common imports that annoyingly get resolved to other pub exports of std/core
// https://github.com/intellij-rust/intellij-rust/issues/5654
pub use std::{
    error::Error,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::Hash,
    iter::{empty, once},
};

pub type BoxedResult<T> = Result<T, Box<dyn Error>>;

/// The float type used throughout the simulation. f32 everywhere, as in the source.
pub type F = f32;
pub type Vector2 = cgmath::Vector2<F>;
pub type Point2 = cgmath::Point2<F>;
pub type Rad = cgmath::Rad<F>;

#[inline]
pub fn rad(f: F) -> Rad {
    cgmath::Rad(f)
}

/// Operations the source's hand-rolled `Vector` class provides that `cgmath::Vector2` doesn't
/// expose directly: componentwise min/max (`&`/`|` in the source), floor division, a perpendicular
/// "normal", and decimal rounding for the collision-epsilon dance.
pub trait Vector2Ext {
    fn component_min(self, other: Self) -> Self;
    fn component_max(self, other: Self) -> Self;
    fn div_floor(self, rhs: F) -> Self;
    /// 90 degree rotation: (-y, x) / norm, as `Vector.normal()` in the source.
    fn normal(self) -> Self;
    fn round_to(self, decimals: i32) -> Self;
}

impl Vector2Ext for Vector2 {
    fn component_min(self, other: Self) -> Self {
        Vector2::new(self.x.min(other.x), self.y.min(other.y))
    }

    fn component_max(self, other: Self) -> Self {
        Vector2::new(self.x.max(other.x), self.y.max(other.y))
    }

    fn div_floor(self, rhs: F) -> Self {
        Vector2::new((self.x / rhs).floor(), (self.y / rhs).floor())
    }

    fn normal(self) -> Self {
        let n = self.magnitude();
        if n == 0.0 {
            Vector2::zero()
        } else {
            Vector2::new(-self.y / n, self.x / n)
        }
    }

    fn round_to(self, decimals: i32) -> Self {
        let factor = 10f32.powi(decimals);
        Vector2::new(
            (self.x * factor).round() / factor,
            (self.y * factor).round() / factor,
        )
    }
}

/// `floor(0.5 + n)`, the half-integer tile/chunk boundary rule used throughout the world model.
#[inline]
pub fn floor_half(n: F) -> i32 {
    (0.5 + n).floor() as i32
}

mod ids;
mod material;
mod summary;

pub use ids::{AreaId, EntityId};
pub use material::{Material, TileNature};
pub use summary::{EntitySummary, TileMapSummary};
