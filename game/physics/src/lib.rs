//! Bodies, forces, RK4 integration and circle/circle and circle/rectangle collision detection
//! and response. Grounded in `infiniworld/physics.py` in full — the teacher repo's own
//! `game/physics` member was an unrelated `bullet3d` FFI binding and contributes nothing here.

mod body;
mod collision;
mod force;
mod rk4;

pub use body::{Body, CircularBody, RectangularBody};
pub use collision::{
    circle_circle, elastic_collision_velocities, rect_circle, Collision,
    CONTACT_EPSILON_DECIMALS,
};
pub use force::Force;
pub use rk4::rk4;
