use common::{InnerSpace, Material, MetricSpace, Vector2, Zero};

use crate::body::{Body, CircularBody, RectangularBody};

/// Decimal places the `distance - radii` (or edge/corner penetration) difference is rounded to
/// before being compared against zero. Without this, floating-point error leaves bodies
/// interpenetrating by fractions of a micrometer forever: the corrective push underflows and the
/// detection-correction cycle never converges. Named and tested per the Design Notes.
pub const CONTACT_EPSILON_DECIMALS: i32 = 6;

fn round_contact(x: f32) -> f32 {
    let factor = 10f32.powi(CONTACT_EPSILON_DECIMALS);
    (x * factor).round() / factor
}

/// The geometric result of a collision: how far the collider must be pushed back to stop
/// overlapping, and along what line. Does not carry collider/collidee identity — callers
/// (`game/world`'s `Area`) attach that themselves, since the physics engine has no notion of
/// entities or tiles.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Collision {
    pub distance: f32,
    pub penetration: Vector2,
}

/// Is the circular `collider` colliding with the circular `collidee`? Ground truth:
/// `CircularBody.collidesCircle`. Coincident centers (zero-length penetration direction) report
/// no collision rather than dividing by zero, matching the source's `ZeroDivisionError` catch.
pub fn circle_circle(collidee: &CircularBody, collider: &CircularBody) -> Option<Collision> {
    let distance = collidee.body.pos.distance(collider.body.pos);
    let radii = collidee.radius + collider.radius;

    if round_contact(distance - radii) >= 0.0 {
        return None;
    }

    let direction = collider.body.pos - collidee.body.pos;
    if direction == Vector2::zero() {
        return None;
    }

    let penetration = direction.normalize() * (radii - distance);
    Some(Collision {
        distance,
        penetration,
    })
}

fn with_corner(corner: Vector2, collider: &CircularBody) -> Option<Collision> {
    let distance = corner.distance(collider.body.pos);
    if round_contact(distance - collider.radius) >= 0.0 {
        return None;
    }

    let direction = collider.body.pos - corner;
    if direction == Vector2::zero() {
        return None;
    }

    let penetration = direction.normalize() * (collider.radius - distance);
    Some(Collision {
        distance,
        penetration,
    })
}

fn with_horizontal_edge(y_edge: f32, sign: f32, collider: &CircularBody) -> Option<Collision> {
    let y_other = collider.body.pos.y - sign * collider.radius;
    let difference = y_edge - y_other;
    if round_contact(difference) / sign <= 0.0 {
        return None;
    }
    Some(Collision {
        distance: difference.abs(),
        penetration: Vector2::new(0.0, difference),
    })
}

fn with_vertical_edge(x_edge: f32, sign: f32, collider: &CircularBody) -> Option<Collision> {
    let x_other = collider.body.pos.x - sign * collider.radius;
    let difference = x_edge - x_other;
    if round_contact(difference) / sign <= 0.0 {
        return None;
    }
    Some(Collision {
        distance: difference.abs(),
        penetration: Vector2::new(difference, 0.0),
    })
}

/// Is the circular `collider` colliding with the axis-aligned rectangular `collidee`? 9 Voronoi
/// regions as in `RectangularBody.collidesCircle`: corners 1/3/7/9, edges 2/4/6/8, interior 5
/// (no collision reported — prevented by prior resolution; a body genuinely wedged inside a
/// solid tile is handled by the "stuck" path one level up, not by this function).
pub fn rect_circle(collidee: &RectangularBody, collider: &CircularBody) -> Option<Collision> {
    let x1 = collidee.body.pos.x - collidee.size_x / 2.0;
    let x2 = x1 + collidee.size_x;
    let y1 = collidee.body.pos.y - collidee.size_y / 2.0;
    let y2 = y1 + collidee.size_y;
    let (x, y) = (collider.body.pos.x, collider.body.pos.y);

    if x <= x1 && y <= y1 {
        with_corner(Vector2::new(x1, y1), collider) // cell 1
    } else if x >= x2 && y <= y1 {
        with_corner(Vector2::new(x2, y1), collider) // cell 3
    } else if y <= y1 {
        with_horizontal_edge(y1, -1.0, collider) // cell 2
    } else if x <= x1 && y >= y2 {
        with_corner(Vector2::new(x1, y2), collider) // cell 7
    } else if x >= x2 && y >= y2 {
        with_corner(Vector2::new(x2, y2), collider) // cell 9
    } else if y >= y2 {
        with_horizontal_edge(y2, 1.0, collider) // cell 8
    } else if x <= x1 {
        with_vertical_edge(x1, -1.0, collider) // cell 4
    } else if x >= x2 {
        with_vertical_edge(x2, 1.0, collider) // cell 6
    } else {
        None // cell 5: inside the rectangle
    }
}

/// 1D elastic collision on scalar speeds along the collision normal. Ground truth:
/// `elasticCollisionSpeed`. `v1`/`m1` belong to the collider, `v2`/`m2` to the collidee.
fn elastic_collision_speed(m1: f32, v1: f32, m2: f32, v2: f32) -> (f32, f32) {
    match (m1.is_infinite(), m2.is_infinite()) {
        (true, true) => (v1, v2),
        (true, false) => (v1, -v2),
        (false, true) => (-v1, v2),
        (false, false) => {
            let u1 = (v1 * (m1 - m2) + 2.0 * m2 * v2) / (m1 + m2);
            let u2 = (v2 * (m1 - m2) + 2.0 * m1 * v1) / (m1 + m2);
            (u1, u2)
        }
    }
}

/// Full elastic-collision response: decompose both velocities along `normal`, run the 1D elastic
/// collision on the normal components only, scale by material efficiencies, recompose. Ground
/// truth: `elasticCollisionVelocities`. Returns `(collider_vel', collidee_vel')`.
pub fn elastic_collision_velocities(
    collider: &Body,
    collidee: &Body,
    normal: Vector2,
) -> (Vector2, Vector2) {
    let v1n = collider.vel.dot(normal);
    let v2n = collidee.vel.dot(normal);
    let v1t = collider.vel - normal * v1n;
    let v2t = collidee.vel - normal * v2n;

    let (u1n, u2n) = elastic_collision_speed(collider.mass, v1n, collidee.mass, v2n);

    let eff_n = collider.material.eff_n * collidee.material.eff_n;
    let eff_t = collider.material.eff_t * collidee.material.eff_t;

    let u1 = normal * (u1n * eff_n) + v1t * eff_t;
    let u2 = normal * (u2n * eff_n) + v2t * eff_t;
    (u1, u2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Material;

    fn circle(pos: Vector2, radius: f32, mass: f32) -> CircularBody {
        CircularBody::new(mass, pos, true, Material::STONE, radius)
    }

    #[test]
    fn circles_touching_exactly_do_not_collide() {
        let a = circle(Vector2::new(0.0, 0.0), 1.0, 1.0);
        let b = circle(Vector2::new(2.0, 0.0), 1.0, 1.0);
        assert!(circle_circle(&a, &b).is_none());
    }

    #[test]
    fn circles_within_rounding_noise_do_not_collide() {
        let a = circle(Vector2::new(0.0, 0.0), 1.0, 1.0);
        let b = circle(Vector2::new(2.0 - 1e-7, 0.0), 1.0, 1.0);
        assert!(circle_circle(&a, &b).is_none());
    }

    #[test]
    fn circles_overlapping_beyond_rounding_noise_collide() {
        let a = circle(Vector2::new(0.0, 0.0), 1.0, 1.0);
        let b = circle(Vector2::new(2.0 - 1e-5, 0.0), 1.0, 1.0);
        assert!(circle_circle(&a, &b).is_some());
    }

    #[test]
    fn coincident_centers_report_no_collision() {
        let a = circle(Vector2::new(0.0, 0.0), 1.0, 1.0);
        let b = circle(Vector2::new(0.0, 0.0), 1.0, 1.0);
        assert!(circle_circle(&a, &b).is_none());
    }

    #[test]
    fn elastic_collision_conserves_momentum_and_energy() {
        let mut a = Body::new(1.0, Vector2::new(-1.0, 0.0), true, Material::RUBBER);
        a.vel = Vector2::new(2.0, 0.0);
        let mut b = Body::new(2.0, Vector2::new(1.0, 0.0), true, Material::RUBBER);
        b.vel = Vector2::new(-1.0, 0.0);

        let normal = Vector2::new(1.0, 0.0);
        let (va, vb) = elastic_collision_velocities(&a, &b, normal);

        let momentum_before = a.mass * a.vel.x + b.mass * b.vel.x;
        let momentum_after = a.mass * va.x + b.mass * vb.x;
        assert!((momentum_before - momentum_after).abs() < 1e-6);

        let energy_before = 0.5 * a.mass * a.vel.x.powi(2) + 0.5 * b.mass * b.vel.x.powi(2);
        let energy_after = 0.5 * a.mass * va.x.powi(2) + 0.5 * b.mass * vb.x.powi(2);
        assert!((energy_before - energy_after).abs() < 1e-6);
    }

    #[test]
    fn immovable_wall_reverses_normal_velocity_exactly() {
        let mut ball = Body::new(1.0, Vector2::new(-1.0, 0.0), true, Material::RUBBER);
        ball.vel = Vector2::new(3.0, 0.0);
        let wall = Body::new(f32::INFINITY, Vector2::new(0.0, 0.0), true, Material::RUBBER);

        let normal = Vector2::new(1.0, 0.0);
        let (vball, vwall) = elastic_collision_velocities(&ball, &wall, normal);

        assert!((vball.x + 3.0).abs() < 1e-6);
        assert_eq!(vwall, Vector2::new(0.0, 0.0));
    }
}
