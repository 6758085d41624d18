use common::Vector2;

/// Classical 4th-order Runge-Kutta integration of a single point mass over `[0, dt]`, given an
/// acceleration function `a(pos, vel, dt)`. Returns `(x', v')`. Grounded in
/// `infiniworld/physics.py::rk4` (itself credited there to doswa.com's 2009 writeup); the
/// intermediate `x1..x4` the Python comments mention were inlined away there too, kept inlined
/// here for the same reason.
pub fn rk4(
    x: Vector2,
    v: Vector2,
    mut a: impl FnMut(Vector2, Vector2, f32) -> Vector2,
    dt: f32,
) -> (Vector2, Vector2) {
    let v1 = v;
    let a1 = a(x, v1, 0.0);

    let v2 = v + a1 * (0.5 * dt);
    let a2 = a(x + v1 * (0.5 * dt), v2, dt / 2.0);

    let v3 = v + a2 * (0.5 * dt);
    let a3 = a(x + v2 * (0.5 * dt), v3, dt / 2.0);

    let v4 = v + a3 * dt;
    let a4 = a(x + v3 * dt, v4, dt);

    let xf = x + (v1 + v2 * 2.0 + v3 * 2.0 + v4) * (dt / 6.0);
    let vf = v + (a1 + a2 * 2.0 + a3 * 2.0 + a4) * (dt / 6.0);

    (xf, vf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Vector2;
    use float_cmp::approx_eq;

    #[test]
    fn constant_force_matches_kinematics() {
        // mass 1, constant acceleration F, zero initial velocity: x' - x == 0.5 F t^2, v' == F t
        let f = Vector2::new(2.0, -3.0);
        let dt = 0.5_f32;
        let (xf, vf) = rk4(Vector2::new(0.0, 0.0), Vector2::new(0.0, 0.0), |_, _, _| f, dt);

        let expected_x = f * (0.5 * dt * dt);
        let expected_v = f * dt;

        assert!(approx_eq!(f32, xf.x, expected_x.x, epsilon = 1e-6));
        assert!(approx_eq!(f32, xf.y, expected_x.y, epsilon = 1e-6));
        assert!(approx_eq!(f32, vf.x, expected_v.x, epsilon = 1e-6));
        assert!(approx_eq!(f32, vf.y, expected_v.y, epsilon = 1e-6));
    }
}
