//! Fixed-step RK4 integration of Newton's gravitational law.
//!
//! Every function here is pure: input collections are never mutated,
//! and a fresh collection is returned each call. Non-finite values are
//! not filtered — divergence detection belongs to observers, not the
//! integrator.

use smallvec::SmallVec;

use trisim_core::Body;

/// Gravitational constant.
///
/// Unit value matching the Chenciner-Montgomery figure-eight solution's
/// convention, not physical SI gravity.
pub const G: f64 = 1.0;

/// Base time increment for a single RK4 sub-step.
///
/// The effective step is `BASE_DT * time_speed`. The small base value
/// trades wall-clock throughput for integration error; callers batch
/// several sub-steps per published frame (see [`multi_step`]).
pub const BASE_DT: f64 = 1e-3;

/// Sub-steps batched per published tick.
///
/// Several small RK4 steps per frame reduce truncation error relative
/// to one large step at the same nominal speed, at fixed per-frame
/// cost. Do not collapse to a single larger step.
pub const DEFAULT_SUB_STEPS: u32 = 5;

/// Pair-separation floor below which no force is exchanged.
///
/// A stability escape valve for near-collisions: pairs closer than this
/// contribute zero force instead of a near-singular one. This is a
/// defined edge-case policy, not a resolution of the singularity.
pub const MIN_SEPARATION: f64 = 1e-10;

// ── Accelerations ────────────────────────────────────────────────

/// Acceleration components for one body.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Accel {
    /// Acceleration, x component.
    pub ax: f64,
    /// Acceleration, y component.
    pub ay: f64,
}

/// State derivative for one body: velocity pass-through plus the
/// gravitational acceleration from [`accelerations`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Derivative {
    /// dx/dt.
    pub vx: f64,
    /// dy/dt.
    pub vy: f64,
    /// dvx/dt.
    pub ax: f64,
    /// dvy/dt.
    pub ay: f64,
}

/// Mutual gravitational accelerations for every body, in input order.
///
/// For every unordered pair the scalar force `G·mi·mj / r²` is
/// decomposed along the displacement and accumulated with opposite
/// signs on the two bodies (Newton's third law). Pairs separated by
/// less than [`MIN_SEPARATION`] are skipped entirely.
pub fn accelerations(bodies: &[Body]) -> SmallVec<[Accel; 4]> {
    let mut accels: SmallVec<[Accel; 4]> = SmallVec::from_elem(Accel::default(), bodies.len());

    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let dx = bodies[j].x - bodies[i].x;
            let dy = bodies[j].y - bodies[i].y;
            let r = (dx * dx + dy * dy).sqrt();

            if r < MIN_SEPARATION {
                continue;
            }

            let force = G * bodies[i].mass * bodies[j].mass / (r * r);
            let fx = force * dx / r;
            let fy = force * dy / r;

            accels[i].ax += fx / bodies[i].mass;
            accels[i].ay += fy / bodies[i].mass;
            accels[j].ax -= fx / bodies[j].mass;
            accels[j].ay -= fy / bodies[j].mass;
        }
    }

    accels
}

/// State derivatives for every body, in input order.
///
/// This is the black-box derivative function the RK4 stepper evaluates
/// four times per step.
pub fn derivatives(bodies: &[Body]) -> SmallVec<[Derivative; 4]> {
    let accels = accelerations(bodies);
    bodies
        .iter()
        .zip(accels.iter())
        .map(|(body, a)| Derivative {
            vx: body.vx,
            vy: body.vy,
            ax: a.ax,
            ay: a.ay,
        })
        .collect()
}

/// Bodies shifted by `k * h`, producing a fresh intermediate collection.
///
/// Mass, id, and color carry through unchanged.
fn shifted(bodies: &[Body], k: &[Derivative], h: f64) -> Vec<Body> {
    bodies
        .iter()
        .zip(k.iter())
        .map(|(body, k)| Body {
            x: body.x + h * k.vx,
            y: body.y + h * k.vy,
            vx: body.vx + h * k.ax,
            vy: body.vy + h * k.ay,
            ..body.clone()
        })
        .collect()
}

/// Advance the collection by one RK4 sub-step at `BASE_DT * time_speed`.
///
/// Classical 4th-order Runge-Kutta: four derivative evaluations
/// combined with 1-2-2-1 weights, applied per component to position
/// and velocity. The input is never mutated. No numeric extreme is an
/// error — non-finite results propagate into the returned state.
pub fn step(bodies: &[Body], time_speed: f64) -> Vec<Body> {
    let dt = BASE_DT * time_speed;

    let k1 = derivatives(bodies);
    let k2 = derivatives(&shifted(bodies, &k1, dt / 2.0));
    let k3 = derivatives(&shifted(bodies, &k2, dt / 2.0));
    let k4 = derivatives(&shifted(bodies, &k3, dt));

    bodies
        .iter()
        .enumerate()
        .map(|(i, body)| Body {
            x: body.x + (dt / 6.0) * (k1[i].vx + 2.0 * k2[i].vx + 2.0 * k3[i].vx + k4[i].vx),
            y: body.y + (dt / 6.0) * (k1[i].vy + 2.0 * k2[i].vy + 2.0 * k3[i].vy + k4[i].vy),
            vx: body.vx + (dt / 6.0) * (k1[i].ax + 2.0 * k2[i].ax + 2.0 * k3[i].ax + k4[i].ax),
            vy: body.vy + (dt / 6.0) * (k1[i].ay + 2.0 * k2[i].ay + 2.0 * k3[i].ay + k4[i].ay),
            ..body.clone()
        })
        .collect()
}

/// Apply [`step`] `sub_steps` times in sequence.
///
/// Callers account one iteration per sub-step; a driver ticking at
/// display cadence adds `sub_steps` to its counter per call.
pub fn multi_step(bodies: &[Body], time_speed: f64, sub_steps: u32) -> Vec<Body> {
    let mut current = bodies.to_vec();
    for _ in 0..sub_steps {
        current = step(&current, time_speed);
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn body(id: u32, x: f64, y: f64, vx: f64, vy: f64, mass: f64) -> Body {
        Body::new(id, x, y, vx, vy, mass, "#ffffff")
    }

    /// Chenciner-Montgomery figure-eight initial conditions.
    fn figure_eight() -> Vec<Body> {
        vec![
            body(1, -0.97000436, 0.24308753, 0.466203685, 0.43236573, 1.0),
            body(2, 0.97000436, -0.24308753, 0.466203685, 0.43236573, 1.0),
            body(3, 0.0, 0.0, -0.93240737, -0.86473146, 1.0),
        ]
    }

    // ── Accelerations ────────────────────────────────────────

    #[test]
    fn third_law_pair_forces_negate_exactly() {
        let bodies = vec![
            body(1, -1.0, 0.5, 0.0, 0.0, 2.0),
            body(2, 1.0, -0.5, 0.0, 0.0, 3.0),
        ];
        let accels = accelerations(&bodies);
        // Force on i is m_i * a_i; the pair forces must cancel exactly,
        // not just to roundoff, because both sides divide the same fx.
        assert_eq!(accels[0].ax * 2.0, -(accels[1].ax * 3.0));
        assert_eq!(accels[0].ay * 2.0, -(accels[1].ay * 3.0));
    }

    #[test]
    fn two_unit_masses_at_unit_distance_attract_with_unit_force() {
        let bodies = vec![
            body(1, 0.0, 0.0, 0.0, 0.0, 1.0),
            body(2, 1.0, 0.0, 0.0, 0.0, 1.0),
        ];
        let accels = accelerations(&bodies);
        assert!((accels[0].ax - 1.0).abs() < 1e-15);
        assert!((accels[1].ax + 1.0).abs() < 1e-15);
        assert_eq!(accels[0].ay, 0.0);
        assert_eq!(accels[1].ay, 0.0);
    }

    #[test]
    fn near_collision_pair_exchanges_no_force() {
        let bodies = vec![
            body(1, 0.0, 0.0, 0.0, 0.0, 1.0),
            body(2, 1e-11, 0.0, 0.0, 0.0, 1.0),
        ];
        let accels = accelerations(&bodies);
        assert_eq!(accels[0], Accel::default());
        assert_eq!(accels[1], Accel::default());
    }

    #[test]
    fn near_collision_step_stays_finite() {
        let bodies = vec![
            body(1, 0.0, 0.0, 0.1, 0.0, 1.0),
            body(2, 1e-11, 0.0, -0.1, 0.0, 1.0),
            body(3, 1.0, 1.0, 0.0, 0.0, 1.0),
        ];
        let next = step(&bodies, 1.0);
        assert!(next.iter().all(Body::is_finite));
    }

    #[test]
    fn coincident_bodies_do_not_panic() {
        let bodies = vec![
            body(1, 0.5, 0.5, 0.0, 0.0, 1.0),
            body(2, 0.5, 0.5, 0.0, 0.0, 1.0),
        ];
        let accels = accelerations(&bodies);
        assert_eq!(accels[0], Accel::default());
    }

    // ── Derivatives ──────────────────────────────────────────

    #[test]
    fn derivatives_pass_velocity_through() {
        let bodies = figure_eight();
        let derivs = derivatives(&bodies);
        for (body, d) in bodies.iter().zip(derivs.iter()) {
            assert_eq!(d.vx, body.vx);
            assert_eq!(d.vy, body.vy);
        }
    }

    // ── Step ─────────────────────────────────────────────────

    #[test]
    fn step_does_not_mutate_input() {
        let bodies = figure_eight();
        let before = bodies.clone();
        let _ = step(&bodies, 1.0);
        assert_eq!(bodies, before);
    }

    #[test]
    fn step_is_deterministic() {
        let bodies = figure_eight();
        assert_eq!(step(&bodies, 1.0), step(&bodies, 1.0));
        assert_eq!(step(&bodies, 3.7), step(&bodies, 3.7));
    }

    #[test]
    fn step_carries_id_mass_color_through() {
        let bodies = vec![
            body(7, 0.0, 0.0, 0.1, 0.0, 2.5),
            Body::new(9u32, 1.0, 0.0, -0.1, 0.0, 0.5, "#123456"),
        ];
        let next = step(&bodies, 1.0);
        assert_eq!(next[0].id, bodies[0].id);
        assert_eq!(next[0].mass, bodies[0].mass);
        assert_eq!(next[1].id, bodies[1].id);
        assert_eq!(next[1].color, "#123456");
    }

    #[test]
    fn doubled_speed_approximates_two_composed_steps() {
        let bodies = figure_eight();
        let speed = 0.1;

        let one_big = step(&bodies, 2.0 * speed);
        let two_small = step(&step(&bodies, speed), speed);

        for (a, b) in one_big.iter().zip(two_small.iter()) {
            assert!((a.x - b.x).abs() < 1e-9, "x: {} vs {}", a.x, b.x);
            assert!((a.y - b.y).abs() < 1e-9, "y: {} vs {}", a.y, b.y);
            assert!((a.vx - b.vx).abs() < 1e-9);
            assert!((a.vy - b.vy).abs() < 1e-9);
        }
    }

    #[test]
    fn figure_eight_conserves_momentum_and_energy() {
        use crate::diagnostics::{total_energy, total_momentum};

        let mut bodies = figure_eight();
        let initial_energy = total_energy(&bodies);

        for _ in 0..1000 {
            bodies = step(&bodies, 1.0);
            let (px, py) = total_momentum(&bodies);
            assert!(px.abs() < 1e-9, "momentum x drifted: {px}");
            assert!(py.abs() < 1e-9, "momentum y drifted: {py}");
        }

        let drift = (total_energy(&bodies) - initial_energy).abs() / initial_energy.abs();
        assert!(drift < 0.01, "energy drifted {:.4}%", drift * 100.0);
    }

    // ── MultiStep ────────────────────────────────────────────

    #[test]
    fn multi_step_equals_repeated_step() {
        let bodies = figure_eight();
        let mut expected = bodies.clone();
        for _ in 0..5 {
            expected = step(&expected, 1.5);
        }
        assert_eq!(multi_step(&bodies, 1.5, 5), expected);
    }

    #[test]
    fn multi_step_zero_sub_steps_is_identity() {
        let bodies = figure_eight();
        assert_eq!(multi_step(&bodies, 1.0, 0), bodies);
    }

    // ── Properties ───────────────────────────────────────────

    fn arb_body(id: u32) -> impl Strategy<Value = Body> {
        (
            -2.0..2.0f64,
            -2.0..2.0f64,
            -1.0..1.0f64,
            -1.0..1.0f64,
            0.5..2.0f64,
        )
            .prop_map(move |(x, y, vx, vy, mass)| body(id, x, y, vx, vy, mass))
    }

    fn arb_three_bodies() -> impl Strategy<Value = Vec<Body>> {
        (arb_body(1), arb_body(2), arb_body(3)).prop_map(|(a, b, c)| vec![a, b, c])
    }

    proptest! {
        #[test]
        fn accelerations_obey_third_law(bodies in arb_three_bodies()) {
            // Net force (not acceleration) over the system sums to zero
            // up to accumulation roundoff.
            let accels = accelerations(&bodies);
            let fx: f64 = bodies.iter().zip(accels.iter()).map(|(b, a)| b.mass * a.ax).sum();
            let fy: f64 = bodies.iter().zip(accels.iter()).map(|(b, a)| b.mass * a.ay).sum();
            prop_assert!(fx.abs() < 1e-9);
            prop_assert!(fy.abs() < 1e-9);
        }

        #[test]
        fn step_is_order_independent(bodies in arb_three_bodies()) {
            // Permute the collection, step, permute back: same physical
            // result up to summation-order roundoff.
            let forward = step(&bodies, 1.0);

            let permuted = vec![bodies[2].clone(), bodies[0].clone(), bodies[1].clone()];
            let stepped = step(&permuted, 1.0);
            let back = [&stepped[1], &stepped[2], &stepped[0]];

            for (a, b) in forward.iter().zip(back.iter()) {
                prop_assert_eq!(a.id, b.id);
                prop_assert!((a.x - b.x).abs() < 1e-9);
                prop_assert!((a.y - b.y).abs() < 1e-9);
                prop_assert!((a.vx - b.vx).abs() < 1e-9);
                prop_assert!((a.vy - b.vy).abs() < 1e-9);
            }
        }

        #[test]
        fn step_never_panics_on_extreme_speeds(
            bodies in arb_three_bodies(),
            speed in 0.01..100.0f64,
        ) {
            // Numeric extremes are not errors; the step always returns.
            let next = step(&bodies, speed);
            prop_assert_eq!(next.len(), bodies.len());
        }
    }
}
