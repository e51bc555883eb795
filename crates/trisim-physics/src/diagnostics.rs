//! Conserved-quantity diagnostics over a body collection.
//!
//! The integrator itself never inspects these; they exist for tests
//! and for observers that sample published state to decide on policy
//! actions (pause on divergence, alerts). Computing them is in scope;
//! the policy layer is not.

use trisim_core::Body;

use crate::integrator::G;

/// Total linear momentum `(Σ m·vx, Σ m·vy)`.
///
/// Stays within roundoff of its initial value under the integrator's
/// symmetric force accumulation.
pub fn total_momentum(bodies: &[Body]) -> (f64, f64) {
    bodies.iter().fold((0.0, 0.0), |(px, py), b| {
        (px + b.mass * b.vx, py + b.mass * b.vy)
    })
}

/// Total mechanical energy: kinetic plus pairwise potential `-G·mi·mj/r`.
///
/// Coincident pairs (r = 0) contribute no potential term, mirroring the
/// integrator's near-collision skip policy.
pub fn total_energy(bodies: &[Body]) -> f64 {
    let kinetic: f64 = bodies
        .iter()
        .map(|b| 0.5 * b.mass * (b.vx * b.vx + b.vy * b.vy))
        .sum();

    let mut potential = 0.0;
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let dx = bodies[j].x - bodies[i].x;
            let dy = bodies[j].y - bodies[i].y;
            let r = (dx * dx + dy * dy).sqrt();
            if r > 0.0 {
                potential -= G * bodies[i].mass * bodies[j].mass / r;
            }
        }
    }

    kinetic + potential
}

/// Mass-weighted center of mass `(Σ m·x, Σ m·y) / Σ m`.
///
/// Returns the origin for an empty collection.
pub fn center_of_mass(bodies: &[Body]) -> (f64, f64) {
    let total_mass: f64 = bodies.iter().map(|b| b.mass).sum();
    if total_mass == 0.0 {
        return (0.0, 0.0);
    }
    let (mx, my) = bodies.iter().fold((0.0, 0.0), |(mx, my), b| {
        (mx + b.mass * b.x, my + b.mass * b.y)
    });
    (mx / total_mass, my / total_mass)
}
