//! The point-mass body record and its identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a body within a simulation run.
///
/// IDs are assigned at configuration-load time and stay stable for the
/// whole run. Body identity is tracked by ID, never by position in the
/// collection — reordering a collection must not change the simulation
/// result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for BodyId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// A point mass in the planar gravitational simulation.
///
/// Bodies have value semantics: they are small records copied wholesale
/// on every transition, by design. The integrator never mutates a body
/// in place; it returns a fresh collection each call.
///
/// # Mass
///
/// `mass` must be strictly positive. The integrator divides by it on
/// every step and does **not** check — feeding a zero or negative mass
/// is a caller error with undefined numeric results, not a handled
/// condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Stable identity for this body across the run.
    pub id: BodyId,
    /// Position, x component.
    pub x: f64,
    /// Position, y component.
    pub y: f64,
    /// Velocity, x component.
    pub vx: f64,
    /// Velocity, y component.
    pub vy: f64,
    /// Mass. Strictly positive; see the type-level docs.
    pub mass: f64,
    /// Display color token. Opaque to the engine — carried through
    /// every step unchanged and never interpreted.
    pub color: String,
}

impl Body {
    /// Construct a body from its seven fields.
    pub fn new(
        id: impl Into<BodyId>,
        x: f64,
        y: f64,
        vx: f64,
        vy: f64,
        mass: f64,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            vx,
            vy,
            mass,
            color: color.into(),
        }
    }

    /// Whether position, velocity, and mass are all finite.
    ///
    /// The integrator never filters non-finite values — they propagate
    /// into returned state. Observers can use this to detect divergence.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.vx.is_finite()
            && self.vy.is_finite()
            && self.mass.is_finite()
    }
}
