//! Predefined three-body scenarios.
//!
//! Each preset carries display metadata plus a ready-to-load
//! [`Scenario`]. The registry preserves definition order.

use std::fmt;

use indexmap::IndexMap;

use trisim_core::Body;

use crate::scenario::Scenario;

/// Preset grouping used by the configuration UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// Known stable periodic solutions.
    StableOrbits,
    /// Equilibrium configurations (Lagrange points).
    Equilibrium,
    /// Periodic orbits with non-trivial geometry.
    Periodic,
    /// Chaotic but visually interesting initial conditions.
    Chaotic,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StableOrbits => write!(f, "stable-orbits"),
            Self::Equilibrium => write!(f, "equilibrium"),
            Self::Periodic => write!(f, "periodic"),
            Self::Chaotic => write!(f, "chaotic"),
        }
    }
}

/// A named, categorized scenario.
#[derive(Clone, Debug, PartialEq)]
pub struct Preset {
    /// Stable identifier, e.g. `figure-eight`.
    pub id: &'static str,
    /// Human-readable display name.
    pub name: &'static str,
    /// Grouping for the preset picker.
    pub category: Category,
    /// The loadable configuration.
    pub scenario: Scenario,
}

fn body(id: u32, x: f64, y: f64, vx: f64, vy: f64, mass: f64, color: &str) -> Body {
    Body::new(id, x, y, vx, vy, mass, color)
}

fn scenario(bodies: Vec<Body>, time_speed: f64, trail_length: u32, vectors: bool) -> Scenario {
    Scenario {
        bodies,
        time_speed,
        trail_length,
        show_velocity_vectors: vectors,
        exported_at: None,
        description: None,
    }
}

/// Chenciner-Montgomery figure-eight orbit.
///
/// Exact values from "A remarkable periodic solution of the three-body
/// problem in the case of equal masses": x1 = -x2 = (0.97000436,
/// -0.24308753), x3 = 0, V = (-0.93240737, -0.86473146) for x3 and
/// V1 = V2 = -V/2.
pub fn figure_eight() -> Scenario {
    scenario(
        vec![
            body(1, -0.97000436, 0.24308753, 0.466203685, 0.43236573, 1.0, "#ff0000"),
            body(2, 0.97000436, -0.24308753, 0.466203685, 0.43236573, 1.0, "#00ff00"),
            body(3, 0.0, 0.0, -0.93240737, -0.86473146, 1.0, "#0000ff"),
        ],
        1.0,
        100,
        false,
    )
}

/// L4 Lagrange point: two equal masses plus a light test particle at
/// the triangular equilibrium.
pub fn lagrange_points() -> Scenario {
    scenario(
        vec![
            body(1, -1.0, 0.0, 0.0, -0.5, 1.0, "#ff6600"),
            body(2, 1.0, 0.0, 0.0, 0.5, 1.0, "#6600ff"),
            body(3, 0.0, 1.732, -0.866, 0.0, 0.001, "#00ff66"),
        ],
        0.8,
        200,
        true,
    )
}

/// Butterfly-shaped trajectory pattern.
pub fn butterfly() -> Scenario {
    scenario(
        vec![
            body(1, -1.0, 0.0, 0.347111, 0.532728, 1.0, "#ff0080"),
            body(2, 1.0, 0.0, 0.347111, 0.532728, 1.0, "#8000ff"),
            body(3, 0.0, 0.0, -0.694222, -1.065456, 1.0, "#00ff80"),
        ],
        0.8,
        200,
        false,
    )
}

/// Three equal masses rotating in a triangular formation.
pub fn circular_chain() -> Scenario {
    scenario(
        vec![
            body(1, 1.0, 0.0, 0.0, 0.816, 1.0, "#ff4500"),
            body(2, -0.5, 0.866, -0.707, -0.408, 1.0, "#4169e1"),
            body(3, -0.5, -0.866, 0.707, -0.408, 1.0, "#00ff7f"),
        ],
        0.8,
        200,
        false,
    )
}

/// Three-leaf clover pattern.
pub fn trefoil() -> Scenario {
    scenario(
        vec![
            body(1, -1.05, 0.0, 0.2, 0.6, 1.0, "#ff6b35"),
            body(2, 0.525, 0.909, -0.5, -0.1, 1.0, "#4ecdc4"),
            body(3, 0.525, -0.909, 0.3, -0.5, 1.0, "#a8e6cf"),
        ],
        0.9,
        400,
        false,
    )
}

/// Periodic orbit from Broucke's family of solutions.
pub fn broucke() -> Scenario {
    scenario(
        vec![
            body(1, 0.306893, 0.125507, -0.711203, 0.442351, 1.0, "#ff1744"),
            body(2, -0.306893, -0.125507, -0.711203, 0.442351, 1.0, "#2979ff"),
            body(3, 0.0, 0.0, 1.422406, -0.884702, 1.0, "#00e676"),
        ],
        0.7,
        250,
        false,
    )
}

/// Flower-like pattern with multiple petals.
pub fn goerli() -> Scenario {
    scenario(
        vec![
            body(1, -0.51394, 0.88984, 0.37415, 0.21605, 1.0, "#e91e63"),
            body(2, 1.02787, 0.0, 0.37415, 0.21605, 1.0, "#9c27b0"),
            body(3, -0.51394, -0.88984, -0.7483, -0.4321, 1.0, "#3f51b5"),
        ],
        0.6,
        350,
        false,
    )
}

/// Infinity-symbol pattern.
pub fn infinity() -> Scenario {
    scenario(
        vec![
            body(1, -0.8, 0.6, 0.1, -0.4, 1.0, "#ff5722"),
            body(2, 0.8, -0.6, 0.1, -0.4, 1.0, "#00bcd4"),
            body(3, 0.0, 0.0, -0.2, 0.8, 1.0, "#8bc34a"),
        ],
        0.8,
        200,
        false,
    )
}

/// Spiral and rosette patterns with unequal masses.
pub fn spiral() -> Scenario {
    scenario(
        vec![
            body(1, -0.3, 0.7, -0.6, -0.2, 1.2, "#ff9800"),
            body(2, 0.9, -0.1, 0.1, 0.7, 0.8, "#673ab7"),
            body(3, -0.6, -0.6, 0.5, -0.5, 1.0, "#009688"),
        ],
        0.5,
        500,
        false,
    )
}

/// The full preset registry, keyed by id, in definition order.
pub fn all() -> IndexMap<&'static str, Preset> {
    let presets = [
        Preset {
            id: "figure-eight",
            name: "Figure Eight",
            category: Category::StableOrbits,
            scenario: figure_eight(),
        },
        Preset {
            id: "lagrange-points",
            name: "Lagrange Points",
            category: Category::Equilibrium,
            scenario: lagrange_points(),
        },
        Preset {
            id: "butterfly",
            name: "Butterfly",
            category: Category::Chaotic,
            scenario: butterfly(),
        },
        Preset {
            id: "circular-chain",
            name: "Circular Chain",
            category: Category::Periodic,
            scenario: circular_chain(),
        },
        Preset {
            id: "trefoil",
            name: "Trefoil",
            category: Category::Periodic,
            scenario: trefoil(),
        },
        Preset {
            id: "broucke",
            name: "Broucke Orbit",
            category: Category::Periodic,
            scenario: broucke(),
        },
        Preset {
            id: "goerli",
            name: "Goerli Flower",
            category: Category::Periodic,
            scenario: goerli(),
        },
        Preset {
            id: "infinity",
            name: "Infinity Symbol",
            category: Category::Periodic,
            scenario: infinity(),
        },
        Preset {
            id: "spiral",
            name: "Spiral Dance",
            category: Category::Chaotic,
            scenario: spiral(),
        },
    ];
    presets.into_iter().map(|p| (p.id, p)).collect()
}

/// Presets belonging to a category, in registry order.
pub fn by_category(category: Category) -> Vec<Preset> {
    all().into_iter()
        .map(|(_, p)| p)
        .filter(|p| p.category == category)
        .collect()
}

/// The distinct categories present in the registry, in first-seen order.
pub fn categories() -> Vec<Category> {
    let mut seen = Vec::new();
    for preset in all().values() {
        if !seen.contains(&preset.category) {
            seen.push(preset.category);
        }
    }
    seen
}
