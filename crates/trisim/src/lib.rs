//! Trisim: a planar three-body gravity simulator.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Trisim sub-crates. For most users, adding `trisim` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use trisim::prelude::*;
//! use trisim::scenario::presets;
//!
//! // Step the figure-eight orbit without any threads.
//! let bodies = presets::figure_eight().bodies;
//! let after = trisim::physics::multi_step(&bodies, 1.0, 5);
//! assert_eq!(after.len(), 3);
//!
//! // Or drive it through a session with a background tick thread.
//! let mut session = LocalSession::spawn(SessionConfig::new(bodies)).unwrap();
//! let updates = session.subscribe().unwrap();
//! session.start().unwrap();
//! let update = updates.recv().unwrap();
//! assert!(update.iterations > 0);
//! session.shutdown();
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `trisim-core` | [`types::Body`], control and update messages |
//! | [`physics`] | `trisim-physics` | RK4 integrator and conservation diagnostics |
//! | [`scenario`] | `trisim-scenario` | JSON import/export and the preset library |
//! | [`engine`] | `trisim-engine` | Driver, sessions, transports, mode switching |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Body and message types (`trisim-core`).
///
/// Contains [`types::Body`], [`types::BodyId`], and the
/// [`types::ControlCommand`] / [`types::StateUpdate`] vocabulary both
/// deployment modes speak.
pub use trisim_core as types;

/// RK4 integrator and diagnostics (`trisim-physics`).
///
/// Pure functions over body slices: [`physics::step`],
/// [`physics::multi_step`], and the conservation checks in
/// [`physics::diagnostics`].
pub use trisim_physics as physics;

/// Scenario exchange format and presets (`trisim-scenario`).
///
/// [`scenario::Scenario`] is the persisted JSON unit;
/// [`scenario::presets`] holds the built-in orbit library.
pub use trisim_scenario as scenario;

/// Driver and deployment modes (`trisim-engine`).
///
/// [`engine::LocalSession`] for in-process stepping,
/// [`engine::RemoteSession`] for a driver behind a transport, and
/// [`engine::switch_session`] to move between them.
pub use trisim_engine as engine;

/// Common imports for typical Trisim usage.
///
/// ```rust
/// use trisim::prelude::*;
/// ```
///
/// This imports the most frequently used types: the body type, the
/// message vocabulary, session handles, and their configuration.
pub mod prelude {
    // Core types
    pub use trisim_core::{Body, BodyId, ControlCommand, StateUpdate};

    // Scenario exchange
    pub use trisim_scenario::{Scenario, ScenarioError};

    // Engine
    pub use trisim_engine::{
        switch_session, BackoffConfig, ConfigError, LocalSession, RemoteHost, RemoteSession,
        Session, SessionConfig, SessionError, SessionState,
    };
}
