//! RK4 gravitational integrator core for Trisim.
//!
//! Pure functions of `(bodies, dt)` — no I/O, no timers, no state.
//! The integrator is safe to call concurrently for different body
//! collections; serializing calls against a single collection is the
//! driver's job, not this crate's.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod diagnostics;
pub mod integrator;

pub use integrator::{
    accelerations, derivatives, multi_step, step, Accel, Derivative, BASE_DT, DEFAULT_SUB_STEPS, G,
    MIN_SEPARATION,
};
