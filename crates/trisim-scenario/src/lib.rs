//! Configuration exchange format and preset library for Trisim.
//!
//! A [`Scenario`] bundles a body list with simulation parameters and is
//! the persisted/exchanged unit: exporting then importing reproduces an
//! equivalent body list and speed. Import validation is field-level and
//! happens before any simulation state changes.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod presets;
pub mod scenario;

pub use presets::{Category, Preset};
pub use scenario::{Scenario, ScenarioError};
