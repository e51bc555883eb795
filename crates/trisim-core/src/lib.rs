//! Core types for the Trisim three-body simulation.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the [`Body`] record that every other crate operates on, plus the
//! control-message and state-publication types exchanged between a
//! simulation driver and its observers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod body;
pub mod message;

pub use body::{Body, BodyId};
pub use message::{ControlCommand, StateUpdate};
