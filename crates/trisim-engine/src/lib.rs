//! Simulation driver and deployment modes for Trisim.
//!
//! The [`Driver`] is the pure state machine: run state, iteration
//! counter, checkpoint, and the tick that advances the body system.
//! Everything else in this crate is plumbing that decides *where* the
//! driver runs and *when* it ticks:
//!
//! - [`LocalSession`] steps the driver on a thread in this process.
//! - [`RemoteSession`] mirrors a driver stepped by a compute peer
//!   behind a [`Transport`], reconnecting with backoff when the link
//!   drops.
//! - [`switch_session`] moves a live system between the two without
//!   ever having both step it at once.
//!
//! Both modes speak the same [`ControlCommand`](trisim_core::ControlCommand)
//! / [`StateUpdate`](trisim_core::StateUpdate) vocabulary, so callers
//! program against [`Session`] and stay mode-agnostic.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod driver;
pub mod local;
pub mod remote;
pub mod session;

pub use config::{BackoffConfig, ConfigError, SessionConfig};
pub use driver::{Driver, RunState};
pub use local::LocalSession;
pub use remote::{
    channel_pair, ChannelTransport, Connector, HostEndpoint, RemoteHost, RemoteSession, Transport,
    TransportError,
};
pub use session::{switch_session, Session, SessionError, SessionState};
