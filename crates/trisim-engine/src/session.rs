//! The deployment-mode seam: the [`Session`] trait and mode switching.
//!
//! A session fronts a running driver, wherever it lives. Callers hold
//! a `Box<dyn Session>` and never learn whether commands are applied
//! by a thread in this process ([`LocalSession`](crate::local::LocalSession))
//! or forwarded to a compute peer ([`RemoteSession`](crate::remote::RemoteSession)).

use std::error::Error;
use std::fmt;

use crossbeam_channel::Receiver;

use trisim_core::{Body, ControlCommand, StateUpdate};

use crate::config::ConfigError;
use crate::remote::TransportError;

// ── SessionState ───────────────────────────────────────────────────

/// A point-in-time copy of a driver's full state.
///
/// Carried across mode switches so the new session resumes where the
/// old one stopped.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    /// The live body list.
    pub bodies: Vec<Body>,
    /// The reset checkpoint.
    pub checkpoint: Vec<Body>,
    /// Sub-steps performed since the last reset or configuration load.
    pub iterations: u64,
    /// Current time speed multiplier.
    pub time_speed: f64,
    /// Whether the driver was stepping when the snapshot was taken.
    pub running: bool,
}

// ── SessionError ───────────────────────────────────────────────────

/// Errors surfaced by session operations.
#[derive(Debug)]
pub enum SessionError {
    /// The session has shut down (or its worker thread is gone).
    Shutdown,
    /// The command channel is full (back-pressure).
    ChannelFull,
    /// Session construction failed validation.
    Config(ConfigError),
    /// The remote transport failed permanently.
    Transport(TransportError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shutdown => write!(f, "session has shut down"),
            Self::ChannelFull => write!(f, "command channel full"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<TransportError> for SessionError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ── Session ────────────────────────────────────────────────────────

/// A handle to a running driver, local or remote.
///
/// Commands are asynchronous: they are queued and applied at the next
/// tick boundary. State flows back through [`subscribe`](Session::subscribe)
/// receivers; [`snapshot`](Session::snapshot) answers synchronously
/// with the most recent known state.
pub trait Session: Send {
    /// Queue one control command.
    fn control(&mut self, cmd: ControlCommand) -> Result<(), SessionError>;

    /// Register a new state-update receiver.
    ///
    /// The receiver sees every update published after registration.
    /// Dropping it unregisters it.
    fn subscribe(&mut self) -> Result<Receiver<StateUpdate>, SessionError>;

    /// The most recent known driver state.
    fn snapshot(&mut self) -> Result<SessionState, SessionError>;

    /// Stop the session and release its threads. Idempotent.
    fn shutdown(&mut self);

    /// Queue a `Start` command.
    fn start(&mut self) -> Result<(), SessionError> {
        self.control(ControlCommand::Start)
    }

    /// Queue a `Pause` command.
    fn pause(&mut self) -> Result<(), SessionError> {
        self.control(ControlCommand::Pause)
    }

    /// Queue a `Reset` command.
    fn reset(&mut self) -> Result<(), SessionError> {
        self.control(ControlCommand::Reset)
    }

    /// Queue a `SetBodies` command.
    fn set_bodies(&mut self, bodies: Vec<Body>) -> Result<(), SessionError> {
        self.control(ControlCommand::SetBodies { bodies })
    }

    /// Queue a `SetCheckpoint` command.
    fn set_checkpoint(&mut self, bodies: Vec<Body>) -> Result<(), SessionError> {
        self.control(ControlCommand::SetCheckpoint { bodies })
    }

    /// Queue a `SetTimeSpeed` command.
    fn set_time_speed(&mut self, time_speed: f64) -> Result<(), SessionError> {
        self.control(ControlCommand::SetTimeSpeed { time_speed })
    }
}

// ── switch_session ─────────────────────────────────────────────────

/// Tear down one session and stand up another with the same state.
///
/// The old session is paused and drained before the new one exists, so
/// at no point do two steppers advance the same system. The new
/// session inherits the body list (via the builder's config), the
/// checkpoint, and the run flag: if the old session was running, the
/// new one starts. The iteration counter restarts, as for any new
/// configuration load.
pub fn switch_session<F>(
    mut old: Box<dyn Session>,
    build: F,
) -> Result<Box<dyn Session>, SessionError>
where
    F: FnOnce(&SessionState) -> Result<Box<dyn Session>, SessionError>,
{
    let was_running = old.snapshot()?.running;
    old.pause()?;
    // Snapshot again after the pause has landed so the bodies are final.
    let state = old.snapshot()?;
    old.shutdown();

    let mut new = build(&state)?;
    new.set_checkpoint(state.checkpoint.clone())?;
    if was_running {
        new.start()?;
    }
    Ok(new)
}
