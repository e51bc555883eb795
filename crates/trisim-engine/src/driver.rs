//! The simulation driver: run-state machine, iteration counter, and
//! checkpoint handling.
//!
//! [`Driver`] owns the body list and advances it through
//! [`trisim_physics::multi_step`] when (and only when) it is
//! [`RunState::Running`]. It is deliberately free of threads and
//! timers: [`LocalSession`](crate::local::LocalSession) and
//! [`RemoteHost`](crate::remote::RemoteHost) decide *when* to call
//! [`tick()`](Driver::tick); the driver decides *what* a tick does.

use trisim_core::{Body, ControlCommand, StateUpdate};
use trisim_physics::multi_step;

use crate::config::{ConfigError, SessionConfig};
use crate::session::SessionState;

// ── RunState ───────────────────────────────────────────────────────

/// Lifecycle state of the driver.
///
/// `Idle → Running ⇄ Paused`, with `reset()` returning to `Idle` from
/// any state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Not started, or reset. The checkpoint equals the live bodies.
    Idle,
    /// Ticks advance the simulation.
    Running,
    /// Ticks are ignored; all state is retained.
    Paused,
}

// ── Driver ─────────────────────────────────────────────────────────

/// Simulation driver for one body system.
pub struct Driver {
    bodies: Vec<Body>,
    /// Restored by `reset()`. Updated only while not running.
    checkpoint: Vec<Body>,
    iterations: u64,
    time_speed: f64,
    sub_steps: u32,
    state: RunState,
}

impl Driver {
    /// Construct a driver from a validated configuration.
    ///
    /// The configured bodies become both the live state and the reset
    /// checkpoint.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let checkpoint = config.bodies.clone();
        Ok(Self {
            bodies: config.bodies,
            checkpoint,
            iterations: 0,
            time_speed: config.time_speed,
            sub_steps: config.sub_steps,
            state: RunState::Idle,
        })
    }

    /// Apply one control command.
    ///
    /// Returns a [`StateUpdate`] for commands that must publish even
    /// while the driver is not ticking (currently only `Reset`).
    pub fn apply(&mut self, cmd: ControlCommand) -> Option<StateUpdate> {
        match cmd {
            ControlCommand::Start => {
                self.start();
                None
            }
            ControlCommand::Pause => {
                self.pause();
                None
            }
            ControlCommand::Reset => Some(self.reset()),
            ControlCommand::SetBodies { bodies } => {
                self.load_bodies(bodies);
                None
            }
            ControlCommand::SetCheckpoint { bodies } => {
                self.set_checkpoint(bodies);
                None
            }
            ControlCommand::SetTimeSpeed { time_speed } => {
                self.set_time_speed(time_speed);
                None
            }
        }
    }

    /// Begin (or resume) stepping.
    pub fn start(&mut self) {
        self.state = RunState::Running;
    }

    /// Stop stepping, retaining all state. No-op when idle.
    pub fn pause(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::Paused;
        }
    }

    /// Restore the checkpoint, zero the iteration counter, and return
    /// to [`RunState::Idle`].
    ///
    /// The returned update carries the restored state and must be
    /// published exactly once, even when the driver was paused or idle.
    pub fn reset(&mut self) -> StateUpdate {
        self.bodies = self.checkpoint.clone();
        self.iterations = 0;
        self.state = RunState::Idle;
        StateUpdate {
            bodies: self.bodies.clone(),
            iterations: 0,
        }
    }

    /// Replace the live body list.
    ///
    /// While not running this is a new configuration load: the
    /// checkpoint follows the new bodies and the iteration counter
    /// restarts. While running it is a live edit: the checkpoint and
    /// counter are left alone so `reset()` still returns to the state
    /// the run began from.
    pub fn load_bodies(&mut self, bodies: Vec<Body>) {
        if self.state != RunState::Running {
            self.checkpoint = bodies.clone();
            self.iterations = 0;
        }
        self.bodies = bodies;
    }

    /// Replace the reset checkpoint without touching the live bodies.
    pub fn set_checkpoint(&mut self, bodies: Vec<Body>) {
        self.checkpoint = bodies;
    }

    /// Change the time speed multiplier. Takes effect on the next tick.
    pub fn set_time_speed(&mut self, time_speed: f64) {
        self.time_speed = time_speed;
    }

    /// Advance one tick.
    ///
    /// Runs the configured number of integration sub-steps and returns
    /// the resulting update. Returns `None` when the driver is idle or
    /// paused; a skipped tick leaves no trace.
    pub fn tick(&mut self) -> Option<StateUpdate> {
        if self.state != RunState::Running {
            return None;
        }
        self.bodies = multi_step(&self.bodies, self.time_speed, self.sub_steps);
        self.iterations += u64::from(self.sub_steps);
        Some(StateUpdate {
            bodies: self.bodies.clone(),
            iterations: self.iterations,
        })
    }

    /// A copy of the full driver state.
    pub fn snapshot(&self) -> SessionState {
        SessionState {
            bodies: self.bodies.clone(),
            checkpoint: self.checkpoint.clone(),
            iterations: self.iterations,
            time_speed: self.time_speed,
            running: self.state == RunState::Running,
        }
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The live body list.
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// The reset checkpoint.
    pub fn checkpoint(&self) -> &[Body] {
        &self.checkpoint
    }

    /// Sub-steps performed since construction, the last reset, or the
    /// last configuration load.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Current time speed multiplier.
    pub fn time_speed(&self) -> f64 {
        self.time_speed
    }
}
