//! Local deployment mode: driver and stepping timer in this process.
//!
//! # Architecture
//!
//! ```text
//! User Thread                  Tick Thread ("trisim-tick")
//!     |                            |
//!     |--control()---------------->| cmd_rx.try_recv() (drained per tick)
//!     |   [cmd_tx: bounded(64)]    | driver.apply(cmd)
//!     |--subscribe()-------------->| subscribers.push(tx)
//!     |<--updates via Receiver-----| driver.tick() -> publish
//!     |--snapshot()--------------->| reply_tx.send(driver.snapshot())
//!     |<--reply (bounded(1))-------|
//!     |                            | park_timeout(budget - elapsed)
//! ```
//!
//! Commands are applied at tick boundaries, so a `Pause` sent mid-tick
//! takes effect before the next step. Shutdown sets a flag and unparks
//! the thread, which returns the [`Driver`] through its `JoinHandle`;
//! snapshots keep working against the recovered driver afterwards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use trisim_core::{ControlCommand, StateUpdate};

use crate::config::{ConfigError, SessionConfig};
use crate::driver::Driver;
use crate::session::{Session, SessionError, SessionState};

// ── Loop messages ──────────────────────────────────────────────────

enum LoopMsg {
    Control(ControlCommand),
    Subscribe(Sender<StateUpdate>),
    Snapshot(Sender<SessionState>),
}

// ── TickLoop ───────────────────────────────────────────────────────

struct TickLoop {
    driver: Driver,
    cmd_rx: Receiver<LoopMsg>,
    shutdown_flag: Arc<AtomicBool>,
    tick_budget: Duration,
    subscribers: Vec<Sender<StateUpdate>>,
}

impl TickLoop {
    /// Run until shutdown, returning the driver for post-mortem reads.
    fn run(mut self) -> Driver {
        loop {
            if self.shutdown_flag.load(Ordering::Acquire) {
                break;
            }
            let tick_start = Instant::now();

            self.drain_messages();
            if let Some(update) = self.driver.tick() {
                self.publish(update);
            }

            // park_timeout instead of sleep so shutdown's unpark()
            // wakes the thread immediately regardless of tick rate.
            let elapsed = tick_start.elapsed();
            if let Some(remaining) = self.tick_budget.checked_sub(elapsed) {
                thread::park_timeout(remaining);
            }
        }
        self.driver
    }

    fn drain_messages(&mut self) {
        while let Ok(msg) = self.cmd_rx.try_recv() {
            match msg {
                LoopMsg::Control(cmd) => {
                    if let Some(update) = self.driver.apply(cmd) {
                        self.publish(update);
                    }
                }
                LoopMsg::Subscribe(tx) => self.subscribers.push(tx),
                LoopMsg::Snapshot(reply) => {
                    let _ = reply.send(self.driver.snapshot());
                }
            }
        }
    }

    /// Fan out to all subscribers, dropping the ones that have gone away.
    fn publish(&mut self, update: StateUpdate) {
        self.subscribers.retain(|tx| tx.send(update.clone()).is_ok());
    }
}

// ── LocalSession ───────────────────────────────────────────────────

/// A session whose driver runs on a background thread in this process.
pub struct LocalSession {
    cmd_tx: Option<Sender<LoopMsg>>,
    shutdown_flag: Arc<AtomicBool>,
    tick_thread: Option<JoinHandle<Driver>>,
    /// Recovered from the tick thread on shutdown, so `snapshot()`
    /// still answers after the session stops.
    recovered: Option<Driver>,
}

impl LocalSession {
    /// Validate the configuration and spawn the tick thread.
    pub fn spawn(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let tick_budget = config.tick_budget();
        let driver = Driver::new(config)?;

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        // Command channel: bounded(64), drained every tick.
        let (cmd_tx, cmd_rx) = crossbeam_channel::bounded(64);

        let loop_shutdown = Arc::clone(&shutdown_flag);
        let tick_thread = thread::Builder::new()
            .name("trisim-tick".into())
            .spawn(move || {
                let state = TickLoop {
                    driver,
                    cmd_rx,
                    shutdown_flag: loop_shutdown,
                    tick_budget,
                    subscribers: Vec::new(),
                };
                state.run()
            })
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("tick thread: {e}"),
            })?;

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            shutdown_flag,
            tick_thread: Some(tick_thread),
            recovered: None,
        })
    }

    fn send(&self, msg: LoopMsg) -> Result<(), SessionError> {
        let cmd_tx = self.cmd_tx.as_ref().ok_or(SessionError::Shutdown)?;
        cmd_tx.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SessionError::ChannelFull,
            TrySendError::Disconnected(_) => SessionError::Shutdown,
        })
    }
}

impl Session for LocalSession {
    fn control(&mut self, cmd: ControlCommand) -> Result<(), SessionError> {
        self.send(LoopMsg::Control(cmd))
    }

    fn subscribe(&mut self) -> Result<Receiver<StateUpdate>, SessionError> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.send(LoopMsg::Subscribe(tx))?;
        Ok(rx)
    }

    fn snapshot(&mut self) -> Result<SessionState, SessionError> {
        if self.cmd_tx.is_none() {
            // Shut down: answer from the recovered driver.
            return self
                .recovered
                .as_ref()
                .map(Driver::snapshot)
                .ok_or(SessionError::Shutdown);
        }
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        self.send(LoopMsg::Snapshot(reply_tx))?;
        // Wake the loop if it is parked in its budget sleep.
        if let Some(handle) = &self.tick_thread {
            handle.thread().unpark();
        }
        reply_rx.recv().map_err(|_| SessionError::Shutdown)
    }

    fn shutdown(&mut self) {
        if self.cmd_tx.is_none() && self.tick_thread.is_none() {
            return;
        }
        self.shutdown_flag.store(true, Ordering::Release);
        self.cmd_tx.take();
        if let Some(handle) = self.tick_thread.take() {
            handle.thread().unpark();
            if let Ok(driver) = handle.join() {
                self.recovered = Some(driver);
            }
        }
    }
}

impl Drop for LocalSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
