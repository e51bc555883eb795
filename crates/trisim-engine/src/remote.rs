//! Remote deployment mode: the driver runs on a compute peer and this
//! process mirrors it.
//!
//! # Architecture
//!
//! ```text
//! User Thread         Link Thread ("trisim-link")      Compute Peer ("trisim-host")
//!     |                    |                                |
//!     |--control()-------->| apply to mirror                |
//!     |  [bounded(64)]     | transport.send(cmd) ---------->| driver.apply(cmd)
//!     |                    |                                | driver.tick()
//!     |<--updates----------| transport.try_recv() <---------| updates.send(...)
//!     |                    | mirror.bodies/iterations       |
//!     |--snapshot()        |                                |
//!     |   (reads mirror,   |                                |
//!     |    no round trip)  |                                |
//! ```
//!
//! The link thread owns the transport. When it drops, the thread
//! reconnects through the [`Connector`] with exponential backoff and
//! replays the mirrored intent (bodies, checkpoint, speed, run flag)
//! so the peer converges on what the user last asked for. Commands
//! issued while disconnected land in the mirror and are covered by
//! that replay; a dead peer degrades the session, it never panics it.

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};

use trisim_core::{ControlCommand, StateUpdate};

use crate::config::{BackoffConfig, ConfigError, SessionConfig};
use crate::driver::Driver;
use crate::session::{Session, SessionError, SessionState};

// ── TransportError ─────────────────────────────────────────────────

/// Errors from the transport layer.
#[derive(Debug, PartialEq, Eq)]
pub enum TransportError {
    /// The connector could not reach the peer.
    ConnectFailed {
        /// Description of the failure.
        reason: String,
    },
    /// The link to the peer is gone.
    Disconnected,
    /// A command could not be delivered.
    SendFailed {
        /// Description of the failure.
        reason: String,
    },
    /// Every configured connection attempt failed.
    AttemptsExhausted {
        /// How many attempts were made.
        attempts: u32,
    },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed { reason } => write!(f, "connect failed: {reason}"),
            Self::Disconnected => write!(f, "peer disconnected"),
            Self::SendFailed { reason } => write!(f, "send failed: {reason}"),
            Self::AttemptsExhausted { attempts } => {
                write!(f, "gave up after {attempts} connection attempts")
            }
        }
    }
}

impl Error for TransportError {}

// ── Transport / Connector ──────────────────────────────────────────

/// One established, bidirectional link to a compute peer.
pub trait Transport: Send {
    /// Deliver one control command to the peer.
    fn send(&mut self, cmd: &ControlCommand) -> Result<(), TransportError>;

    /// Poll for the next state update from the peer.
    ///
    /// `Ok(None)` means no update is pending; `Err` means the link is
    /// dead and the session should reconnect.
    fn try_recv(&mut self) -> Result<Option<StateUpdate>, TransportError>;
}

/// Factory for [`Transport`] links, called on every (re)connect.
pub trait Connector: Send {
    /// Establish a fresh link to the peer.
    fn connect(&mut self) -> Result<Box<dyn Transport>, TransportError>;
}

// ── In-process channel transport ───────────────────────────────────

/// Compute-peer end of an in-process link: commands in, updates out.
pub struct HostEndpoint {
    /// Inbound control commands from the session.
    pub commands: Receiver<ControlCommand>,
    /// Outbound state updates to the session.
    pub updates: Sender<StateUpdate>,
}

/// Session end of an in-process link.
pub struct ChannelTransport {
    tx: Sender<ControlCommand>,
    rx: Receiver<StateUpdate>,
}

/// A connected in-process link: one end for a [`RemoteHost`], one for
/// a [`RemoteSession`] (or a [`Connector`] that hands it out).
pub fn channel_pair() -> (HostEndpoint, ChannelTransport) {
    let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
    let (update_tx, update_rx) = crossbeam_channel::unbounded();
    (
        HostEndpoint {
            commands: cmd_rx,
            updates: update_tx,
        },
        ChannelTransport {
            tx: cmd_tx,
            rx: update_rx,
        },
    )
}

impl Transport for ChannelTransport {
    fn send(&mut self, cmd: &ControlCommand) -> Result<(), TransportError> {
        self.tx
            .send(cmd.clone())
            .map_err(|_| TransportError::Disconnected)
    }

    fn try_recv(&mut self) -> Result<Option<StateUpdate>, TransportError> {
        match self.rx.try_recv() {
            Ok(update) => Ok(Some(update)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Disconnected),
        }
    }
}

// ── RemoteHost ─────────────────────────────────────────────────────

/// Compute-side peer: a driver ticking on its own thread, fed from a
/// [`HostEndpoint`].
///
/// A vanished session only makes update sends fail; the host keeps
/// stepping so a reconnecting session finds the simulation where it
/// would have been.
pub struct RemoteHost {
    shutdown_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<Driver>>,
}

struct HostLoop {
    driver: Driver,
    endpoint: HostEndpoint,
    shutdown_flag: Arc<AtomicBool>,
    tick_budget: Duration,
}

impl HostLoop {
    fn run(mut self) -> Driver {
        loop {
            if self.shutdown_flag.load(Ordering::Acquire) {
                break;
            }
            let tick_start = Instant::now();

            while let Ok(cmd) = self.endpoint.commands.try_recv() {
                if let Some(update) = self.driver.apply(cmd) {
                    let _ = self.endpoint.updates.send(update);
                }
            }
            if let Some(update) = self.driver.tick() {
                let _ = self.endpoint.updates.send(update);
            }

            let elapsed = tick_start.elapsed();
            if let Some(remaining) = self.tick_budget.checked_sub(elapsed) {
                thread::park_timeout(remaining);
            }
        }
        self.driver
    }
}

impl RemoteHost {
    /// Validate the configuration and spawn the host tick thread.
    pub fn spawn(config: SessionConfig, endpoint: HostEndpoint) -> Result<Self, ConfigError> {
        config.validate()?;
        let tick_budget = config.tick_budget();
        let driver = Driver::new(config)?;

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let loop_shutdown = Arc::clone(&shutdown_flag);
        let thread = thread::Builder::new()
            .name("trisim-host".into())
            .spawn(move || {
                let state = HostLoop {
                    driver,
                    endpoint,
                    shutdown_flag: loop_shutdown,
                    tick_budget,
                };
                state.run()
            })
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("host thread: {e}"),
            })?;

        Ok(Self {
            shutdown_flag,
            thread: Some(thread),
        })
    }

    /// Stop the host thread and recover its driver. Idempotent;
    /// returns `None` on repeat calls or if the thread panicked.
    pub fn shutdown(&mut self) -> Option<Driver> {
        self.shutdown_flag.store(true, Ordering::Release);
        let handle = self.thread.take()?;
        handle.thread().unpark();
        handle.join().ok()
    }
}

impl Drop for RemoteHost {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ── RemoteSession ──────────────────────────────────────────────────

enum LinkMsg {
    Control(ControlCommand),
    Subscribe(Sender<StateUpdate>),
}

/// A session whose driver runs behind a [`Transport`].
///
/// Holds a mirror of the driver state so `snapshot()` never blocks on
/// the peer: commands update the mirror as intent, inbound updates
/// overwrite it with truth.
pub struct RemoteSession {
    ctrl_tx: Option<Sender<LinkMsg>>,
    shutdown_flag: Arc<AtomicBool>,
    exhausted: Arc<AtomicBool>,
    link_thread: Option<JoinHandle<()>>,
    mirror: Arc<Mutex<SessionState>>,
    max_attempts: Option<u32>,
}

impl RemoteSession {
    /// Validate the configuration and spawn the link thread.
    ///
    /// The first connection happens on the link thread, so this never
    /// blocks on a slow peer. Commands issued before the link is up
    /// are mirrored and replayed once it is.
    pub fn connect(
        connector: Box<dyn Connector>,
        config: SessionConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let poll = config.tick_budget();
        let mirror = Arc::new(Mutex::new(SessionState {
            bodies: config.bodies.clone(),
            checkpoint: config.bodies,
            iterations: 0,
            time_speed: config.time_speed,
            running: false,
        }));

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let exhausted = Arc::new(AtomicBool::new(false));
        let (ctrl_tx, ctrl_rx) = crossbeam_channel::bounded(64);

        let link = LinkLoop {
            connector,
            backoff: config.backoff.clone(),
            mirror: Arc::clone(&mirror),
            ctrl_rx,
            shutdown_flag: Arc::clone(&shutdown_flag),
            exhausted: Arc::clone(&exhausted),
            subscribers: Vec::new(),
            poll,
        };
        let link_thread = thread::Builder::new()
            .name("trisim-link".into())
            .spawn(move || link.run())
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("link thread: {e}"),
            })?;

        Ok(Self {
            ctrl_tx: Some(ctrl_tx),
            shutdown_flag,
            exhausted,
            link_thread: Some(link_thread),
            mirror,
            max_attempts: config.backoff.max_attempts,
        })
    }

    fn send(&self, msg: LinkMsg) -> Result<(), SessionError> {
        if self.exhausted.load(Ordering::Acquire) {
            return Err(SessionError::Transport(TransportError::AttemptsExhausted {
                attempts: self.max_attempts.unwrap_or(0),
            }));
        }
        let ctrl_tx = self.ctrl_tx.as_ref().ok_or(SessionError::Shutdown)?;
        ctrl_tx.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SessionError::ChannelFull,
            TrySendError::Disconnected(_) => SessionError::Shutdown,
        })
    }
}

impl Session for RemoteSession {
    fn control(&mut self, cmd: ControlCommand) -> Result<(), SessionError> {
        self.send(LinkMsg::Control(cmd))
    }

    fn subscribe(&mut self) -> Result<Receiver<StateUpdate>, SessionError> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.send(LinkMsg::Subscribe(tx))?;
        Ok(rx)
    }

    /// Answers from the mirror: the last state the peer reported,
    /// overlaid with any intent queued since. Never blocks on the peer
    /// and keeps working while disconnected.
    fn snapshot(&mut self) -> Result<SessionState, SessionError> {
        Ok(self.mirror.lock().unwrap().clone())
    }

    fn shutdown(&mut self) {
        if self.ctrl_tx.is_none() && self.link_thread.is_none() {
            return;
        }
        self.shutdown_flag.store(true, Ordering::Release);
        self.ctrl_tx.take();
        if let Some(handle) = self.link_thread.take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

impl Drop for RemoteSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ── LinkLoop ───────────────────────────────────────────────────────

struct LinkLoop {
    connector: Box<dyn Connector>,
    backoff: BackoffConfig,
    mirror: Arc<Mutex<SessionState>>,
    ctrl_rx: Receiver<LinkMsg>,
    shutdown_flag: Arc<AtomicBool>,
    exhausted: Arc<AtomicBool>,
    subscribers: Vec<Sender<StateUpdate>>,
    poll: Duration,
}

impl LinkLoop {
    fn run(mut self) {
        let mut transport: Option<Box<dyn Transport>> = None;
        loop {
            if self.shutdown_flag.load(Ordering::Acquire) {
                break;
            }

            if transport.is_none() {
                match self.connect_with_backoff() {
                    Some(t) => transport = Some(t),
                    // Shut down or out of attempts; either way we are done.
                    None => break,
                }
            }

            let mut link_down = false;

            // Forward queued commands. The mirror is updated first so a
            // command lost to a dying link is still covered by the
            // intent replay after reconnect.
            while let Ok(msg) = self.ctrl_rx.try_recv() {
                match msg {
                    LinkMsg::Subscribe(tx) => self.subscribers.push(tx),
                    LinkMsg::Control(cmd) => {
                        apply_intent(&mut self.mirror.lock().unwrap(), &cmd);
                        if let Some(t) = transport.as_mut() {
                            if t.send(&cmd).is_err() {
                                link_down = true;
                            }
                        }
                    }
                }
            }

            // Pump inbound updates into the mirror and out to subscribers.
            if !link_down {
                if let Some(t) = transport.as_mut() {
                    loop {
                        match t.try_recv() {
                            Ok(Some(update)) => {
                                {
                                    let mut m = self.mirror.lock().unwrap();
                                    m.bodies = update.bodies.clone();
                                    m.iterations = update.iterations;
                                }
                                self.publish(update);
                            }
                            Ok(None) => break,
                            Err(_) => {
                                link_down = true;
                                break;
                            }
                        }
                    }
                }
            }

            if link_down {
                transport = None;
                continue;
            }

            thread::park_timeout(self.poll);
        }

        // Final drain so a command queued just before shutdown (e.g.
        // the pause of a mode switch) still reaches the peer.
        if let Some(t) = transport.as_mut() {
            while let Ok(LinkMsg::Control(cmd)) = self.ctrl_rx.try_recv() {
                apply_intent(&mut self.mirror.lock().unwrap(), &cmd);
                let _ = t.send(&cmd);
            }
        }
    }

    /// Connect through the backoff schedule, replaying mirrored intent
    /// on success. Returns `None` on shutdown or exhausted attempts.
    fn connect_with_backoff(&mut self) -> Option<Box<dyn Transport>> {
        let mut attempt: u32 = 0;
        loop {
            if self.shutdown_flag.load(Ordering::Acquire) {
                return None;
            }
            if let Ok(mut t) = self.connector.connect() {
                if self.replay_intent(t.as_mut()).is_ok() {
                    return Some(t);
                }
                // A link that dies during the replay counts as a
                // failed attempt.
            }
            attempt += 1;
            if let Some(max) = self.backoff.max_attempts {
                if attempt >= max {
                    self.exhausted.store(true, Ordering::Release);
                    return None;
                }
            }
            self.interruptible_sleep(self.backoff.delay_for(attempt - 1));
        }
    }

    /// Push the mirrored intent to a fresh link so the peer converges
    /// on what the user last asked for.
    fn replay_intent(&self, t: &mut dyn Transport) -> Result<(), TransportError> {
        let state = self.mirror.lock().unwrap().clone();
        t.send(&ControlCommand::SetBodies {
            bodies: state.bodies,
        })?;
        t.send(&ControlCommand::SetCheckpoint {
            bodies: state.checkpoint,
        })?;
        t.send(&ControlCommand::SetTimeSpeed {
            time_speed: state.time_speed,
        })?;
        if state.running {
            t.send(&ControlCommand::Start)?;
        } else {
            t.send(&ControlCommand::Pause)?;
        }
        Ok(())
    }

    fn publish(&mut self, update: StateUpdate) {
        self.subscribers.retain(|tx| tx.send(update.clone()).is_ok());
    }

    /// Sleep in short slices so shutdown cuts a long backoff delay.
    fn interruptible_sleep(&self, total: Duration) {
        let deadline = Instant::now() + total;
        loop {
            if self.shutdown_flag.load(Ordering::Acquire) {
                return;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return;
            }
            thread::park_timeout(remaining.min(Duration::from_millis(10)));
        }
    }
}

/// Fold one command into the mirrored state, matching what the peer's
/// driver will do with it.
fn apply_intent(state: &mut SessionState, cmd: &ControlCommand) {
    match cmd {
        ControlCommand::Start => state.running = true,
        ControlCommand::Pause => state.running = false,
        ControlCommand::Reset => {
            state.bodies = state.checkpoint.clone();
            state.iterations = 0;
            state.running = false;
        }
        ControlCommand::SetBodies { bodies } => {
            if !state.running {
                state.checkpoint = bodies.clone();
                state.iterations = 0;
            }
            state.bodies = bodies.clone();
        }
        ControlCommand::SetCheckpoint { bodies } => {
            state.checkpoint = bodies.clone();
        }
        ControlCommand::SetTimeSpeed { time_speed } => {
            state.time_speed = *time_speed;
        }
    }
}
