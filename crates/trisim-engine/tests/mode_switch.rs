//! Integration test: switching a live system between deployment modes.
//!
//! `switch_session` must stop the old stepper before the new one
//! exists, carry the bodies and checkpoint across, and restart only if
//! the old session was running.

use std::time::{Duration, Instant};

use trisim_core::Body;
use trisim_engine::{
    channel_pair, Connector, LocalSession, RemoteHost, RemoteSession, Session, SessionConfig,
    SessionState, switch_session, Transport, TransportError,
};
use trisim_scenario::presets;

fn test_config(bodies: Vec<Body>) -> SessionConfig {
    let mut cfg = SessionConfig::new(bodies);
    cfg.tick_rate_hz = 200.0;
    cfg
}

/// Hands out a single pre-wired transport, then fails forever.
struct OneShotConnector(Option<Box<dyn Transport>>);

impl Connector for OneShotConnector {
    fn connect(&mut self) -> Result<Box<dyn Transport>, TransportError> {
        self.0.take().ok_or(TransportError::ConnectFailed {
            reason: "peer gone".into(),
        })
    }
}

/// Build a remote session (with its own in-process host) resuming from
/// the given state.
fn remote_from(state: &SessionState) -> (RemoteHost, RemoteSession) {
    let mut cfg = test_config(state.bodies.clone());
    cfg.time_speed = state.time_speed;
    let (endpoint, transport) = channel_pair();
    let host = RemoteHost::spawn(cfg.clone(), endpoint).unwrap();
    let session =
        RemoteSession::connect(Box::new(OneShotConnector(Some(Box::new(transport)))), cfg).unwrap();
    (host, session)
}

fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        if Instant::now() > deadline {
            panic!("{what} did not happen within 5s");
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn running_local_session_switches_to_remote_and_keeps_going() {
    let initial = presets::figure_eight().bodies;
    let mut local = LocalSession::spawn(test_config(initial.clone())).unwrap();
    local.start().unwrap();
    wait_until("local session stepped", || {
        local.snapshot().unwrap().iterations > 0
    });

    let mut hosts = Vec::new();
    let old: Box<dyn Session> = Box::new(local);
    let mut session = switch_session(old, |state| {
        // The old stepper is already stopped here; its last state is
        // what the new session starts from.
        assert!(state.iterations > 0);
        assert_ne!(state.bodies, initial);
        assert_eq!(state.checkpoint, initial);
        let (host, session) = remote_from(state);
        hosts.push(host);
        Ok(Box::new(session))
    })
    .unwrap();

    // Run flag carried: the remote peer steps without another start().
    let rx = session.subscribe().unwrap();
    let update = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("no update from remote peer after switch");
    assert_eq!(update.bodies.len(), 3);

    // Checkpoint carried: a reset returns to the original bodies, not
    // to the mid-flight state the remote session was born with.
    session.pause().unwrap();
    std::thread::sleep(Duration::from_millis(100));
    while rx.try_recv().is_ok() {}
    session.reset().unwrap();
    let restored = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("no reset publication after switch");
    assert_eq!(restored.bodies, initial);
    assert_eq!(restored.iterations, 0);

    session.shutdown();
}

#[test]
fn paused_session_switches_without_starting() {
    let initial = presets::figure_eight().bodies;
    let mut local = LocalSession::spawn(test_config(initial.clone())).unwrap();
    local.start().unwrap();
    wait_until("local session stepped", || {
        local.snapshot().unwrap().iterations > 0
    });
    local.pause().unwrap();
    wait_until("local session paused", || {
        !local.snapshot().unwrap().running
    });

    let old: Box<dyn Session> = Box::new(local);
    let mut session = switch_session(old, |state| {
        assert!(!state.running);
        Ok(Box::new(LocalSession::spawn(test_config(
            state.bodies.clone(),
        ))?))
    })
    .unwrap();

    let rx = session.subscribe().unwrap();
    assert!(
        rx.recv_timeout(Duration::from_millis(300)).is_err(),
        "paused system started stepping after the switch"
    );
    assert!(!session.snapshot().unwrap().running);

    session.shutdown();
}

#[test]
fn switch_back_to_local_resumes_from_remote_state() {
    let initial = presets::figure_eight().bodies;

    let mut hosts = Vec::new();
    let state = SessionState {
        bodies: initial.clone(),
        checkpoint: initial.clone(),
        iterations: 0,
        time_speed: 1.0,
        running: false,
    };
    let (host, mut remote) = remote_from(&state);
    hosts.push(host);
    remote.start().unwrap();
    wait_until("remote session stepped", || {
        remote.snapshot().unwrap().iterations > 0
    });

    let old: Box<dyn Session> = Box::new(remote);
    let mut session = switch_session(old, |state| {
        let mut cfg = test_config(state.bodies.clone());
        cfg.time_speed = state.time_speed;
        Ok(Box::new(LocalSession::spawn(cfg)?))
    })
    .unwrap();

    wait_until("local session resumed stepping", || {
        session.snapshot().unwrap().iterations > 0
    });
    let snap = session.snapshot().unwrap();
    assert!(snap.running);
    assert_eq!(snap.checkpoint, initial);

    session.shutdown();
}
