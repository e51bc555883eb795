//! Control and state-publication messages for the driver boundary.
//!
//! These are the only message types that cross the compute/display
//! boundary. They serialize to the same wire shapes whether the driver
//! runs in-process or on a remote peer.

use serde::{Deserialize, Serialize};

use crate::body::Body;

/// Inbound control message for a simulation driver.
///
/// Wire form is externally tagged snake_case, e.g. `{"type": "start"}`
/// or `{"type": "set_time_speed", "timeSpeed": 2.0}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlCommand {
    /// Begin stepping. No-op if already running.
    Start,
    /// Stop scheduling further steps. Current state is retained as-is.
    /// No-op if not running.
    Pause,
    /// Restore the checkpoint, zero the iteration counter, and publish
    /// the restored state once.
    Reset,
    /// Replace the current body collection. Also replaces the reset
    /// checkpoint unless the driver is running.
    SetBodies {
        /// The replacement body collection.
        bodies: Vec<Body>,
    },
    /// Replace the reset checkpoint without touching the live bodies.
    /// Used when a session is handed off between hosts.
    SetCheckpoint {
        /// The replacement checkpoint.
        bodies: Vec<Body>,
    },
    /// Update the time-acceleration multiplier applied to subsequent
    /// steps. Takes effect at the next tick boundary.
    SetTimeSpeed {
        /// The new multiplier.
        #[serde(rename = "timeSpeed")]
        time_speed: f64,
    },
}

/// Outbound state publication from a driver to its observers.
///
/// Published once per completed cadence tick while running, and once
/// after a reset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    /// The body collection after the tick, in insertion order.
    pub bodies: Vec<Body>,
    /// Completed sub-steps since the last reset or configuration load.
    pub iterations: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_commands_serialize_to_bare_tags() {
        let json = serde_json::to_value(&ControlCommand::Start).unwrap();
        assert_eq!(json["type"], "start");
        let json = serde_json::to_value(&ControlCommand::Pause).unwrap();
        assert_eq!(json["type"], "pause");
        let json = serde_json::to_value(&ControlCommand::Reset).unwrap();
        assert_eq!(json["type"], "reset");
    }

    #[test]
    fn set_time_speed_uses_camel_case_payload_key() {
        let cmd = ControlCommand::SetTimeSpeed { time_speed: 2.5 };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "set_time_speed");
        assert_eq!(json["timeSpeed"], 2.5);
    }

    #[test]
    fn set_bodies_round_trips() {
        let cmd = ControlCommand::SetBodies {
            bodies: vec![Body::new(1u32, 0.0, 0.0, 0.0, 0.0, 1.0, "#fff")],
        };
        let json = serde_json::to_string(&cmd).unwrap();
        let back: ControlCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn set_checkpoint_serializes_with_snake_case_tag() {
        let cmd = ControlCommand::SetCheckpoint {
            bodies: vec![Body::new(3u32, 0.0, 1.0, 0.0, 0.0, 1.0, "#00f")],
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "set_checkpoint");
        assert_eq!(json["bodies"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn state_update_round_trips() {
        let update = StateUpdate {
            bodies: vec![Body::new(2u32, 1.0, -1.0, 0.5, 0.5, 2.0, "#0f0")],
            iterations: 125,
        };
        let json = serde_json::to_string(&update).unwrap();
        let back: StateUpdate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, update);
    }
}
