//! Session configuration, validation, and error types.
//!
//! [`SessionConfig`] is the builder-input for constructing a session in
//! either deployment mode. [`validate()`](SessionConfig::validate)
//! checks structural invariants at startup; both
//! [`LocalSession::spawn`](crate::local::LocalSession::spawn) and
//! [`RemoteSession::connect`](crate::remote::RemoteSession::connect)
//! call it before spawning any threads.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use trisim_core::Body;
use trisim_physics::DEFAULT_SUB_STEPS;

// ── BackoffConfig ──────────────────────────────────────────────────

/// Configuration for the remote reconnect backoff.
///
/// When the transport to the compute peer drops, the session retries
/// the connection with exponentially growing delays. This struct
/// controls the shape of that backoff curve.
#[derive(Clone, Debug)]
pub struct BackoffConfig {
    /// Delay before the first retry, in milliseconds. Default: 100.
    pub initial_delay_ms: u64,
    /// Upper bound on the retry delay, in milliseconds. Default: 5000.
    pub max_delay_ms: u64,
    /// Multiplicative factor applied on each consecutive failure. Default: 2.0.
    pub factor: f64,
    /// Maximum number of connection attempts before the session gives
    /// up. `None` = retry forever. Default: `None`.
    pub max_attempts: Option<u32>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            factor: 2.0,
            max_attempts: None,
        }
    }
}

impl BackoffConfig {
    /// The delay to wait after the given zero-based failed attempt.
    ///
    /// Grows as `initial * factor^attempt`, capped at `max_delay_ms`.
    /// The exponent is clamped so the multiplication cannot overflow to
    /// infinity before the cap is applied.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.min(64) as i32;
        let raw = self.initial_delay_ms as f64 * self.factor.powi(exp);
        let capped = raw.min(self.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SessionConfig::validate()`].
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Fewer than two bodies configured.
    TooFewBodies {
        /// How many bodies were configured.
        found: usize,
    },
    /// A body has a non-finite coordinate, velocity, or mass.
    NonFiniteBody {
        /// Zero-based index of the offending body.
        index: usize,
    },
    /// A body mass is zero or negative.
    NonPositiveMass {
        /// Zero-based index of the offending body.
        index: usize,
    },
    /// time_speed is NaN, infinite, zero, or negative.
    InvalidTimeSpeed {
        /// The invalid value.
        value: f64,
    },
    /// sub_steps is zero.
    ZeroSubSteps,
    /// tick_rate_hz is NaN, infinite, zero, or negative.
    InvalidTickRate {
        /// The invalid value.
        value: f64,
    },
    /// BackoffConfig invariant violated.
    InvalidBackoff {
        /// Description of which invariant was violated.
        reason: String,
    },
    /// A background thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewBodies { found } => {
                write!(f, "at least 2 bodies required, got {found}")
            }
            Self::NonFiniteBody { index } => {
                write!(f, "body {index} has a non-finite component")
            }
            Self::NonPositiveMass { index } => {
                write!(f, "body {index} mass must be positive")
            }
            Self::InvalidTimeSpeed { value } => {
                write!(f, "time_speed must be finite and positive, got {value}")
            }
            Self::ZeroSubSteps => write!(f, "sub_steps must be at least 1"),
            Self::InvalidTickRate { value } => {
                write!(f, "tick_rate_hz must be finite and positive, got {value}")
            }
            Self::InvalidBackoff { reason } => {
                write!(f, "invalid backoff config: {reason}")
            }
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "thread spawn failed: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

// ── SessionConfig ──────────────────────────────────────────────────

/// Complete configuration for constructing a session.
///
/// Passed to [`LocalSession::spawn`](crate::local::LocalSession::spawn)
/// or [`RemoteSession::connect`](crate::remote::RemoteSession::connect).
/// The configured bodies become both the live state and the reset
/// checkpoint of the new driver.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Initial body list. Minimum: 2.
    pub bodies: Vec<Body>,
    /// Time speed multiplier applied to every sub-step. Default: 1.0.
    pub time_speed: f64,
    /// Integration sub-steps per tick. Default: 5.
    pub sub_steps: u32,
    /// Target tick rate for the stepping thread. Default: 60.0.
    pub tick_rate_hz: f64,
    /// Reconnect backoff, used by remote sessions only.
    pub backoff: BackoffConfig,
}

impl SessionConfig {
    /// A config with the given bodies and default parameters.
    pub fn new(bodies: Vec<Body>) -> Self {
        Self {
            bodies,
            time_speed: 1.0,
            sub_steps: DEFAULT_SUB_STEPS,
            tick_rate_hz: 60.0,
            backoff: BackoffConfig::default(),
        }
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. At least two bodies; a lone body has nothing to attract it.
        if self.bodies.len() < 2 {
            return Err(ConfigError::TooFewBodies {
                found: self.bodies.len(),
            });
        }
        // 2. Every body component finite, every mass positive (the
        //    integrator divides by mass without checking).
        for (index, body) in self.bodies.iter().enumerate() {
            if !body.is_finite() {
                return Err(ConfigError::NonFiniteBody { index });
            }
            if body.mass <= 0.0 {
                return Err(ConfigError::NonPositiveMass { index });
            }
        }
        // 3. time_speed finite and positive.
        if !self.time_speed.is_finite() || self.time_speed <= 0.0 {
            return Err(ConfigError::InvalidTimeSpeed {
                value: self.time_speed,
            });
        }
        // 4. At least one sub-step per tick.
        if self.sub_steps == 0 {
            return Err(ConfigError::ZeroSubSteps);
        }
        // 5. tick_rate_hz must be finite and positive, and its
        //    reciprocal must also be finite (rejects subnormals where
        //    1.0/hz = inf, which would panic in Duration::from_secs_f64).
        let hz = self.tick_rate_hz;
        if !hz.is_finite() || hz <= 0.0 || !(1.0 / hz).is_finite() {
            return Err(ConfigError::InvalidTickRate { value: hz });
        }
        // 6. BackoffConfig invariants.
        let b = &self.backoff;
        if b.initial_delay_ms > b.max_delay_ms {
            return Err(ConfigError::InvalidBackoff {
                reason: format!(
                    "initial_delay_ms ({}) exceeds max_delay_ms ({})",
                    b.initial_delay_ms, b.max_delay_ms,
                ),
            });
        }
        if !b.factor.is_finite() || b.factor < 1.0 {
            return Err(ConfigError::InvalidBackoff {
                reason: format!("factor must be finite and >= 1.0, got {}", b.factor),
            });
        }
        if b.max_attempts == Some(0) {
            return Err(ConfigError::InvalidBackoff {
                reason: "max_attempts must be at least 1 when set".to_string(),
            });
        }

        Ok(())
    }

    /// The wall-clock budget of one tick.
    ///
    /// Callers must run `validate()` first; an unvalidated tick rate
    /// can make `Duration::from_secs_f64` panic.
    pub(crate) fn tick_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz)
    }
}
