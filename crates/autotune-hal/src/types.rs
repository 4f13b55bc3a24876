//! Data types shared between the autotune core and its collaborators.

use serde::{Deserialize, Serialize};

/// Which attitude-rate axis a `Tuner` instance is bound to.
///
/// Selects which field(s) of the airframe parameter block feed
/// `AirframeParams::attitude_limit_deg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Roll,
    Pitch,
}

/// Event-detector state. Transitions only ever go IDLE <-> DEMAND_POS or
/// IDLE <-> DEMAND_NEG; DEMAND_POS <-> DEMAND_NEG is never reachable directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    Idle,
    DemandPos,
    DemandNeg,
}

impl Default for State {
    fn default() -> Self {
        State::Idle
    }
}

/// Outcome of the most recently completed event or idle-window check, for
/// logging only. Does not affect control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Nothing happened this tick worth reporting.
    None,
    /// Event ended but peak rate never cleared the noise floor.
    LowRate,
    /// Event ended before the minimum dwell time.
    Short,
    /// Gain law raised P and D.
    RaisePd,
    /// Gain law lowered P or D (overshoot or slew-limit evidence).
    LowerPd,
    /// Idle-dwell oscillation check lowered P or D.
    IdleLowerPd,
}

impl Default for Action {
    fn default() -> Self {
        Action::None
    }
}

/// Per-tick telemetry read from the rate-PID controller.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidInfo {
    /// Filtered/commanded target rate, deg/s.
    pub target: f32,
    /// Measured actual rate, deg/s.
    pub actual: f32,
    /// Feed-forward contribution to the surface command.
    pub ff: f32,
    /// Proportional contribution.
    pub p: f32,
    /// Integral contribution.
    pub i: f32,
    /// Derivative contribution.
    pub d: f32,
    /// Slew-limiter multiplier currently applied to the D term, (0, 1].
    pub dmod: f32,
    /// Observed rate of change of the controller output.
    pub slew_rate: f32,
}

/// Tunable gains and envelope parameters for one axis.
///
/// Trivially copyable. Invariants enforced by the core: `rmax_pos >= 0`,
/// `rmax_neg >= 0`, `tau` in `[0.1, 2.0]` once initialized, `ff >= 0.01`,
/// `imax` in `[0.4, 0.9]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ATGains {
    /// Attitude-to-rate time constant, seconds.
    pub tau: f32,
    /// Maximum positive commanded rate, deg/s.
    pub rmax_pos: i16,
    /// Maximum negative commanded rate, deg/s.
    pub rmax_neg: i16,
    /// Feed-forward gain.
    pub ff: f32,
    /// Proportional gain.
    pub p: f32,
    /// Integral gain.
    pub i: f32,
    /// Derivative gain.
    pub d: f32,
    /// Integral saturation limit.
    pub imax: f32,
}

impl ATGains {
    /// Clamp every field to the invariants a `Tuner` must maintain.
    pub fn clamp_invariants(&mut self) {
        self.rmax_pos = self.rmax_pos.max(0);
        self.rmax_neg = self.rmax_neg.max(0);
        self.tau = self.tau.clamp(0.1, 2.0);
        self.ff = self.ff.max(0.01);
        self.imax = self.imax.clamp(0.4, 0.9);
    }
}

/// Structured record emitted by the logger collaborator at most every
/// `log_period_ms`. The schema is owned by this crate; the core only
/// produces the values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Microsecond timestamp of this sample.
    pub timestamp_us: u64,
    pub axis: Axis,
    pub state: State,
    /// Filtered, I-removed actuator command.
    pub actuator: f32,
    pub desired_rate: f32,
    pub actual_rate: f32,
    /// Single-event FF estimate before median filtering.
    pub ff_single: f32,
    pub ff: f32,
    pub p: f32,
    pub i: f32,
    pub d: f32,
    pub action: Action,
    pub rmax_pos: i16,
    pub tau: f32,
}
