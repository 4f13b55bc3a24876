//! Collaborator traits the autotune core is written against.
//!
//! Each trait mirrors one of the external interfaces named in the core's
//! specification: the rate-PID controller, the axis gain slot, the airframe
//! parameter block, the scheduler, the clock, and the log sink. Keeping them
//! separate (rather than one mega-trait) lets a host implement only the
//! handful it actually owns, and lets the mock host in this crate implement
//! each one independently.

use crate::error::HalError;
use crate::types::Axis;

/// A single persisted `f32` gain: a live value plus a lazily-flushed copy in
/// the parameter store.
pub trait ParamF32 {
    /// Current live value.
    fn get(&self) -> f32;
    /// Update the live value only; does not touch the stored copy.
    fn set(&mut self, value: f32);
    /// Update the live value and persist it in the same step.
    fn set_and_save(&mut self, value: f32) -> Result<(), HalError>;
    /// Persist the current live value without changing it.
    fn save(&mut self) -> Result<(), HalError>;
}

/// A single persisted `i16` gain (RMAX envelope fields).
pub trait ParamI16 {
    fn get(&self) -> i16;
    fn set(&mut self, value: i16);
    fn set_and_save(&mut self, value: i16) -> Result<(), HalError>;
    fn save(&mut self) -> Result<(), HalError>;
}

/// The inner rate-PID controller the autotuner adjusts.
///
/// `ff`/`k_p`/`k_i`/`k_d`/`k_imax` return `&mut` handles rather than plain
/// values so the core can call `set`/`save` directly on them without the
/// trait needing a setter per field.
pub trait RatePid {
    type F32Param: ParamF32;

    fn ff(&mut self) -> &mut Self::F32Param;
    fn k_p(&mut self) -> &mut Self::F32Param;
    fn k_i(&mut self) -> &mut Self::F32Param;
    fn k_d(&mut self) -> &mut Self::F32Param;
    fn k_imax(&mut self) -> &mut Self::F32Param;

    /// Current slew-rate ceiling, in units matching `PidInfo::slew_rate`.
    fn slew_limit(&self) -> f32;
}

/// The RMAX/TAU envelope fields for one axis.
///
/// Kept distinct from [`RatePid`] because on the real airframe these fields
/// live in the autotune object's own parameter group, not the rate
/// controller's.
pub trait GainSlot {
    type F32Param: ParamF32;
    type I16Param: ParamI16;

    fn tau(&mut self) -> &mut Self::F32Param;
    fn rmax_pos(&mut self) -> &mut Self::I16Param;
    fn rmax_neg(&mut self) -> &mut Self::I16Param;
}

/// Read-only airframe configuration the event detector and envelope slewer
/// consult each tick.
pub trait AirframeParams {
    /// Attitude limit in degrees for the given axis (already resolved from
    /// the underlying ROLL/PITCH centi-degree fields).
    fn attitude_limit_deg(&self, axis: Axis) -> f32;
    /// Aggressiveness level, 0..=11.
    fn autotune_level(&self) -> u8;
}

/// Read-only scheduler facade.
pub trait Scheduler {
    fn loop_rate_hz(&self) -> u16;
}

/// Monotonic clock facade.
pub trait Clock {
    fn now_ms(&self) -> u32;
    fn now_us(&self) -> u64;
}

/// Structured log sink.
pub trait Logger {
    fn write_block(&mut self, record: &crate::types::LogRecord);
}
