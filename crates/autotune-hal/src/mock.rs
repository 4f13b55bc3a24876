//! In-memory collaborator implementations for tests and the desktop
//! simulator. No real flash, CAN bus, or clock involved.

use crate::error::HalError;
use crate::traits::{AirframeParams, Clock, GainSlot, Logger, ParamF32, ParamI16, RatePid, Scheduler};
use crate::types::{Axis, LogRecord};

/// A `ParamF32` backed by two plain floats: the live value and the last
/// value actually persisted. Tracks how many times `save`/`set_and_save`
/// elided or performed a write, so tests can assert on write economy
/// (property #7 of the core spec).
#[derive(Debug, Clone, Copy, Default)]
pub struct MockParamF32 {
    live: f32,
    stored: f32,
    save_count: u32,
}

impl MockParamF32 {
    pub fn new(initial: f32) -> Self {
        Self {
            live: initial,
            stored: initial,
            save_count: 0,
        }
    }

    /// What has actually been persisted so far.
    pub fn stored(&self) -> f32 {
        self.stored
    }

    /// How many times a write actually reached the "store".
    pub fn save_count(&self) -> u32 {
        self.save_count
    }

    fn persist(&mut self) -> Result<(), HalError> {
        if crate::error::float_should_save(self.stored, self.live) {
            self.stored = self.live;
            self.save_count += 1;
        }
        Ok(())
    }
}

impl ParamF32 for MockParamF32 {
    fn get(&self) -> f32 {
        self.live
    }

    fn set(&mut self, value: f32) {
        self.live = value;
    }

    fn set_and_save(&mut self, value: f32) -> Result<(), HalError> {
        self.live = value;
        self.persist()
    }

    fn save(&mut self) -> Result<(), HalError> {
        self.persist()
    }
}

/// A `ParamI16` backed by two plain integers, mirroring [`MockParamF32`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MockParamI16 {
    live: i16,
    stored: i16,
    save_count: u32,
}

impl MockParamI16 {
    pub fn new(initial: i16) -> Self {
        Self {
            live: initial,
            stored: initial,
            save_count: 0,
        }
    }

    pub fn stored(&self) -> i16 {
        self.stored
    }

    pub fn save_count(&self) -> u32 {
        self.save_count
    }

    fn persist(&mut self) -> Result<(), HalError> {
        if self.live != self.stored {
            self.stored = self.live;
            self.save_count += 1;
        }
        Ok(())
    }
}

impl ParamI16 for MockParamI16 {
    fn get(&self) -> i16 {
        self.live
    }

    fn set(&mut self, value: i16) {
        self.live = value;
    }

    fn set_and_save(&mut self, value: i16) -> Result<(), HalError> {
        self.live = value;
        self.persist()
    }

    fn save(&mut self) -> Result<(), HalError> {
        self.persist()
    }
}

/// A standalone rate-PID controller stand-in, holding one [`MockParamF32`]
/// per gain and a fixed slew-rate ceiling.
#[derive(Debug, Clone, Copy)]
pub struct MockRatePid {
    ff: MockParamF32,
    p: MockParamF32,
    i: MockParamF32,
    d: MockParamF32,
    imax: MockParamF32,
    slew_limit: f32,
}

impl MockRatePid {
    pub fn new(ff: f32, p: f32, i: f32, d: f32, imax: f32, slew_limit: f32) -> Self {
        Self {
            ff: MockParamF32::new(ff),
            p: MockParamF32::new(p),
            i: MockParamF32::new(i),
            d: MockParamF32::new(d),
            imax: MockParamF32::new(imax),
            slew_limit,
        }
    }

    pub fn set_slew_limit(&mut self, slew_limit: f32) {
        self.slew_limit = slew_limit;
    }
}

impl RatePid for MockRatePid {
    type F32Param = MockParamF32;

    fn ff(&mut self) -> &mut Self::F32Param {
        &mut self.ff
    }

    fn k_p(&mut self) -> &mut Self::F32Param {
        &mut self.p
    }

    fn k_i(&mut self) -> &mut Self::F32Param {
        &mut self.i
    }

    fn k_d(&mut self) -> &mut Self::F32Param {
        &mut self.d
    }

    fn k_imax(&mut self) -> &mut Self::F32Param {
        &mut self.imax
    }

    fn slew_limit(&self) -> f32 {
        self.slew_limit
    }
}

/// The RMAX/TAU envelope fields for one axis, stand-alone from the rate-PID.
#[derive(Debug, Clone, Copy)]
pub struct MockGainSlot {
    tau: MockParamF32,
    rmax_pos: MockParamI16,
    rmax_neg: MockParamI16,
}

impl MockGainSlot {
    pub fn new(tau: f32, rmax_pos: i16, rmax_neg: i16) -> Self {
        Self {
            tau: MockParamF32::new(tau),
            rmax_pos: MockParamI16::new(rmax_pos),
            rmax_neg: MockParamI16::new(rmax_neg),
        }
    }
}

impl GainSlot for MockGainSlot {
    type F32Param = MockParamF32;
    type I16Param = MockParamI16;

    fn tau(&mut self) -> &mut Self::F32Param {
        &mut self.tau
    }

    fn rmax_pos(&mut self) -> &mut Self::I16Param {
        &mut self.rmax_pos
    }

    fn rmax_neg(&mut self) -> &mut Self::I16Param {
        &mut self.rmax_neg
    }
}

/// Airframe parameter block stand-in with mutable setters so a test or the
/// simulator can change the aggressiveness level mid-run.
#[derive(Debug, Clone, Copy)]
pub struct MockAirframeParams {
    roll_limit_cd: i32,
    pitch_limit_max_cd: i32,
    pitch_limit_min_cd: i32,
    autotune_level: u8,
}

impl MockAirframeParams {
    pub fn new(roll_limit_cd: i32, pitch_limit_max_cd: i32, pitch_limit_min_cd: i32) -> Self {
        Self {
            roll_limit_cd,
            pitch_limit_max_cd,
            pitch_limit_min_cd,
            autotune_level: 0,
        }
    }

    pub fn set_autotune_level(&mut self, level: u8) {
        self.autotune_level = level;
    }
}

impl AirframeParams for MockAirframeParams {
    fn attitude_limit_deg(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Roll => self.roll_limit_cd as f32 / 100.0,
            Axis::Pitch => {
                self.pitch_limit_max_cd
                    .abs()
                    .min(self.pitch_limit_min_cd.abs()) as f32
                    / 100.0
            }
        }
    }

    fn autotune_level(&self) -> u8 {
        self.autotune_level
    }
}

/// Manually-advanced monotonic clock, also implementing [`Scheduler`] at a
/// fixed loop rate. Tracks microseconds internally so repeated `tick()`
/// calls at rates like 400 Hz don't accumulate millisecond rounding drift.
#[derive(Debug, Clone, Copy)]
pub struct MockClock {
    now_us: u64,
    loop_rate_hz: u16,
}

impl MockClock {
    pub fn new(loop_rate_hz: u16) -> Self {
        Self {
            now_us: 0,
            loop_rate_hz,
        }
    }

    /// Advance the clock by one tick at the configured loop rate.
    pub fn tick(&mut self) {
        let step_us = (1_000_000 / self.loop_rate_hz as u64).max(1);
        self.now_us += step_us;
    }

    pub fn advance_ms(&mut self, ms: u32) {
        self.now_us += u64::from(ms) * 1000;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        (self.now_us / 1000) as u32
    }

    fn now_us(&self) -> u64 {
        self.now_us
    }
}

impl Scheduler for MockClock {
    fn loop_rate_hz(&self) -> u16 {
        self.loop_rate_hz
    }
}

/// Collects every [`LogRecord`] written, for assertions in tests and replay
/// in the simulator.
#[derive(Debug, Clone, Default)]
pub struct MockLogger {
    pub records: Vec<LogRecord>,
}

impl MockLogger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Logger for MockLogger {
    fn write_block(&mut self, record: &LogRecord) {
        self.records.push(*record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_f32_elides_insignificant_writes() {
        let mut p = MockParamF32::new(1.0);
        p.set_and_save(1.0005).unwrap();
        assert_eq!(p.save_count(), 0);
        p.set_and_save(1.01).unwrap();
        assert_eq!(p.save_count(), 1);
        assert_eq!(p.stored(), 1.01);
    }

    #[test]
    fn param_f32_always_saves_non_positive_values() {
        let mut p = MockParamF32::new(1.0);
        p.set_and_save(0.0).unwrap();
        assert_eq!(p.save_count(), 1);
    }

    #[test]
    fn param_i16_elides_unchanged_writes() {
        let mut p = MockParamI16::new(100);
        p.set_and_save(100).unwrap();
        assert_eq!(p.save_count(), 0);
        p.set_and_save(101).unwrap();
        assert_eq!(p.save_count(), 1);
    }

    #[test]
    fn clock_tick_advances_by_loop_period() {
        let mut clock = MockClock::new(400);
        clock.tick();
        assert_eq!(clock.now_ms(), 2);
    }
}
