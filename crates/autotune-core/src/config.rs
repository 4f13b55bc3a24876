//! Tunable constants for the gain law engine and persistence scheduler.

use serde::{Deserialize, Serialize};

/// The named constants from the gain law engine and persistence scheduler,
/// collected so a host can load them from a TOML file instead of recompiling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TunerConfig {
    /// Maximum per-event FF growth, as a fraction (0.12 = 12%).
    pub inc_ff: f32,
    /// Maximum per-event FF shrink, as a fraction.
    pub dec_ff: f32,
    /// Increase-branch P/D growth cap, as a fraction.
    pub inc_pd: f32,
    /// Decrease-branch P/D shrink cap, as a fraction.
    pub dec_pd: f32,
    /// Ratio applied to P when computing the I floor.
    pub i_ratio: f32,
    /// Time constant, in seconds, applied to FF when computing the I floor.
    pub trim_tconst: f32,
    /// Demand-ratio threshold above which an event is considered overshot.
    pub overshoot: f32,
    /// Delayed-commit window, milliseconds.
    pub save_period_ms: u32,
    /// Minimum spacing between log records, milliseconds.
    pub log_period_ms: u32,
    /// Minimum event dwell time to be considered a real event, milliseconds.
    pub short_event_ms: u32,
    /// Minimum idle dwell before an oscillation check fires, milliseconds.
    pub idle_oscillation_ms: u32,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            inc_ff: 0.12,
            dec_ff: 0.15,
            inc_pd: 0.10,
            dec_pd: 0.20,
            i_ratio: 0.75,
            trim_tconst: 1.0,
            overshoot: 1.1,
            save_period_ms: 10_000,
            log_period_ms: 40,
            short_event_ms: 100,
            idle_oscillation_ms: 500,
        }
    }
}
