//! Fixed-wing attitude-rate PID autotuner core.
//!
//! Hardware-independent implementation of the online FF/P/D/I/RMAX/TAU
//! identifier: signal conditioning, event detection, gain law, persistence
//! scheduling and envelope slewing, all invoked from one per-tick
//! `Tuner::update`. Collaborators (the rate-PID, the parameter store, the
//! scheduler, clock and logger) are injected as generic trait bounds with
//! no dynamic dispatch; see `autotune-hal` for their contracts.

pub mod config;
pub mod filter;
pub mod gains;
pub mod tuner;

pub use config::TunerConfig;
pub use filter::{LowPassFilter, MedianFilter};
pub use gains::{tuning_row, TUNING_TABLE};
pub use tuner::Tuner;
