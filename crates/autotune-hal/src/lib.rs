//! Hardware abstraction layer for the fixed-wing rate-PID autotuner.
//!
//! Defines the trait contracts the `autotune-core` crate is written against,
//! plus the data types exchanged across them. Real flight-controller targets
//! implement these traits over their own parameter store, scheduler and
//! logger; the `mock` feature (default-on) provides in-memory stand-ins for
//! tests and the desktop simulator.

pub mod error;
pub mod traits;
pub mod types;

#[cfg(feature = "mock")]
pub mod mock;

pub use error::*;
pub use traits::*;
pub use types::*;

#[cfg(feature = "mock")]
pub use mock::{
    MockAirframeParams, MockClock, MockGainSlot, MockLogger, MockParamF32, MockParamI16,
    MockRatePid,
};
