//! Collaborator-facing error types.
//!
//! The autotune core itself is infallible (see the core crate's docs); these
//! errors surface from the *collaborator* side of a trait call — a flash
//! write, a CAN-backed parameter read, a storage medium being full — and are
//! logged and otherwise absorbed by the core rather than propagated.

use thiserror::Error;

/// Errors a collaborator implementation may report back to the core.
#[derive(Error, Debug)]
pub enum HalError {
    /// The backing store could not be written (full, locked, or removed).
    #[error("storage error: {0}")]
    Storage(String),

    /// A collaborator operation did not complete in time.
    #[error("timeout: {0}")]
    Timeout(String),

    /// A collaborator was used before it finished initializing.
    #[error("not initialized: {0}")]
    NotInitialized(String),
}

impl HalError {
    pub fn storage(msg: impl Into<String>) -> Self {
        HalError::Storage(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        HalError::Timeout(msg.into())
    }

    pub fn not_initialized(msg: impl Into<String>) -> Self {
        HalError::NotInitialized(msg.into())
    }
}

/// Relative-tolerance write economy shared by every `ParamF32` implementation
/// (see `ParamF32::set_and_save` callers), so the `value <= 0.0` always-write
/// special case is enforced once rather than per call site.
pub fn float_should_save(old: f32, new: f32) -> bool {
    if new <= 0.0 {
        return true;
    }
    let delta = (new - old).abs();
    delta / new.abs() > 0.001
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_value_elides_save() {
        assert!(!float_should_save(1.0, 1.0));
        assert!(!float_should_save(1.0, 1.0005));
    }

    #[test]
    fn meaningful_change_forces_save() {
        assert!(float_should_save(1.0, 1.01));
    }

    #[test]
    fn non_positive_new_value_always_saves() {
        assert!(float_should_save(1.0, 0.0));
        assert!(float_should_save(1.0, -0.5));
    }
}
