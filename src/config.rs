//! Simulation tuning constants (idle-time thresholds).
//!
//! Both thresholds count simulated turns during which a time slice received
//! no write. They are injected configuration, not hard-coded values.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Tuning constants for the history lifecycle of a simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Turns a time slice may stay idle before it is garbage collected.
    pub gc_idle_turns: u64,
    /// Turns behind the current time at which the locked floor trails.
    /// Writes at or below the floor are rejected.
    pub lock_in_idle_turns: i64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gc_idle_turns: 200,
            lock_in_idle_turns: 100,
        }
    }
}

impl SimConfig {
    /// Validate the configuration.
    ///
    /// The GC threshold is expected to exceed the lock threshold: a slice
    /// should become immutable well before its overrides are discarded.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidConfig` when a threshold is not
    /// positive or the thresholds are ordered the wrong way around.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.gc_idle_turns == 0 {
            return Err(ConfigurationError::InvalidConfig {
                reason: "gc_idle_turns must be > 0".to_string(),
            });
        }
        if self.lock_in_idle_turns <= 0 {
            return Err(ConfigurationError::InvalidConfig {
                reason: "lock_in_idle_turns must be > 0".to_string(),
            });
        }
        if (self.gc_idle_turns as i64) < self.lock_in_idle_turns {
            return Err(ConfigurationError::InvalidConfig {
                reason: "gc_idle_turns must be >= lock_in_idle_turns".to_string(),
            });
        }
        Ok(())
    }
}
