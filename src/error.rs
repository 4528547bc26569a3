//! Error types for chronolife.
//!
//! All errors are strongly typed using thiserror. None of them are caught
//! inside the crate; they propagate to the caller, which must treat them as
//! fatal for the operation that raised them.

use thiserror::Error;

use crate::object::ObjectId;

/// Configuration errors: the simulator or store was used before a required
/// piece of configuration was installed, or an object reference is broken.
///
/// These must be fixed by the caller before retrying; there is no recovery
/// path inside the crate.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("no default state function installed")]
    NoDefaultState,

    #[error("no simulation area configured")]
    NoSimulationArea,

    #[error("simulation object {id} is not in the arena")]
    MissingObject { id: ObjectId },

    #[error("portal {id} has no link to a partner")]
    UnlinkedPortal { id: ObjectId },

    #[error("invalid simulation config: {reason}")]
    InvalidConfig { reason: String },
}

/// Invalid-argument errors raised by the geometry helpers.
///
/// These indicate a programming error at the call site and are never retried.
#[derive(Debug, Error)]
pub enum InvalidArgumentError {
    #[error("({dx}, {dy}) is not a cardinal step")]
    NotACardinalStep { dx: i64, dy: i64 },

    #[error("segment length {length} must be positive")]
    NonPositiveLength { length: i64 },
}

/// Top-level error type for chronolife operations.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgumentError),
}

impl SimError {
    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns true if this is an invalid-argument error.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// Result type alias for chronolife operations.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_message() {
        let err = ConfigurationError::NoDefaultState;
        let msg = format!("{err}");
        assert!(msg.contains("default state"));
    }

    #[test]
    fn invalid_argument_error_message() {
        let err = InvalidArgumentError::NotACardinalStep { dx: 1, dy: 1 };
        let msg = format!("{err}");
        assert!(msg.contains("(1, 1)"));
    }

    #[test]
    fn sim_error_from_configuration() {
        let err: SimError = ConfigurationError::NoSimulationArea.into();
        assert!(err.is_configuration());
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn sim_error_from_invalid_argument() {
        let err: SimError = InvalidArgumentError::NonPositiveLength { length: 0 }.into();
        assert!(err.is_invalid_argument());
    }
}
