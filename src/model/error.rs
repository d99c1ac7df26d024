use thiserror::Error;

/// Errors raised while constructing or transitioning park entities.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unsupported battery voltage architecture: {0}V (expected 400 or 800)")]
    UnsupportedVoltage(u32),

    #[error("Battery capacity must be positive and finite, got {0}")]
    InvalidCapacity(f64),

    #[error("State of charge must lie within [0, 100], got {0}")]
    InvalidSoc(f64),

    #[error("Robot speed must be positive and finite, got {0}")]
    InvalidSpeed(f64),

    #[error("Invalid {entity} transition: {event} while {state}")]
    InvalidTransition {
        entity: &'static str,
        state: String,
        event: String,
    },
}
