use thiserror::Error;

use crate::model::{ModelError, VehicleId};

/// Invalid configuration, reported when an environment is constructed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{0} must be at least 1")]
    ZeroCount(&'static str),

    #[error("Arrival probability must lie within [0, 1], got {0}")]
    ProbabilityOutOfRange(f64),

    #[error("Robot reserve SoC must lie within [0, 100), got {0}")]
    SocOutOfRange(f64),

    #[error("{field} standard deviation must be non-negative and finite, got {value}")]
    NegativeStd { field: &'static str, value: f64 },

    #[error("{field} range [{lo}, {hi}] is empty, non-finite or below its floor")]
    InvalidRange { field: &'static str, lo: f64, hi: f64 },

    #[error("Unknown map scale: {0} (expected small, medium or large)")]
    UnknownScale(String),

    #[error("Invalid entity parameters: {0}")]
    Model(#[from] ModelError),
}

/// A rejected robot–vehicle assignment. The environment is left unchanged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispatchError {
    #[error("No robot at roster index {0}")]
    UnknownRobot(usize),

    #[error("No vehicle with handle {0}")]
    UnknownVehicle(VehicleId),

    #[error("Robot {0} is not available")]
    RobotBusy(u32),

    #[error("Vehicle {0} is not waiting for a charge")]
    VehicleNotWaiting(u32),

    #[error("Robot {robot} cannot reach vehicle {vehicle} and return home")]
    InsufficientCharge { robot: u32, vehicle: u32 },

    #[error("Transition rejected: {0}")]
    Transition(#[from] ModelError),
}

/// A broken engine invariant. Indicates a programming error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvariantViolation {
    #[error("Vehicle {id} appears on {count} lifecycle lists")]
    ListMembership { id: u32, count: usize },

    #[error("Vehicle {id} is {state} but sits on the {list} list")]
    StateMismatch {
        id: u32,
        state: String,
        list: &'static str,
    },

    #[error("Robot {robot} is discharging without a charging target")]
    DischargingWithoutTarget { robot: u32 },
}
