//! Time-stepped park simulation.
//!
//! The engine owns all entities and exposes one mutation per tick
//! ([`ParkEnv::update`]) plus assignment commits between ticks
//! ([`ParkEnv::assign`]).

pub mod arrivals;
pub mod config;
pub mod env;
pub mod error;
pub mod status;

#[cfg(test)]
mod tests;

pub use arrivals::{VehicleProfile, VehicleSampler};
pub use config::{MapScale, ParkConfig};
pub use env::{EnvSnapshot, ParkEnv};
pub use error::{ConfigError, DispatchError, InvariantViolation};
pub use status::{RobotStatus, RunSummary, Status};
