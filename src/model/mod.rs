//! Park entities: batteries, vehicles, robots, and the battery station.
//!
//! Dependency order is `Battery → Vehicle / Robot → BatteryStation`. Each
//! battery is owned by exactly one vehicle, robot, or the station pool at any
//! instant; swaps move batteries by value.

pub mod battery;
pub mod error;
pub mod robot;
pub mod station;
pub mod types;
pub mod vehicle;

pub use battery::{Battery, Voltage};
pub use error::ModelError;
pub use robot::{Robot, RobotEvent, RobotState};
pub use station::BatteryStation;
pub use types::Position;
pub use vehicle::{Vehicle, VehicleEvent, VehicleId, VehicleState};
