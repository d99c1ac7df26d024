//! robocharge - mobile charging robots for an EV parking campus
//!
//! A discrete-time simulation of robots that carry battery packs to parked
//! vehicles, swap their own packs at a central station, and are dispatched
//! by interchangeable assignment strategies, including a tabular
//! Q-learning policy trained against the simulation itself.

pub mod engine;
pub mod model;
pub mod rl;
pub mod strategy;

pub use engine::{MapScale, ParkConfig, ParkEnv, RunSummary, Status};
pub use model::{Battery, BatteryStation, Position, Robot, Vehicle};
pub use rl::{evaluate_batch, EvaluationMetrics, QLearningTrainer, QTable, TrainingConfig};
pub use strategy::{AssignmentStrategy, StrategyKind, TaskStrategy};

/// Identifier attached to every simulation run, used in log fields.
pub type RunId = String;

/// Generates a new unique run identifier (UUID v4).
pub fn generate_run_id() -> RunId {
    uuid::Uuid::new_v4().to_string()
}
