//! Assignment strategies.
//!
//! Each tick a strategy reads a [`DispatchView`] of idle robots and waiting
//! vehicles and returns an exclusive plan of [`Assignment`]s, which
//! [`commit`] applies to the engine.

pub mod error;
pub mod greedy;
pub mod hungarian;
pub mod hyper;
pub mod nearest;
pub mod q_dispatch;
pub mod task_strategy;
pub mod trait_;
pub mod view;
pub mod weighted;


pub use error::StrategyError;
pub use greedy::{MaxDemand, MaxPriority};
pub use hyper::HyperHeuristic;
pub use nearest::Nearest;
pub use q_dispatch::{ActionSpace, QTableDispatch};
pub use task_strategy::{StrategyKind, TaskStrategy};
pub use trait_::AssignmentStrategy;
pub use view::{commit, Assignment, DispatchView, RobotCandidate, VehicleCandidate};
pub use weighted::{Weighted, Weights};
