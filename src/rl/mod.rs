//! Tabular Q-learning for dispatch.
//!
//! A [`QTable`] indexed by [`StateEncoder`] states and dispatch actions is
//! trained by [`QLearningTrainer`] against a [`ParkEnv`](crate::engine::ParkEnv)
//! and used at run time through
//! [`QTableDispatch`](crate::strategy::QTableDispatch). [`evaluate_batch`]
//! compares strategies over independent runs.

pub mod metrics;
pub mod q_table;
pub mod reward;
pub mod state;
pub mod trainer;

pub use metrics::{evaluate_batch, EvaluationMetrics, RunSummary};
pub use q_table::{QTable, QTableError};
pub use reward::{RewardConfig, RewardFunction};
pub use state::StateEncoder;
pub use trainer::{
    EpisodeSummary, QLearningTrainer, TrainingConfig, TrainingConfigError, TrainingReport,
};
