use thiserror::Error;

use crate::engine::ConfigError;
use crate::rl::{QTableError, TrainingConfigError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StrategyError {
    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Q-learning dispatch requested but no Q-table is loaded")]
    MissingQTable,

    #[error("Q-table has {actual} actions, expected {expected} (robots × max vehicles)")]
    ActionSpaceMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    QTable(#[from] QTableError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Training(#[from] TrainingConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_strategy_display() {
        let e = StrategyError::UnknownStrategy("random".to_string());
        assert_eq!(e.to_string(), "Unknown strategy: random");
    }

    #[test]
    fn mismatch_display() {
        let e = StrategyError::ActionSpaceMismatch {
            expected: 40,
            actual: 12,
        };
        assert!(e.to_string().contains("expected 40"));
    }

    #[test]
    fn training_error_is_transparent() {
        let e: StrategyError = TrainingConfigError::ZeroCount("episodes").into();
        assert_eq!(e.to_string(), "episodes must be at least 1");
    }
}
