//! Name-based strategy selection and the per-tick dispatch driver.

use std::fmt;
use std::str::FromStr;

use tracing::trace;

use super::error::StrategyError;
use super::greedy::{MaxDemand, MaxPriority};
use super::hyper::HyperHeuristic;
use super::nearest::Nearest;
use super::q_dispatch::QTableDispatch;
use super::trait_::AssignmentStrategy;
use super::view::commit;
use super::weighted::{Weighted, Weights};
use crate::engine::{MapScale, ParkEnv};
use crate::rl::QTable;

/// Selectable dispatch strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StrategyKind {
    Nearest,
    MaxDemand,
    MaxPriority,
    /// Weighted multi-objective scoring, with offline-tuned weights.
    Weighted,
    QLearning,
    HyperHeuristic,
}

impl StrategyKind {
    pub fn all() -> [StrategyKind; 6] {
        [
            StrategyKind::Nearest,
            StrategyKind::MaxDemand,
            StrategyKind::MaxPriority,
            StrategyKind::Weighted,
            StrategyKind::QLearning,
            StrategyKind::HyperHeuristic,
        ]
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Nearest => "nearest",
            StrategyKind::MaxDemand => "max_demand",
            StrategyKind::MaxPriority => "max_priority",
            StrategyKind::Weighted => "weighted",
            StrategyKind::QLearning => "q_learning",
            StrategyKind::HyperHeuristic => "hyper_heuristic",
        };
        f.write_str(name)
    }
}

impl FromStr for StrategyKind {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(StrategyKind::Nearest),
            "max_demand" => Ok(StrategyKind::MaxDemand),
            "max_priority" => Ok(StrategyKind::MaxPriority),
            "genetic" | "weighted" | "multi_objective" => Ok(StrategyKind::Weighted),
            "rl" | "q_learning" => Ok(StrategyKind::QLearning),
            "hyper_heuristic" => Ok(StrategyKind::HyperHeuristic),
            _ => Err(StrategyError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Holds one instance of every strategy and drives a [`ParkEnv`] with them.
///
/// Q-learning dispatch is only available once a table has been attached
/// with [`TaskStrategy::with_q_table`].
#[derive(Debug, Clone)]
pub struct TaskStrategy {
    nearest: Nearest,
    max_demand: MaxDemand,
    max_priority: MaxPriority,
    weighted: Weighted,
    q_table: Option<QTableDispatch>,
    hyper: HyperHeuristic,
}

impl TaskStrategy {
    /// Strategies tuned for `scale`.
    pub fn new(scale: MapScale) -> Self {
        Self::with_weights(Weights::for_scale(scale))
    }

    pub fn with_weights(weights: Weights) -> Self {
        Self {
            nearest: Nearest,
            max_demand: MaxDemand,
            max_priority: MaxPriority,
            weighted: Weighted::new(weights),
            q_table: None,
            hyper: HyperHeuristic::default(),
        }
    }

    /// Attaches a trained table sized for `env`.
    pub fn with_q_table(mut self, table: QTable, env: &ParkEnv) -> Result<Self, StrategyError> {
        let dispatch = QTableDispatch::for_park(table, env.robots().len(), env.config().max_vehicles)?;
        self.q_table = Some(dispatch);
        Ok(self)
    }

    pub fn strategy_mut(&mut self, kind: StrategyKind) -> Result<&mut dyn AssignmentStrategy, StrategyError> {
        let strategy: &mut dyn AssignmentStrategy = match kind {
            StrategyKind::Nearest => &mut self.nearest,
            StrategyKind::MaxDemand => &mut self.max_demand,
            StrategyKind::MaxPriority => &mut self.max_priority,
            StrategyKind::Weighted => &mut self.weighted,
            StrategyKind::QLearning => self.q_table.as_mut().ok_or(StrategyError::MissingQTable)?,
            StrategyKind::HyperHeuristic => &mut self.hyper,
        };
        Ok(strategy)
    }

    /// Plans with `kind` and commits the plan. Returns the number of
    /// assignments committed.
    pub fn dispatch(&mut self, env: &mut ParkEnv, kind: StrategyKind) -> Result<usize, StrategyError> {
        let strategy = self.strategy_mut(kind)?;
        let view = env.dispatch_view();
        if view.is_idle() {
            return Ok(0);
        }
        let plan = strategy.plan(&view);
        let committed = commit(env, &plan);
        trace!(run = %env.run_id(), strategy = strategy.name(), planned = plan.len(), committed, "dispatch");
        Ok(committed)
    }

    /// Dispatches with `kind`, then advances `env` by one time step.
    pub fn update(&mut self, env: &mut ParkEnv, kind: StrategyKind) -> Result<usize, StrategyError> {
        let committed = self.dispatch(env, kind)?;
        env.step();
        Ok(committed)
    }
}

impl Default for TaskStrategy {
    fn default() -> Self {
        Self::new(MapScale::Small)
    }
}
