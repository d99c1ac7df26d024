//! Tabular Q-learning over the dispatch action space.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::q_table::QTable;
use super::reward::{RewardConfig, RewardFunction};
use super::state::StateEncoder;
use crate::engine::{ParkEnv, RunSummary};
use crate::strategy::{ActionSpace, StrategyError};

/// Hyperparameters for [`QLearningTrainer`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrainingConfig {
    /// Number of episodes, each replayed from the same starting state.
    pub episodes: usize,
    /// Ticks per episode.
    pub max_steps: usize,
    /// Learning rate α.
    pub learning_rate: f64,
    /// Discount factor γ.
    pub discount: f64,
    /// Initial exploration rate ε.
    pub epsilon: f64,
    /// Multiplicative ε decay applied after each episode.
    pub epsilon_decay: f64,
    /// Lower bound for ε.
    pub epsilon_min: f64,
    pub rewards: RewardConfig,
    /// Episodes between progress log lines.
    pub log_interval: usize,
    /// Seeds exploration; episode `k` reseeds the engine with `seed + k`.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            max_steps: 1000,
            learning_rate: 0.1,
            discount: 0.9,
            epsilon: 1.0,
            epsilon_decay: 0.995,
            epsilon_min: 0.01,
            rewards: RewardConfig::default(),
            log_interval: 100,
            seed: 0,
        }
    }
}

/// Invalid [`TrainingConfig`], reported when a trainer is constructed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrainingConfigError {
    #[error("{0} must be at least 1")]
    ZeroCount(&'static str),

    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} must lie within {range}, got {value}")]
    OutOfRange {
        field: &'static str,
        range: &'static str,
        value: f64,
    },
}

impl TrainingConfig {
    /// Checks every hyperparameter, failing on the first invalid one.
    pub fn validate(&self) -> Result<(), TrainingConfigError> {
        fn check(field: &'static str, value: f64, range: &'static str, ok: bool) -> Result<(), TrainingConfigError> {
            if !value.is_finite() {
                Err(TrainingConfigError::NotFinite { field, value })
            } else if !ok {
                Err(TrainingConfigError::OutOfRange { field, range, value })
            } else {
                Ok(())
            }
        }
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        let open_unit = |v: f64| v > 0.0 && v <= 1.0;

        if self.episodes == 0 {
            return Err(TrainingConfigError::ZeroCount("episodes"));
        }
        if self.max_steps == 0 {
            return Err(TrainingConfigError::ZeroCount("max_steps"));
        }
        check("learning_rate", self.learning_rate, "(0, 1]", open_unit(self.learning_rate))?;
        check("discount", self.discount, "[0, 1]", unit(self.discount))?;
        check("epsilon", self.epsilon, "[0, 1]", unit(self.epsilon))?;
        check("epsilon_decay", self.epsilon_decay, "(0, 1]", open_unit(self.epsilon_decay))?;
        check("epsilon_min", self.epsilon_min, "[0, 1]", unit(self.epsilon_min))?;
        check("completion_bonus", self.rewards.completion_bonus, "", true)?;
        check("failure_penalty", self.rewards.failure_penalty, "", true)?;
        check("busy_bonus", self.rewards.busy_bonus, "", true)?;
        Ok(())
    }
}

/// Outcome of one training episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub total_reward: f64,
    /// Exploration rate used during the episode.
    pub epsilon: f64,
    pub summary: RunSummary,
}

/// Per-episode results of a training run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub episodes: Vec<EpisodeSummary>,
}

impl TrainingReport {
    pub fn mean_reward(&self) -> f64 {
        if self.episodes.is_empty() {
            return 0.0;
        }
        self.episodes.iter().map(|e| e.total_reward).sum::<f64>() / self.episodes.len() as f64
    }

    /// Mean reward over the last `n` episodes.
    pub fn trailing_mean_reward(&self, n: usize) -> f64 {
        let start = self.episodes.len().saturating_sub(n);
        let tail = &self.episodes[start..];
        if tail.is_empty() {
            return 0.0;
        }
        tail.iter().map(|e| e.total_reward).sum::<f64>() / tail.len() as f64
    }

    pub fn last(&self) -> Option<&EpisodeSummary> {
        self.episodes.last()
    }
}

/// Learns a [`QTable`] by running ε-greedy dispatch on a [`ParkEnv`].
#[derive(Debug, Clone)]
pub struct QLearningTrainer {
    config: TrainingConfig,
    table: QTable,
    encoder: StateEncoder,
    reward: RewardFunction,
    epsilon: f64,
    rng: StdRng,
}

impl QLearningTrainer {
    /// Trains into an existing table.
    pub fn new(table: QTable, config: TrainingConfig) -> Result<Self, TrainingConfigError> {
        config.validate()?;
        let encoder = StateEncoder::new(table.n_states());
        let epsilon = config.epsilon;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            table,
            encoder,
            reward: RewardFunction::default(),
            epsilon,
            rng,
        })
    }

    /// Starts from a zeroed table sized for `env`.
    pub fn for_env(env: &ParkEnv, config: TrainingConfig) -> Result<Self, StrategyError> {
        let n_actions = env.robots().len() * env.config().max_vehicles;
        let table = QTable::new(StateEncoder::DEFAULT_STATES, n_actions)?;
        Ok(Self::new(table, config)?)
    }

    pub fn with_reward(mut self, reward: RewardFunction) -> Self {
        self.reward = reward;
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Current exploration rate.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn into_table(self) -> QTable {
        self.table
    }

    /// Runs every episode from the state `env` is in when called.
    ///
    /// `env` is left at the end of the final episode.
    pub fn train(&mut self, env: &mut ParkEnv) -> Result<TrainingReport, StrategyError> {
        let expected = env.robots().len() * env.config().max_vehicles;
        if self.table.n_actions() != expected {
            return Err(StrategyError::ActionSpaceMismatch {
                expected,
                actual: self.table.n_actions(),
            });
        }

        let start = env.snapshot();
        let mut report = TrainingReport::default();
        info!(
            run = %env.run_id(),
            episodes = self.config.episodes,
            max_steps = self.config.max_steps,
            actions = expected,
            "q-learning started"
        );

        for episode in 0..self.config.episodes {
            env.restore(&start);
            env.reseed(self.config.seed.wrapping_add(episode as u64));

            let epsilon = self.epsilon;
            let mut total_reward = 0.0;
            for step in 0..self.config.max_steps {
                let last = step + 1 == self.config.max_steps;
                total_reward += self.learn_step(env, last);
            }

            let summary = env.run_summary();
            report.episodes.push(EpisodeSummary {
                episode,
                total_reward,
                epsilon,
                summary,
            });
            debug!(run = %env.run_id(), episode, total_reward, epsilon, "episode finished");

            if self.config.log_interval > 0 && (episode + 1) % self.config.log_interval == 0 {
                info!(
                    run = %env.run_id(),
                    episode = episode + 1,
                    mean_reward = report.trailing_mean_reward(self.config.log_interval),
                    epsilon = self.epsilon,
                    completed = summary.completed,
                    failed = summary.failed,
                    "training progress"
                );
            }

            self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        }

        Ok(report)
    }

    /// Dispatches ε-greedily, advances one tick, and updates every action
    /// committed this tick. Returns the tick's reward.
    fn learn_step(&mut self, env: &mut ParkEnv, last: bool) -> f64 {
        let view = env.dispatch_view();
        let state = self.encoder.encode(&view);

        let mut taken = Vec::new();
        if !view.is_idle() {
            let mut space = ActionSpace::new(&view);
            loop {
                let valid = space.valid_actions();
                let Some(action) = self.choose(state, &valid) else {
                    break;
                };
                let Some(assignment) = space.take(action) else {
                    break;
                };
                match env.assign(assignment.robot, assignment.vehicle) {
                    Ok(()) => taken.push(action),
                    Err(err) => warn!(run = %env.run_id(), action, %err, "exploration action rejected"),
                }
            }
        }

        env.step();
        let reward = self.reward.evaluate(env, &self.config.rewards);

        if !taken.is_empty() {
            let target = if last {
                reward
            } else {
                let next = self.encoder.encode(&env.dispatch_view());
                reward + self.config.discount * self.table.max_value(next)
            };
            for action in taken {
                self.table.update(state, action, target, self.config.learning_rate);
            }
        }
        reward
    }

    /// Explores with probability ε, otherwise exploits the table.
    fn choose(&mut self, state: usize, valid: &[usize]) -> Option<usize> {
        if valid.is_empty() {
            return None;
        }
        if self.rng.gen_bool(self.epsilon) {
            return Some(valid[self.rng.gen_range(0..valid.len())]);
        }
        valid
            .iter()
            .copied()
            .max_by(|&a, &b| {
                let qa = self.table.get(state, a).unwrap_or(f64::NEG_INFINITY);
                let qb = self.table.get(state, b).unwrap_or(f64::NEG_INFINITY);
                qa.total_cmp(&qb)
            })
    }
}
