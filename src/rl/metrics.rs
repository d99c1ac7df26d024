//! Aggregate outcome metrics over independent runs.

use std::fmt;

use rayon::prelude::*;
use tracing::info;

pub use crate::engine::RunSummary;
use crate::engine::{ParkConfig, ParkEnv};
use crate::strategy::{StrategyError, StrategyKind, TaskStrategy};

/// Outcome means over a batch of runs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluationMetrics {
    /// Number of runs evaluated.
    pub n_runs: usize,
    /// Mean completed vehicles per run.
    pub mean_completed: f64,
    /// Mean failed vehicles per run.
    pub mean_failed: f64,
    /// Mean vehicles still in the park when a run ended.
    pub mean_pending: f64,
    /// Mean share of finished vehicles that completed, in percent.
    pub mean_success_rate: f64,
    /// Mean seconds a finished vehicle waited for a robot.
    pub mean_wait: f64,
}

impl EvaluationMetrics {
    pub fn from_summaries(summaries: &[RunSummary]) -> Self {
        let n_runs = summaries.len();
        if n_runs == 0 {
            return Self {
                n_runs,
                mean_completed: 0.0,
                mean_failed: 0.0,
                mean_pending: 0.0,
                mean_success_rate: 0.0,
                mean_wait: 0.0,
            };
        }
        let n = n_runs as f64;
        let mean = |f: fn(&RunSummary) -> f64| summaries.iter().map(f).sum::<f64>() / n;
        Self {
            n_runs,
            mean_completed: mean(|s| s.completed as f64),
            mean_failed: mean(|s| s.failed as f64),
            mean_pending: mean(|s| s.pending as f64),
            mean_success_rate: mean(|s| s.success_rate() * 100.0),
            mean_wait: mean(|s| s.mean_wait),
        }
    }
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Evaluation Metrics ({} runs) ===", self.n_runs)?;
        writeln!(f, "  Mean completed:          {:.1}", self.mean_completed)?;
        writeln!(f, "  Mean failed:             {:.1}", self.mean_failed)?;
        writeln!(f, "  Mean pending:            {:.1}", self.mean_pending)?;
        writeln!(f, "  Mean success rate:       {:.1}%", self.mean_success_rate)?;
        write!(f, "  Mean wait:               {:.1} s", self.mean_wait)
    }
}

/// Runs `strategies` with `kind` for `steps` ticks on one fresh park per
/// seed, in parallel, and aggregates the outcomes.
///
/// Each run uses `config` with its seed replaced.
pub fn evaluate_batch(
    config: &ParkConfig,
    strategies: &TaskStrategy,
    kind: StrategyKind,
    seeds: &[u64],
    steps: usize,
) -> Result<EvaluationMetrics, StrategyError> {
    let summaries: Vec<RunSummary> = seeds
        .par_iter()
        .map(|&seed| -> Result<RunSummary, StrategyError> {
            let mut env = ParkEnv::new(ParkConfig {
                seed,
                ..config.clone()
            })?;
            let mut strategies = strategies.clone();
            for _ in 0..steps {
                strategies.update(&mut env, kind)?;
            }
            Ok(env.run_summary())
        })
        .collect::<Result<_, StrategyError>>()?;

    let metrics = EvaluationMetrics::from_summaries(&summaries);
    info!(
        strategy = %kind,
        runs = metrics.n_runs,
        completed = metrics.mean_completed,
        success_rate = metrics.mean_success_rate,
        "evaluation finished"
    );
    Ok(metrics)
}
