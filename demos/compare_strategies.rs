// Demonstration: compare every dispatch strategy on one map scale.
//
// Run from the repo root:
//   cargo run --example compare_strategies -- --scale medium --runs 8 --steps 2000 --episodes 200

use std::env;
use std::process;

use robocharge::{
    evaluate_batch, MapScale, ParkConfig, ParkEnv, QLearningTrainer, StrategyKind, TaskStrategy,
    TrainingConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = env::args().collect();
    let scale: MapScale = match arg_value(&args, "--scale").unwrap_or("small").parse() {
        Ok(scale) => scale,
        Err(err) => {
            eprintln!("{err}; expected 'small', 'medium' or 'large'.");
            process::exit(2);
        }
    };
    let runs: u64 = arg_value(&args, "--runs")
        .and_then(|s| s.parse().ok())
        .unwrap_or(8);
    let steps: usize = arg_value(&args, "--steps")
        .and_then(|s| s.parse().ok())
        .unwrap_or(2000);
    let episodes: usize = arg_value(&args, "--episodes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(100);

    let config = ParkConfig::for_scale(scale);
    let seeds: Vec<u64> = (0..runs).map(|i| config.seed + i).collect();

    let strategies = match trained_strategies(&config, scale, steps, episodes) {
        Ok(strategies) => strategies,
        Err(err) => {
            eprintln!("Training failed: {err}");
            process::exit(1);
        }
    };

    for kind in StrategyKind::all() {
        match evaluate_batch(&config, &strategies, kind, &seeds, steps) {
            Ok(metrics) => {
                println!("Strategy: {kind} ({scale})");
                println!("{metrics}");
                println!();
            }
            Err(err) => eprintln!("Strategy {kind} failed: {err}"),
        }
    }
}

/// Trains a Q-table on `config` and attaches it to the scale's strategies.
fn trained_strategies(
    config: &ParkConfig,
    scale: MapScale,
    steps: usize,
    episodes: usize,
) -> Result<TaskStrategy, Box<dyn std::error::Error>> {
    let mut env = ParkEnv::new(config.clone())?;
    let training = TrainingConfig {
        episodes,
        max_steps: steps,
        log_interval: (episodes / 10).max(1),
        seed: config.seed,
        ..TrainingConfig::default()
    };
    let mut trainer = QLearningTrainer::for_env(&env, training)?;
    let report = trainer.train(&mut env)?;
    println!(
        "Q-learning: {} episodes, mean reward {:.2}",
        report.episodes.len(),
        report.mean_reward()
    );
    Ok(TaskStrategy::new(scale).with_q_table(trainer.into_table(), &env)?)
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
