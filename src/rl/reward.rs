//! Per-tick reward signals for Q-learning.

use crate::engine::ParkEnv;
use crate::model::{Vehicle, VehicleState};

/// Power, in kW, at which the arrival gap spread over the stay counts as
/// fully urgent.
const URGENT_POWER_KW: f64 = 100.0;

/// Reward magnitudes shared by every reward function.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RewardConfig {
    /// Base reward for a completed vehicle.
    pub completion_bonus: f64,
    /// Penalty for a failed vehicle.
    pub failure_penalty: f64,
    /// Reward per robot busy with a vehicle, every tick.
    pub busy_bonus: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            completion_bonus: 10.0,
            failure_penalty: 10.0,
            busy_bonus: 0.1,
        }
    }
}

/// How completions are weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RewardFunction {
    /// Completions of demanding vehicles (large gap, short stay) pay more.
    #[default]
    DemandWeighted,
    /// Completions close to the station pay more.
    DistanceWeighted,
}

impl RewardFunction {
    /// Reward for the tick just simulated.
    ///
    /// Each finished vehicle is counted once over the life of `env`.
    pub fn evaluate(&self, env: &mut ParkEnv, config: &RewardConfig) -> f64 {
        let mut reward = 0.0;
        for id in env.take_uncounted_terminals() {
            let Some(vehicle) = env.vehicle(id) else {
                continue;
            };
            match vehicle.state() {
                VehicleState::Completed => {
                    reward += config.completion_bonus * (1.0 + self.shaping(env, vehicle));
                }
                VehicleState::Failed => reward -= config.failure_penalty,
                VehicleState::NeedsCharge | VehicleState::Charging => {}
            }
        }
        let busy = env.robots().iter().filter(|r| r.state().is_busy()).count();
        reward + config.busy_bonus * busy as f64
    }

    /// Completion multiplier in `[0, 1]`.
    fn shaping(&self, env: &ParkEnv, vehicle: &Vehicle) -> f64 {
        match self {
            RewardFunction::DemandWeighted => {
                let hours = vehicle.stay / 3600.0;
                if hours <= 0.0 {
                    return 1.0;
                }
                (vehicle.arrival_gap() / hours / URGENT_POWER_KW).clamp(0.0, 1.0)
            }
            RewardFunction::DistanceWeighted => {
                let diagonal = env.config().diagonal();
                let distance = vehicle.spot.distance_to(&env.station().location);
                (1.0 - distance / diagonal).clamp(0.0, 1.0)
            }
        }
    }
}
