//! Immutable status snapshot consumed by strategies and observers.

use qtty::{Quantity, Second};

use crate::model::{Position, RobotState};

/// One robot's externally visible state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RobotStatus {
    pub id: u32,
    pub position: Position,
    pub state: RobotState,
    pub soc: f64,
}

/// Snapshot of the environment between two ticks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status {
    /// Simulated time since the run started.
    pub time: Quantity<Second>,
    pub robots: Vec<RobotStatus>,
    pub needs_charge: usize,
    pub charging: usize,
    pub completed: usize,
    pub failed: usize,
    /// SoC of every battery in the station pool.
    pub station_soc: Vec<f64>,
}

impl Status {
    /// Vehicles currently tracked (waiting or being served).
    pub fn active_vehicles(&self) -> usize {
        self.needs_charge + self.charging
    }

    /// Mean SoC over the robot fleet, 0 for an empty fleet.
    pub fn mean_robot_soc(&self) -> f64 {
        if self.robots.is_empty() {
            return 0.0;
        }
        self.robots.iter().map(|r| r.soc).sum::<f64>() / self.robots.len() as f64
    }

    /// Number of robots in `state`.
    pub fn robots_in(&self, state: RobotState) -> usize {
        self.robots.iter().filter(|r| r.state == state).count()
    }
}

/// Outcome counters for one run, taken at any point of the run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSummary {
    /// Simulated seconds elapsed.
    pub elapsed: f64,
    pub completed: usize,
    pub failed: usize,
    /// Vehicles still waiting or charging.
    pub pending: usize,
    /// Mean seconds a finished vehicle spent waiting for a robot.
    pub mean_wait: f64,
}

impl RunSummary {
    /// Share of finished vehicles that completed, 0 when none finished.
    pub fn success_rate(&self) -> f64 {
        let finished = self.completed + self.failed;
        if finished == 0 {
            0.0
        } else {
            self.completed as f64 / finished as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_handles_empty_run() {
        assert_eq!(RunSummary::default().success_rate(), 0.0);
        let summary = RunSummary {
            completed: 3,
            failed: 1,
            ..RunSummary::default()
        };
        assert_eq!(summary.success_rate(), 0.75);
    }
}
