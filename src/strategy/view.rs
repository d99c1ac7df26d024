//! Read-only planning input shared by every strategy.

use tracing::warn;

use crate::engine::ParkEnv;
use crate::model::{Position, VehicleId};

/// An idle robot that may be dispatched this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotCandidate {
    /// Roster index, as accepted by [`ParkEnv::assign`].
    pub index: usize,
    pub id: u32,
    pub position: Position,
    pub soc: f64,
}

/// A vehicle waiting for a robot.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleCandidate {
    /// Arena handle.
    pub id: VehicleId,
    /// Position in the waiting list.
    pub slot: usize,
    pub position: Position,
    pub soc: f64,
    /// Missing energy in kWh.
    pub energy_gap: f64,
    /// Seconds until departure.
    pub time_to_deadline: f64,
}

impl VehicleCandidate {
    /// Energy gap per remaining second, with the remaining time floored at 0.1 s.
    pub fn urgency(&self) -> f64 {
        self.energy_gap / self.time_to_deadline.max(0.1)
    }
}

/// One planned robot–vehicle pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    /// Roster index of the robot.
    pub robot: usize,
    pub vehicle: VehicleId,
}

/// Snapshot of everything a strategy may look at for one tick.
///
/// `robots` holds only dispatchable robots and `vehicles` only waiting
/// vehicles, in waiting-list order. `feasible[r][v]` tells whether robot
/// `robots[r]` can reach `vehicles[v]` and still return home.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DispatchView {
    pub robots: Vec<RobotCandidate>,
    pub vehicles: Vec<VehicleCandidate>,
    pub feasible: Vec<Vec<bool>>,
    /// Park diagonal, the largest possible distance.
    pub diagonal: f64,
    /// Robots on the roster, dispatchable or not.
    pub roster_size: usize,
    pub max_vehicles: usize,
    /// Mean SoC over the whole roster.
    pub fleet_mean_soc: f64,
}

impl DispatchView {
    pub fn from_env(env: &ParkEnv) -> Self {
        let robots: Vec<RobotCandidate> = env
            .robots()
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_dispatchable())
            .map(|(index, r)| RobotCandidate {
                index,
                id: r.id,
                position: r.position,
                soc: r.soc(),
            })
            .collect();

        let vehicles: Vec<VehicleCandidate> = env
            .needs_charge()
            .iter()
            .enumerate()
            .filter_map(|(slot, &id)| {
                env.vehicle(id).map(|v| VehicleCandidate {
                    id,
                    slot,
                    position: v.spot,
                    soc: v.soc(),
                    energy_gap: v.energy_gap(),
                    time_to_deadline: v.time_to_deadline(),
                })
            })
            .collect();

        let feasible = robots
            .iter()
            .map(|rc| {
                let robot = &env.robots()[rc.index];
                vehicles
                    .iter()
                    .map(|vc| robot.can_service(&vc.position))
                    .collect()
            })
            .collect();

        let roster = env.robots();
        let fleet_mean_soc = if roster.is_empty() {
            0.0
        } else {
            roster.iter().map(|r| r.soc()).sum::<f64>() / roster.len() as f64
        };

        Self {
            robots,
            vehicles,
            feasible,
            diagonal: env.config().diagonal(),
            roster_size: roster.len(),
            max_vehicles: env.config().max_vehicles,
            fleet_mean_soc,
        }
    }

    /// True when nothing can be dispatched.
    pub fn is_idle(&self) -> bool {
        self.robots.is_empty() || self.vehicles.is_empty()
    }

    /// Distance from candidate robot `r` to candidate vehicle `v`.
    pub fn distance(&self, r: usize, v: usize) -> f64 {
        self.robots[r].position.distance_to(&self.vehicles[v].position)
    }

    /// Missing entries count as infeasible.
    pub fn is_feasible(&self, r: usize, v: usize) -> bool {
        self.feasible
            .get(r)
            .and_then(|row| row.get(v))
            .copied()
            .unwrap_or(false)
    }

    /// Mean SoC of the waiting vehicles, 0 when none wait.
    pub fn waiting_mean_soc(&self) -> f64 {
        if self.vehicles.is_empty() {
            return 0.0;
        }
        self.vehicles.iter().map(|v| v.soc).sum::<f64>() / self.vehicles.len() as f64
    }

    /// Candidate index of the closest feasible robot not yet `used`.
    pub fn nearest_free_robot(&self, v: usize, used: &[bool]) -> Option<usize> {
        (0..self.robots.len())
            .filter(|&r| !used.get(r).copied().unwrap_or(false) && self.is_feasible(r, v))
            .min_by(|&a, &b| self.distance(a, v).total_cmp(&self.distance(b, v)))
    }

    /// Builds the assignment pairing candidate robot `r` with candidate vehicle `v`.
    pub fn pair(&self, r: usize, v: usize) -> Assignment {
        Assignment {
            robot: self.robots[r].index,
            vehicle: self.vehicles[v].id,
        }
    }

    /// Sum of robot–vehicle distances over `plan`.
    pub fn total_distance(&self, plan: &[Assignment]) -> f64 {
        plan.iter()
            .filter_map(|a| {
                let r = self.robots.iter().find(|r| r.index == a.robot)?;
                let v = self.vehicles.iter().find(|v| v.id == a.vehicle)?;
                Some(r.position.distance_to(&v.position))
            })
            .sum()
    }
}

/// Applies `plan` to `env`, skipping assignments the engine rejects.
///
/// Returns the number of committed assignments.
pub fn commit(env: &mut ParkEnv, plan: &[Assignment]) -> usize {
    let mut committed = 0;
    for assignment in plan {
        match env.assign(assignment.robot, assignment.vehicle) {
            Ok(()) => committed += 1,
            Err(err) => warn!(
                run = %env.run_id(),
                robot = assignment.robot,
                vehicle = assignment.vehicle,
                %err,
                "assignment rejected"
            ),
        }
    }
    committed
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Builds a view from robot positions and `(x, y, gap, time_to_deadline)`
    /// vehicles. Every pair is feasible and every robot is full.
    pub fn view(robots: &[(f64, f64)], vehicles: &[(f64, f64, f64, f64)]) -> DispatchView {
        DispatchView {
            robots: robots
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| RobotCandidate {
                    index: i,
                    id: i as u32 + 1,
                    position: Position::new(x, y),
                    soc: 100.0,
                })
                .collect(),
            vehicles: vehicles
                .iter()
                .enumerate()
                .map(|(i, &(x, y, gap, ttd))| VehicleCandidate {
                    id: i,
                    slot: i,
                    position: Position::new(x, y),
                    soc: 20.0,
                    energy_gap: gap,
                    time_to_deadline: ttd,
                })
                .collect(),
            feasible: vec![vec![true; vehicles.len()]; robots.len()],
            diagonal: 100.0 * 2f64.sqrt(),
            roster_size: robots.len(),
            max_vehicles: vehicles.len().max(1),
            fleet_mean_soc: 100.0,
        }
    }
}
