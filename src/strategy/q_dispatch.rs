//! Dispatch by a learned Q-table.
//!
//! An action encodes one pairing as `robot · max_vehicles + slot`, where
//! `robot` is a roster index and `slot` a position in the waiting list.

use super::error::StrategyError;
use super::trait_::AssignmentStrategy;
use super::view::{Assignment, DispatchView};
use crate::rl::{QTable, StateEncoder};

/// Encodes a (roster index, waiting slot) pair.
pub fn encode_action(robot: usize, slot: usize, max_vehicles: usize) -> usize {
    robot * max_vehicles + slot
}

/// Decodes an action into (roster index, waiting slot).
pub fn decode_action(action: usize, max_vehicles: usize) -> (usize, usize) {
    let max_vehicles = max_vehicles.max(1);
    (action / max_vehicles, action % max_vehicles)
}

/// Tracks which actions remain valid while a tick's pairings are chosen.
///
/// An action is valid when its robot is dispatchable and unused, its slot
/// holds an unused waiting vehicle, and the robot can serve that vehicle.
#[derive(Debug, Clone)]
pub struct ActionSpace<'a> {
    view: &'a DispatchView,
    /// Roster index → candidate robot.
    robot_of: Vec<Option<usize>>,
    /// Waiting slot → candidate vehicle.
    vehicle_of: Vec<Option<usize>>,
    robot_used: Vec<bool>,
    vehicle_used: Vec<bool>,
}

impl<'a> ActionSpace<'a> {
    pub fn new(view: &'a DispatchView) -> Self {
        let mut robot_of = vec![None; view.roster_size];
        for (r, robot) in view.robots.iter().enumerate() {
            if let Some(entry) = robot_of.get_mut(robot.index) {
                *entry = Some(r);
            }
        }
        let mut vehicle_of = vec![None; view.max_vehicles];
        for (v, vehicle) in view.vehicles.iter().enumerate() {
            if let Some(entry) = vehicle_of.get_mut(vehicle.slot) {
                *entry = Some(v);
            }
        }
        Self {
            view,
            robot_of,
            vehicle_of,
            robot_used: vec![false; view.robots.len()],
            vehicle_used: vec![false; view.vehicles.len()],
        }
    }

    /// Size of the full action space, valid or not.
    pub fn len(&self) -> usize {
        self.view.roster_size * self.view.max_vehicles
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Candidate (robot, vehicle) indices of a valid action.
    fn resolve(&self, action: usize) -> Option<(usize, usize)> {
        if action >= self.len() {
            return None;
        }
        let (robot, slot) = decode_action(action, self.view.max_vehicles);
        let r = self.robot_of.get(robot).copied().flatten()?;
        let v = self.vehicle_of.get(slot).copied().flatten()?;
        let free = !self.robot_used[r] && !self.vehicle_used[v];
        (free && self.view.is_feasible(r, v)).then_some((r, v))
    }

    pub fn is_valid(&self, action: usize) -> bool {
        self.resolve(action).is_some()
    }

    /// All currently valid actions in ascending order.
    pub fn valid_actions(&self) -> Vec<usize> {
        let mut actions = Vec::new();
        for (r, robot) in self.view.robots.iter().enumerate() {
            if self.robot_used[r] {
                continue;
            }
            for (v, vehicle) in self.view.vehicles.iter().enumerate() {
                if !self.vehicle_used[v] && self.view.is_feasible(r, v) && vehicle.slot < self.view.max_vehicles {
                    actions.push(encode_action(robot.index, vehicle.slot, self.view.max_vehicles));
                }
            }
        }
        actions.sort_unstable();
        actions
    }

    /// Copies `row` with every invalid action set to `-∞`.
    pub fn mask(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(a, &q)| if self.is_valid(a) { q } else { f64::NEG_INFINITY })
            .collect()
    }

    /// Consumes a valid action, returning its pairing.
    pub fn take(&mut self, action: usize) -> Option<Assignment> {
        let (r, v) = self.resolve(action)?;
        self.robot_used[r] = true;
        self.vehicle_used[v] = true;
        Some(self.view.pair(r, v))
    }
}

/// Repeatedly picks the highest-valued valid action for the current state.
#[derive(Debug, Clone)]
pub struct QTableDispatch {
    table: QTable,
    encoder: StateEncoder,
}

impl QTableDispatch {
    pub fn new(table: QTable) -> Self {
        let encoder = StateEncoder::new(table.n_states());
        Self { table, encoder }
    }

    /// Checks that the table's action space matches the park.
    pub fn for_park(table: QTable, n_robots: usize, max_vehicles: usize) -> Result<Self, StrategyError> {
        let expected = n_robots * max_vehicles;
        if table.n_actions() != expected {
            return Err(StrategyError::ActionSpaceMismatch {
                expected,
                actual: table.n_actions(),
            });
        }
        Ok(Self::new(table))
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }
}

impl AssignmentStrategy for QTableDispatch {
    fn plan(&mut self, view: &DispatchView) -> Vec<Assignment> {
        let state = self.encoder.encode(view);
        let Some(row) = self.table.row(state) else {
            return Vec::new();
        };
        let mut space = ActionSpace::new(view);
        let mut plan = Vec::new();
        for _ in 0..view.roster_size {
            let masked = space.mask(row);
            let best = masked
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
                .filter(|&(_, &q)| q != f64::NEG_INFINITY)
                .map(|(a, _)| a);
            let Some(action) = best else {
                break;
            };
            match space.take(action) {
                Some(assignment) => plan.push(assignment),
                None => break,
            }
        }
        plan
    }

    fn name(&self) -> &str {
        "q_learning"
    }
}
