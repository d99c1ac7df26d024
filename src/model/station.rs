//! Battery swap station: a pool of batteries plus a queue of robots waiting to swap.

use tracing::{debug, warn};

use super::battery::Battery;
use super::robot::{Robot, RobotState};
use super::types::Position;

/// Minimum SoC (%) a pool battery must exceed to be handed to a robot.
pub const MIN_SWAP_SOC: f64 = 50.0;

/// Centralised battery pool and swap server.
///
/// Swaps are greedy on SoC: each queued robot receives the best battery
/// currently in the pool, regardless of queue order. Under sustained load a
/// robot may wait until a pool battery recharges past its own SoC.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatteryStation {
    pub location: Position,
    pool: Vec<Battery>,
    queue: Vec<usize>,
}

impl BatteryStation {
    pub fn new(location: Position, pool: Vec<Battery>) -> Self {
        Self {
            location,
            pool,
            queue: Vec::new(),
        }
    }

    pub fn batteries(&self) -> &[Battery] {
        &self.pool
    }

    /// Roster indices of robots waiting to swap, in arrival order.
    pub fn queue(&self) -> &[usize] {
        &self.queue
    }

    /// Queues the robot at `index` for a swap.
    ///
    /// Only robots in `NeedsSwap` are accepted; a robot already queued is
    /// not added twice. Returns `true` if the robot is queued afterwards.
    pub fn enqueue(&mut self, index: usize, robot: &Robot) -> bool {
        if robot.state() != RobotState::NeedsSwap {
            warn!(robot = robot.id, state = %robot.state(), "swap enqueue rejected");
            return false;
        }
        if !self.queue.contains(&index) {
            self.queue.push(index);
        }
        true
    }

    /// Highest SoC in the pool, if the pool is not empty.
    pub fn max_soc(&self) -> Option<f64> {
        self.pool.iter().map(Battery::soc).reduce(f64::max)
    }

    /// Removes and returns the pool battery with the highest SoC.
    pub fn provide_highest_soc_battery(&mut self) -> Option<Battery> {
        let idx = self
            .pool
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.soc().total_cmp(&b.soc()))
            .map(|(i, _)| i)?;
        Some(self.pool.remove(idx))
    }

    /// Takes a depleted battery into the pool, flagged for charging.
    pub fn receive_battery(&mut self, mut battery: Battery) {
        battery.mark_non_full();
        self.pool.push(battery);
    }

    /// Pool SoC levels in pool order.
    pub fn soc_levels(&self) -> Vec<f64> {
        self.pool.iter().map(Battery::soc).collect()
    }

    /// Serves the swap queue, then charges the pool for `dt` seconds.
    pub fn update(&mut self, dt: f64, robots: &mut [Robot]) {
        self.serve_queue(robots);
        for battery in self.pool.iter_mut().filter(|b| !b.is_flagged_full()) {
            let energy = battery.charge_energy(dt);
            battery.charge_kwh(energy);
            if battery.is_full() {
                battery.mark_full();
            }
        }
    }

    fn serve_queue(&mut self, robots: &mut [Robot]) {
        let queue = std::mem::take(&mut self.queue);
        for index in queue {
            let Some(robot) = robots.get_mut(index) else {
                continue;
            };
            if robot.state() != RobotState::NeedsSwap {
                continue;
            }
            let usable = self
                .max_soc()
                .is_some_and(|best| best > robot.soc() && best > MIN_SWAP_SOC);
            if !usable {
                self.queue.push(index);
                continue;
            }
            let Some(fresh) = self.provide_highest_soc_battery() else {
                self.queue.push(index);
                continue;
            };
            let fresh_soc = fresh.soc();
            match robot.swap_battery(fresh) {
                Ok(depleted) => {
                    debug!(robot = robot.id, from = depleted.soc(), to = fresh_soc, "battery swapped");
                    self.receive_battery(depleted);
                }
                Err(err) => {
                    warn!(robot = robot.id, %err, "battery swap rejected");
                    self.queue.push(index);
                }
            }
        }
    }
}
