//! The park simulation engine.
//!
//! [`ParkEnv`] owns every entity of a run: the vehicle arena, the four
//! lifecycle lists indexing into it, the robot roster, and the battery
//! station. One call to [`ParkEnv::update`] advances the whole park by one
//! tick; strategies commit assignments between ticks through
//! [`ParkEnv::assign`].

use qtty::{Quantity, Second};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use super::arrivals::{VehicleProfile, VehicleSampler};
use super::config::{MapScale, ParkConfig};
use super::error::{ConfigError, DispatchError, InvariantViolation};
use super::status::{RobotStatus, RunSummary, Status};
use crate::model::{
    Battery, BatteryStation, Position, Robot, RobotState, Vehicle, VehicleEvent, VehicleId,
    VehicleState,
};
use crate::strategy::DispatchView;
use crate::{generate_run_id, RunId};

/// Deep copy of the mutable part of a [`ParkEnv`].
///
/// Restoring a snapshot rewinds the clock, the entities, and the arrival RNG.
#[derive(Debug, Clone)]
pub struct EnvSnapshot {
    time: Quantity<Second>,
    vehicles: Vec<Vehicle>,
    needs_charge: Vec<VehicleId>,
    charging: Vec<VehicleId>,
    completed: Vec<VehicleId>,
    failed: Vec<VehicleId>,
    robots: Vec<Robot>,
    station: BatteryStation,
    rng: StdRng,
    next_vehicle_id: u32,
}

/// Time-stepped campus simulation.
///
/// # Lifecycle
///
/// 1. Build with [`ParkEnv::new`] or [`ParkEnv::from_scale`].
/// 2. Between ticks, let a strategy commit assignments via [`ParkEnv::assign`].
/// 3. Call [`ParkEnv::update`] (or [`ParkEnv::step`]) to advance the clock.
/// 4. Inspect [`ParkEnv::status`] or [`ParkEnv::run_summary`].
#[derive(Debug)]
pub struct ParkEnv {
    run_id: RunId,
    config: ParkConfig,
    time: Quantity<Second>,
    /// Every vehicle ever admitted; lists hold handles into it.
    vehicles: Vec<Vehicle>,
    needs_charge: Vec<VehicleId>,
    charging: Vec<VehicleId>,
    completed: Vec<VehicleId>,
    failed: Vec<VehicleId>,
    robots: Vec<Robot>,
    station: BatteryStation,
    sampler: VehicleSampler,
    rng: StdRng,
    next_vehicle_id: u32,
}

impl ParkEnv {
    /// Builds an environment with the default vehicle profile.
    pub fn new(config: ParkConfig) -> Result<Self, ConfigError> {
        Self::with_profile(config, &VehicleProfile::default())
    }

    /// Builds the preset environment for `scale`.
    pub fn from_scale(scale: MapScale, seed: u64) -> Result<Self, ConfigError> {
        Self::new(ParkConfig {
            seed,
            ..ParkConfig::for_scale(scale)
        })
    }

    /// Builds an environment drawing arrivals from `profile`.
    pub fn with_profile(config: ParkConfig, profile: &VehicleProfile) -> Result<Self, ConfigError> {
        config.validate()?;
        let sampler = VehicleSampler::new(profile)?;

        // Robots dock at the station in the park centre.
        let centre = Position::new(config.park_width / 2.0, config.park_height / 2.0);
        let robots = (0..config.n_robots)
            .map(|i| {
                Robot::new(
                    i as u32 + 1,
                    centre,
                    config.robot_speed,
                    config.swap_duration,
                    config.robot_reserve_soc,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let pool = (0..config.n_batteries).map(|_| Battery::fleet_pack()).collect();
        let station = BatteryStation::new(centre, pool);

        let run_id = generate_run_id();
        debug!(run = %run_id, robots = config.n_robots, seed = config.seed, "park environment created");

        Ok(Self {
            run_id,
            rng: StdRng::seed_from_u64(config.seed),
            config,
            time: Quantity::new(0.0),
            vehicles: Vec::new(),
            needs_charge: Vec::new(),
            charging: Vec::new(),
            completed: Vec::new(),
            failed: Vec::new(),
            robots,
            station,
            sampler,
            next_vehicle_id: 1,
        })
    }

    // --- Accessors ---

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn config(&self) -> &ParkConfig {
        &self.config
    }

    /// Simulated time since the start of the run.
    pub fn time(&self) -> Quantity<Second> {
        self.time
    }

    /// The vehicle arena. Handles in the lifecycle lists index into it.
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    pub fn station(&self) -> &BatteryStation {
        &self.station
    }

    /// Vehicles waiting for a robot, in admission order.
    pub fn needs_charge(&self) -> &[VehicleId] {
        &self.needs_charge
    }

    pub fn charging(&self) -> &[VehicleId] {
        &self.charging
    }

    pub fn completed(&self) -> &[VehicleId] {
        &self.completed
    }

    pub fn failed(&self) -> &[VehicleId] {
        &self.failed
    }

    /// Vehicles currently waiting or being served.
    pub fn active_vehicles(&self) -> usize {
        self.needs_charge.len() + self.charging.len()
    }

    // --- Simulation ---

    /// Advances the park by the configured time step.
    pub fn step(&mut self) {
        self.update(self.config.time_step);
    }

    /// Advances the park by `dt` seconds.
    ///
    /// Order: clock, arrival, robots (after queueing swaps), waiting
    /// vehicles, charging vehicles, station. Robots whose target finished
    /// during the tick are released at the end so no robot keeps serving a
    /// departed vehicle between ticks.
    ///
    /// A negative or non-finite `dt` is logged and the tick is skipped.
    pub fn update(&mut self, dt: f64) {
        if !(dt.is_finite() && dt >= 0.0) {
            warn!(run = %self.run_id, dt, "tick length rejected");
            return;
        }
        self.time = self.time + Quantity::new(dt);
        self.admit_arrival(dt);

        for (index, robot) in self.robots.iter().enumerate() {
            if robot.state() == RobotState::NeedsSwap {
                self.station.enqueue(index, robot);
            }
        }
        for robot in self.robots.iter_mut() {
            robot.update(dt, &mut self.vehicles);
        }

        self.advance_list(dt, VehicleState::NeedsCharge);
        self.advance_list(dt, VehicleState::Charging);

        self.station.update(dt, &mut self.robots);

        for robot in self.robots.iter_mut() {
            robot.release_finished_target(&self.vehicles);
        }
    }

    /// Commits one robot–vehicle pairing.
    ///
    /// `robot` is a roster index, `vehicle` an arena handle. On error nothing
    /// changes.
    pub fn assign(&mut self, robot: usize, vehicle: VehicleId) -> Result<(), DispatchError> {
        let target = self
            .vehicles
            .get(vehicle)
            .ok_or(DispatchError::UnknownVehicle(vehicle))?;
        let candidate = self
            .robots
            .get_mut(robot)
            .ok_or(DispatchError::UnknownRobot(robot))?;

        if candidate.state() != RobotState::Available {
            return Err(DispatchError::RobotBusy(candidate.id));
        }
        let slot = self
            .needs_charge
            .iter()
            .position(|&id| id == vehicle)
            .filter(|_| target.state() == VehicleState::NeedsCharge)
            .ok_or(DispatchError::VehicleNotWaiting(target.id))?;
        if !candidate.is_dispatchable() || !candidate.can_service(&target.spot) {
            return Err(DispatchError::InsufficientCharge {
                robot: candidate.id,
                vehicle: target.id,
            });
        }

        candidate.assign_task(vehicle, target)?;
        let robot_id = candidate.id;
        if let Some(target) = self.vehicles.get_mut(vehicle) {
            target.apply(VehicleEvent::Assigned)?;
            debug!(run = %self.run_id, robot = robot_id, vehicle = target.id, "robot dispatched");
        }
        self.needs_charge.remove(slot);
        self.charging.push(vehicle);
        Ok(())
    }

    /// Inserts a vehicle into the arena and onto the list matching its state.
    ///
    /// Bypasses the arrival process and the `max_vehicles` cap. Returns the
    /// new handle.
    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> VehicleId {
        let handle = self.vehicles.len();
        self.next_vehicle_id = self.next_vehicle_id.max(vehicle.id.saturating_add(1));
        let state = vehicle.state();
        self.vehicles.push(vehicle);
        self.list_mut(state).push(handle);
        handle
    }

    /// Replaces the arrival RNG with a fresh one seeded from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn snapshot(&self) -> EnvSnapshot {
        EnvSnapshot {
            time: self.time,
            vehicles: self.vehicles.clone(),
            needs_charge: self.needs_charge.clone(),
            charging: self.charging.clone(),
            completed: self.completed.clone(),
            failed: self.failed.clone(),
            robots: self.robots.clone(),
            station: self.station.clone(),
            rng: self.rng.clone(),
            next_vehicle_id: self.next_vehicle_id,
        }
    }

    /// Rewinds the environment to `snapshot`. The run id is kept.
    pub fn restore(&mut self, snapshot: &EnvSnapshot) {
        self.time = snapshot.time;
        self.vehicles.clone_from(&snapshot.vehicles);
        self.needs_charge.clone_from(&snapshot.needs_charge);
        self.charging.clone_from(&snapshot.charging);
        self.completed.clone_from(&snapshot.completed);
        self.failed.clone_from(&snapshot.failed);
        self.robots.clone_from(&snapshot.robots);
        self.station.clone_from(&snapshot.station);
        self.rng = snapshot.rng.clone();
        self.next_vehicle_id = snapshot.next_vehicle_id;
    }

    // --- Observation ---

    /// Current status snapshot. Calling it never changes the environment.
    pub fn status(&self) -> Status {
        Status {
            time: self.time,
            robots: self
                .robots
                .iter()
                .map(|r| RobotStatus {
                    id: r.id,
                    position: r.position,
                    state: r.state(),
                    soc: r.soc(),
                })
                .collect(),
            needs_charge: self.needs_charge.len(),
            charging: self.charging.len(),
            completed: self.completed.len(),
            failed: self.failed.len(),
            station_soc: self.station.soc_levels(),
        }
    }

    /// Read-only planning view for assignment strategies.
    pub fn dispatch_view(&self) -> DispatchView {
        DispatchView::from_env(self)
    }

    /// Finished vehicles not yet handed out, marking them counted.
    ///
    /// Each completed or failed vehicle is returned by exactly one call.
    pub fn take_uncounted_terminals(&mut self) -> Vec<VehicleId> {
        let mut fresh = Vec::new();
        for &id in self.completed.iter().chain(self.failed.iter()) {
            if let Some(vehicle) = self.vehicles.get_mut(id) {
                if vehicle.mark_counted() {
                    fresh.push(id);
                }
            }
        }
        fresh
    }

    pub fn run_summary(&self) -> RunSummary {
        let finished: Vec<&Vehicle> = self
            .completed
            .iter()
            .chain(self.failed.iter())
            .filter_map(|&id| self.vehicles.get(id))
            .collect();
        let mean_wait = if finished.is_empty() {
            0.0
        } else {
            finished.iter().map(|v| v.wait_time).sum::<f64>() / finished.len() as f64
        };
        RunSummary {
            elapsed: self.time.value(),
            completed: self.completed.len(),
            failed: self.failed.len(),
            pending: self.active_vehicles(),
            mean_wait,
        }
    }

    /// Verifies list membership and robot–vehicle consistency.
    ///
    /// Every arena vehicle must sit on exactly one lifecycle list matching
    /// its state, and every discharging robot must target a charging vehicle.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let lists: [(&'static str, &[VehicleId], VehicleState); 4] = [
            ("needs-charge", &self.needs_charge, VehicleState::NeedsCharge),
            ("charging", &self.charging, VehicleState::Charging),
            ("completed", &self.completed, VehicleState::Completed),
            ("failed", &self.failed, VehicleState::Failed),
        ];
        let mut membership = vec![0usize; self.vehicles.len()];
        for (name, ids, expected) in lists {
            for &id in ids {
                let Some(vehicle) = self.vehicles.get(id) else {
                    continue;
                };
                membership[id] += 1;
                if vehicle.state() != expected {
                    return Err(InvariantViolation::StateMismatch {
                        id: vehicle.id,
                        state: vehicle.state().to_string(),
                        list: name,
                    });
                }
            }
        }
        for (vehicle, &count) in self.vehicles.iter().zip(&membership) {
            if count != 1 {
                return Err(InvariantViolation::ListMembership {
                    id: vehicle.id,
                    count,
                });
            }
        }
        for robot in self.robots.iter().filter(|r| r.state() == RobotState::Discharging) {
            let serving = robot
                .target()
                .and_then(|id| self.vehicles.get(id))
                .is_some_and(|v| v.state() == VehicleState::Charging);
            if !serving {
                return Err(InvariantViolation::DischargingWithoutTarget { robot: robot.id });
            }
        }
        Ok(())
    }

    // --- Internals ---

    fn admit_arrival(&mut self, dt: f64) {
        let probability = (self.config.arrival_probability * dt).clamp(0.0, 1.0);
        // The draw happens every tick so the RNG stream does not depend on occupancy.
        let arrives = self.rng.gen_bool(probability);
        if !arrives || self.active_vehicles() >= self.config.max_vehicles {
            return;
        }
        let sampled = self.sampler.sample(
            &mut self.rng,
            self.next_vehicle_id,
            self.config.park_width,
            self.config.park_height,
        );
        match sampled {
            Ok(vehicle) => {
                debug!(
                    run = %self.run_id,
                    vehicle = vehicle.id,
                    soc = vehicle.soc(),
                    required = vehicle.required_soc,
                    deadline = vehicle.deadline,
                    "vehicle arrived"
                );
                self.next_vehicle_id += 1;
                self.add_vehicle(vehicle);
            }
            Err(err) => warn!(run = %self.run_id, %err, "vehicle sampling failed"),
        }
    }

    /// Updates every vehicle on the `from` list and moves it to the list of
    /// its new state.
    fn advance_list(&mut self, dt: f64, from: VehicleState) {
        let ids = std::mem::take(self.list_mut(from));
        for id in ids {
            let Some(vehicle) = self.vehicles.get_mut(id) else {
                continue;
            };
            vehicle.update(dt);
            let state = vehicle.state();
            if state != from {
                debug!(run = %self.run_id, vehicle = vehicle.id, from = %from, to = %state, "vehicle migrated");
            }
            self.list_mut(state).push(id);
        }
    }

    fn list_mut(&mut self, state: VehicleState) -> &mut Vec<VehicleId> {
        match state {
            VehicleState::NeedsCharge => &mut self.needs_charge,
            VehicleState::Charging => &mut self.charging,
            VehicleState::Completed => &mut self.completed,
            VehicleState::Failed => &mut self.failed,
        }
    }
}
