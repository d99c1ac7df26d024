//! Mobile charging robot state machine.
//!
//! A robot cycles `Available → GoToVehicle → Discharging → Available` while
//! its battery lasts, then `GoHome → NeedsSwap → Swapping → Available` to
//! exchange its battery at the station. Vehicles are referenced through
//! arena handles ([`VehicleId`]), never owned.

use std::fmt;

use tracing::{debug, warn};

use super::battery::Battery;
use super::error::ModelError;
use super::types::Position;
use super::vehicle::{Vehicle, VehicleEvent, VehicleId, VehicleState};

/// Driving consumption: 0.2 kWh per kilometre, one unit being one metre.
pub const KWH_PER_UNIT: f64 = 1.0 / 5000.0;

/// Fraction of the robot's battery draw that reaches the vehicle.
pub const TRANSFER_EFFICIENCY: f64 = 0.95;

/// Robot lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RobotState {
    Available,
    GoToVehicle,
    Discharging,
    GoHome,
    NeedsSwap,
    Swapping,
}

/// Events that drive [`RobotState`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotEvent {
    Dispatched,
    Arrived,
    /// The target finished (completed or failed). `low` routes the robot home.
    TargetReleased { low: bool },
    /// Charge fell to the safe-return threshold.
    LowCharge,
    ReachedHome,
    SwapStarted,
    SwapFinished,
}

impl RobotState {
    /// Transition table. `None` marks an invalid transition.
    pub fn next(self, event: RobotEvent) -> Option<RobotState> {
        use RobotEvent::*;
        use RobotState::*;
        match (self, event) {
            (Available, Dispatched) => Some(GoToVehicle),
            (Available, LowCharge) => Some(GoHome),
            (GoToVehicle, Arrived) => Some(Discharging),
            (GoToVehicle | Discharging, TargetReleased { low: false }) => Some(Available),
            (GoToVehicle | Discharging, TargetReleased { low: true }) => Some(GoHome),
            (GoToVehicle | Discharging, LowCharge) => Some(GoHome),
            (GoHome, ReachedHome) => Some(NeedsSwap),
            (NeedsSwap, SwapStarted) => Some(Swapping),
            (Swapping, SwapFinished) => Some(Available),
            (Available, Arrived | TargetReleased { .. } | ReachedHome | SwapStarted | SwapFinished) => None,
            (GoToVehicle, Dispatched | ReachedHome | SwapStarted | SwapFinished) => None,
            (Discharging, Dispatched | Arrived | ReachedHome | SwapStarted | SwapFinished) => None,
            (GoHome, _) => None,
            (NeedsSwap, _) => None,
            (Swapping, _) => None,
        }
    }

    /// True while the robot is committed to a vehicle.
    pub fn is_busy(&self) -> bool {
        matches!(self, RobotState::GoToVehicle | RobotState::Discharging)
    }
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobotState::Available => write!(f, "available"),
            RobotState::GoToVehicle => write!(f, "go-to-vehicle"),
            RobotState::Discharging => write!(f, "discharging"),
            RobotState::GoHome => write!(f, "go-home"),
            RobotState::NeedsSwap => write!(f, "needs-swap"),
            RobotState::Swapping => write!(f, "swapping"),
        }
    }
}

impl fmt::Display for RobotEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobotEvent::Dispatched => write!(f, "dispatched"),
            RobotEvent::Arrived => write!(f, "arrived"),
            RobotEvent::TargetReleased { low } => write!(f, "target-released(low={low})"),
            RobotEvent::LowCharge => write!(f, "low-charge"),
            RobotEvent::ReachedHome => write!(f, "reached-home"),
            RobotEvent::SwapStarted => write!(f, "swap-started"),
            RobotEvent::SwapFinished => write!(f, "swap-finished"),
        }
    }
}

/// A mobile charger with its own swappable battery.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Robot {
    pub id: u32,
    pub position: Position,
    pub home: Position,
    /// Travel speed in units per second.
    pub speed: f64,
    /// Seconds a battery swap takes.
    pub swap_duration: f64,
    /// SoC (%) at or below which an idle robot heads home.
    pub reserve_soc: f64,
    battery: Battery,
    state: RobotState,
    target: Option<VehicleId>,
    swap_timer: f64,
}

impl Robot {
    /// Creates an available robot docked at `home` with a full fleet pack.
    pub fn new(
        id: u32,
        home: Position,
        speed: f64,
        swap_duration: f64,
        reserve_soc: f64,
    ) -> Result<Self, ModelError> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ModelError::InvalidSpeed(speed));
        }
        if !(0.0..=100.0).contains(&reserve_soc) {
            return Err(ModelError::InvalidSoc(reserve_soc));
        }
        Ok(Self {
            id,
            position: home,
            home,
            speed,
            swap_duration,
            reserve_soc,
            battery: Battery::fleet_pack(),
            state: RobotState::Available,
            target: None,
            swap_timer: 0.0,
        })
    }

    pub fn state(&self) -> RobotState {
        self.state
    }

    pub fn target(&self) -> Option<VehicleId> {
        self.target
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    pub fn battery_mut(&mut self) -> &mut Battery {
        &mut self.battery
    }

    pub fn soc(&self) -> f64 {
        self.battery.soc()
    }

    pub fn swap_timer(&self) -> f64 {
        self.swap_timer
    }

    /// SoC (%) consumed by driving `distance` units.
    pub fn travel_soc(&self, distance: f64) -> f64 {
        distance * KWH_PER_UNIT / self.battery.capacity_kwh() * 100.0
    }

    /// SoC (%) required to drive from the current position back home.
    pub fn return_threshold(&self) -> f64 {
        self.travel_soc(self.position.distance_to(&self.home))
    }

    /// True if the robot may leave for a vehicle parked at `spot` and still get home.
    pub fn can_service(&self, spot: &Position) -> bool {
        let trip = self.position.distance_to(spot) + spot.distance_to(&self.home);
        self.battery.soc() - self.travel_soc(trip) > self.reserve_soc
    }

    /// True if the robot is idle and has charge to depart.
    pub fn is_dispatchable(&self) -> bool {
        self.state == RobotState::Available && self.battery.soc() > self.reserve_soc
    }

    /// Applies an event through the transition table.
    pub fn apply(&mut self, event: RobotEvent) -> Result<RobotState, ModelError> {
        match self.state.next(event) {
            Some(next) => {
                self.state = next;
                Ok(next)
            }
            None => Err(ModelError::InvalidTransition {
                entity: "robot",
                state: self.state.to_string(),
                event: event.to_string(),
            }),
        }
    }

    /// Dispatches the robot toward `vehicle`.
    ///
    /// The caller (the engine) transitions the vehicle and moves it between
    /// lifecycle lists; this only updates the robot side.
    pub fn assign_task(&mut self, vehicle_id: VehicleId, vehicle: &Vehicle) -> Result<(), ModelError> {
        if self.state != RobotState::Available || !self.can_service(&vehicle.spot) {
            return Err(ModelError::InvalidTransition {
                entity: "robot",
                state: self.state.to_string(),
                event: RobotEvent::Dispatched.to_string(),
            });
        }
        self.apply(RobotEvent::Dispatched)?;
        self.target = Some(vehicle_id);
        Ok(())
    }

    /// Exchanges the carried battery for `fresh`, returning the depleted one.
    pub fn swap_battery(&mut self, fresh: Battery) -> Result<Battery, ModelError> {
        self.apply(RobotEvent::SwapStarted)?;
        self.swap_timer = 0.0;
        Ok(std::mem::replace(&mut self.battery, fresh))
    }

    /// Advances the robot by `dt` seconds.
    ///
    /// Only the robot's own target vehicle is read or written.
    pub fn update(&mut self, dt: f64, vehicles: &mut [Vehicle]) {
        self.release_finished_target(vehicles);
        self.reroute_if_low(vehicles);

        match self.state {
            RobotState::Available | RobotState::NeedsSwap => {}
            RobotState::GoToVehicle => self.drive_to_target(dt, vehicles),
            RobotState::Discharging => self.discharge_into_target(dt, vehicles),
            RobotState::GoHome => self.drive_home(dt),
            RobotState::Swapping => {
                self.swap_timer += dt;
                if self.swap_timer >= self.swap_duration {
                    self.swap_timer = 0.0;
                    self.transition(RobotEvent::SwapFinished);
                }
            }
        }
    }

    fn transition(&mut self, event: RobotEvent) {
        if let Err(err) = self.apply(event) {
            warn!(robot = self.id, %err, "robot transition rejected");
        }
    }

    fn target_vehicle<'a>(&self, vehicles: &'a mut [Vehicle]) -> Option<&'a mut Vehicle> {
        self.target.and_then(move |id| vehicles.get_mut(id))
    }

    /// Drops a target that completed or failed. Returns `true` if released.
    pub fn release_finished_target(&mut self, vehicles: &[Vehicle]) -> bool {
        if !self.state.is_busy() {
            return false;
        }
        let finished = match self.target.and_then(|id| vehicles.get(id)) {
            Some(v) => v.state().is_terminal(),
            None => true,
        };
        if finished {
            self.target = None;
            let low = self.battery.soc() <= self.reserve_soc;
            self.transition(RobotEvent::TargetReleased { low });
        }
        finished
    }

    fn reroute_if_low(&mut self, vehicles: &mut [Vehicle]) {
        let soc = self.battery.soc();
        match self.state {
            RobotState::Available if soc <= self.reserve_soc => {
                self.transition(RobotEvent::LowCharge);
            }
            RobotState::GoToVehicle | RobotState::Discharging if soc <= self.return_threshold() => {
                let robot = self.id;
                if let Some(vehicle) = self.target_vehicle(vehicles) {
                    if vehicle.state() == VehicleState::Charging {
                        if let Err(err) = vehicle.apply(VehicleEvent::Released) {
                            warn!(robot, %err, "vehicle release rejected");
                        }
                    }
                    debug!(robot, vehicle = vehicle.id, soc, "abandoning service on low charge");
                }
                self.target = None;
                self.transition(RobotEvent::LowCharge);
            }
            _ => {}
        }
    }

    fn drive(&mut self, destination: Position, dt: f64) -> bool {
        let moved = self.position.move_toward(&destination, self.speed * dt);
        self.battery.discharge_kwh(moved * KWH_PER_UNIT);
        if self.position.is_near(&destination) {
            self.position = destination;
            true
        } else {
            false
        }
    }

    fn drive_to_target(&mut self, dt: f64, vehicles: &mut [Vehicle]) {
        let Some(spot) = self.target_vehicle(vehicles).map(|v| v.spot) else {
            return;
        };
        if self.drive(spot, dt) {
            self.transition(RobotEvent::Arrived);
        }
    }

    fn discharge_into_target(&mut self, dt: f64, vehicles: &mut [Vehicle]) {
        let Some(vehicle) = self.target.and_then(|id| vehicles.get_mut(id)) else {
            return;
        };
        if vehicle.state() != VehicleState::Charging {
            return;
        }
        // Never hand over more than the robot holds after transfer losses.
        let delivered = vehicle
            .battery()
            .charge_energy(dt)
            .min(self.battery.energy_kwh() * TRANSFER_EFFICIENCY);
        vehicle.battery_mut().charge_kwh(delivered);
        self.battery.discharge_kwh(delivered / TRANSFER_EFFICIENCY);
    }

    fn drive_home(&mut self, dt: f64) {
        let home = self.home;
        if self.drive(home, dt) {
            self.battery.mark_non_full();
            self.transition(RobotEvent::ReachedHome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::battery::Voltage;

    fn robot() -> Robot {
        Robot::new(1, Position::origin(), 10.0, 120.0, 15.0).unwrap()
    }

    fn vehicle_at(x: f64, deadline: f64) -> Vehicle {
        let battery = Battery::new(Voltage::V400, 80.0, 20.0).unwrap();
        Vehicle::new(1, Position::new(x, 0.0), deadline, battery, 80.0).unwrap()
    }

    fn dispatch(robot: &mut Robot, vehicles: &mut [Vehicle]) {
        robot.assign_task(0, &vehicles[0]).unwrap();
        vehicles[0].apply(VehicleEvent::Assigned).unwrap();
    }

    #[test]
    fn rejects_invalid_speed() {
        assert_eq!(
            Robot::new(1, Position::origin(), 0.0, 120.0, 15.0),
            Err(ModelError::InvalidSpeed(0.0))
        );
    }

    #[test]
    fn reaches_vehicle_and_starts_discharging() {
        let mut r = robot();
        let mut vehicles = vec![vehicle_at(10.0, 1000.0)];
        dispatch(&mut r, &mut vehicles);
        assert_eq!(r.state(), RobotState::GoToVehicle);
        r.update(1.0, &mut vehicles);
        assert_eq!(r.state(), RobotState::Discharging);
        assert_eq!(r.position, Position::new(10.0, 0.0));
        assert!(r.soc() < 100.0);
    }

    #[test]
    fn discharging_transfers_energy_with_losses() {
        let mut r = robot();
        let mut vehicles = vec![vehicle_at(0.0, 1000.0)];
        dispatch(&mut r, &mut vehicles);
        r.update(1.0, &mut vehicles);
        assert_eq!(r.state(), RobotState::Discharging);
        let robot_before = r.battery().energy_kwh();
        let vehicle_before = vehicles[0].battery().energy_kwh();
        r.update(10.0, &mut vehicles);
        let given = vehicles[0].battery().energy_kwh() - vehicle_before;
        let drawn = robot_before - r.battery().energy_kwh();
        assert!((given - 150.0 / 3600.0 * 10.0).abs() < 1e-9);
        assert!((drawn - given / TRANSFER_EFFICIENCY).abs() < 1e-9);
    }

    #[test]
    fn nearly_empty_robot_delivers_only_what_it_holds() {
        let mut r = robot();
        let mut vehicles = vec![vehicle_at(0.0, 1000.0)];
        dispatch(&mut r, &mut vehicles);
        r.update(1.0, &mut vehicles);
        assert_eq!(r.state(), RobotState::Discharging);
        r.battery_mut().discharge_kwh(200.0 - 0.01);
        let robot_before = r.battery().energy_kwh();
        let vehicle_before = vehicles[0].battery().energy_kwh();
        r.update(10.0, &mut vehicles);
        let given = vehicles[0].battery().energy_kwh() - vehicle_before;
        assert!(given > 0.0);
        assert!(given <= robot_before * TRANSFER_EFFICIENCY + 1e-9);
        assert!(r.battery().energy_kwh() < 1e-9);
    }

    #[test]
    fn releases_completed_target() {
        let mut r = robot();
        let mut vehicles = vec![vehicle_at(0.0, 1000.0)];
        dispatch(&mut r, &mut vehicles);
        vehicles[0].battery_mut().charge_kwh(100.0);
        vehicles[0].update(1.0);
        assert_eq!(vehicles[0].state(), VehicleState::Completed);
        r.update(1.0, &mut vehicles);
        assert_eq!(r.state(), RobotState::Available);
        assert_eq!(r.target(), None);
    }

    #[test]
    fn low_charge_abandons_vehicle_and_goes_home() {
        let mut r = robot();
        r.home = Position::new(0.0, 0.0);
        let mut vehicles = vec![vehicle_at(10.0, 1000.0)];
        dispatch(&mut r, &mut vehicles);
        r.update(1.0, &mut vehicles);
        assert_eq!(r.state(), RobotState::Discharging);
        r.battery_mut().discharge_kwh(1000.0);
        r.speed = 1.0;
        r.update(1.0, &mut vehicles);
        assert_eq!(r.state(), RobotState::GoHome);
        assert_eq!(r.target(), None);
        assert_eq!(vehicles[0].state(), VehicleState::NeedsCharge);
    }

    #[test]
    fn idle_robot_below_reserve_goes_home() {
        let mut r = robot();
        r.position = Position::new(50.0, 0.0);
        r.battery_mut().discharge_kwh(180.0);
        assert!(r.soc() <= r.reserve_soc);
        r.update(1.0, &mut []);
        assert_eq!(r.state(), RobotState::GoHome);
    }

    #[test]
    fn go_home_then_needs_swap_with_non_full_battery() {
        let mut r = robot();
        r.position = Position::new(5.0, 0.0);
        r.battery_mut().discharge_kwh(180.0);
        r.update(1.0, &mut []);
        assert_eq!(r.state(), RobotState::NeedsSwap);
        assert_eq!(r.position, r.home);
        assert!(!r.battery().is_flagged_full());
    }

    #[test]
    fn go_home_waits_until_arrival() {
        let mut r = robot();
        r.position = Position::new(100.0, 0.0);
        r.battery_mut().discharge_kwh(180.0);
        r.update(1.0, &mut []);
        assert_eq!(r.state(), RobotState::GoHome);
        r.update(1.0, &mut []);
        assert_eq!(r.state(), RobotState::GoHome);
        assert!((r.position.x - 80.0).abs() < 1e-9);
    }

    #[test]
    fn swap_timer_returns_robot_to_service() {
        let mut r = robot();
        r.position = Position::new(5.0, 0.0);
        r.battery_mut().discharge_kwh(180.0);
        r.update(1.0, &mut []);
        let old = r.swap_battery(Battery::fleet_pack()).unwrap();
        assert!(old.soc() < 15.0);
        assert_eq!(r.state(), RobotState::Swapping);
        r.update(60.0, &mut []);
        assert_eq!(r.state(), RobotState::Swapping);
        r.update(60.0, &mut []);
        assert_eq!(r.state(), RobotState::Available);
        assert_eq!(r.swap_timer(), 0.0);
    }

    #[test]
    fn refuses_dispatch_when_not_available() {
        let mut r = robot();
        let vehicles = vec![vehicle_at(10.0, 1000.0)];
        r.assign_task(0, &vehicles[0]).unwrap();
        assert!(r.assign_task(0, &vehicles[0]).is_err());
    }

    #[test]
    fn refuses_dispatch_without_charge_to_return() {
        let mut r = robot();
        let needed = r.travel_soc(20.0);
        r.battery_mut()
            .discharge_kwh(200.0 * (85.0 - needed / 2.0) / 100.0);
        assert!(r.is_dispatchable());
        let vehicles = vec![vehicle_at(10.0, 1000.0)];
        assert!(!r.can_service(&vehicles[0].spot));
        assert!(r.assign_task(0, &vehicles[0]).is_err());
        assert_eq!(r.state(), RobotState::Available);
    }

    #[test]
    fn swap_only_from_needs_swap() {
        let mut r = robot();
        assert!(r.swap_battery(Battery::fleet_pack()).is_err());
        assert_eq!(r.state(), RobotState::Available);
    }
}
