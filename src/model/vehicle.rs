//! Parked vehicle lifecycle.

use std::fmt;

use tracing::warn;

use super::battery::Battery;
use super::error::ModelError;
use super::types::Position;

/// Handle of a vehicle inside the engine's vehicle arena.
pub type VehicleId = usize;

/// Lifecycle state of a parked vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VehicleState {
    NeedsCharge,
    Charging,
    Completed,
    Failed,
}

/// Events that drive [`VehicleState`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleEvent {
    /// A robot has been dispatched to this vehicle.
    Assigned,
    /// The serving robot abandoned the vehicle.
    Released,
    /// The required SoC has been reached.
    Charged,
    /// The departure deadline passed.
    DeadlineMissed,
}

impl VehicleState {
    /// Transition table. `None` marks an invalid transition.
    pub fn next(self, event: VehicleEvent) -> Option<VehicleState> {
        use VehicleEvent::*;
        use VehicleState::*;
        match (self, event) {
            (NeedsCharge, Assigned) => Some(Charging),
            (NeedsCharge, Released) => None,
            (NeedsCharge, Charged) => Some(Completed),
            (NeedsCharge, DeadlineMissed) => Some(Failed),
            (Charging, Assigned) => None,
            (Charging, Released) => Some(NeedsCharge),
            (Charging, Charged) => Some(Completed),
            (Charging, DeadlineMissed) => Some(Failed),
            (Completed | Failed, _) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VehicleState::Completed | VehicleState::Failed)
    }
}

impl fmt::Display for VehicleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleState::NeedsCharge => write!(f, "needs-charge"),
            VehicleState::Charging => write!(f, "charging"),
            VehicleState::Completed => write!(f, "completed"),
            VehicleState::Failed => write!(f, "failed"),
        }
    }
}

impl fmt::Display for VehicleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleEvent::Assigned => write!(f, "assigned"),
            VehicleEvent::Released => write!(f, "released"),
            VehicleEvent::Charged => write!(f, "charged"),
            VehicleEvent::DeadlineMissed => write!(f, "deadline-missed"),
        }
    }
}

/// A parked car that must reach `required_soc` before its deadline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vehicle {
    /// Sequential identifier assigned at admission.
    pub id: u32,
    /// Parking spot, fixed for the vehicle's lifetime.
    pub spot: Position,
    /// Seconds remaining until departure.
    pub deadline: f64,
    /// Total stay granted at arrival, in seconds.
    pub stay: f64,
    /// SoC (%) required to depart successfully.
    pub required_soc: f64,
    /// Seconds spent waiting in `NeedsCharge`.
    pub wait_time: f64,
    battery: Battery,
    state: VehicleState,
    arrival_gap_kwh: f64,
    reward_counted: bool,
}

impl Vehicle {
    /// Creates a waiting vehicle.
    pub fn new(
        id: u32,
        spot: Position,
        deadline: f64,
        battery: Battery,
        required_soc: f64,
    ) -> Result<Self, ModelError> {
        if !(0.0..=100.0).contains(&required_soc) {
            return Err(ModelError::InvalidSoc(required_soc));
        }
        let arrival_gap_kwh = gap_kwh(&battery, required_soc);
        Ok(Self {
            id,
            spot,
            deadline,
            stay: deadline.max(0.0),
            required_soc,
            wait_time: 0.0,
            battery,
            state: VehicleState::NeedsCharge,
            arrival_gap_kwh,
            reward_counted: false,
        })
    }

    pub fn state(&self) -> VehicleState {
        self.state
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

    /// Energy in kWh still missing to reach the required SoC. Never negative.
    pub fn energy_gap(&self) -> f64 {
        gap_kwh(&self.battery, self.required_soc)
    }

    /// Energy gap measured at arrival.
    pub fn arrival_gap(&self) -> f64 {
        self.arrival_gap_kwh
    }

    /// Seconds left before the deadline, floored at zero.
    pub fn time_to_deadline(&self) -> f64 {
        self.deadline.max(0.0)
    }

    pub fn is_charged(&self) -> bool {
        self.battery.soc() >= self.required_soc
    }

    /// Applies an event through the transition table.
    pub fn apply(&mut self, event: VehicleEvent) -> Result<VehicleState, ModelError> {
        match self.state.next(event) {
            Some(next) => {
                self.state = next;
                Ok(next)
            }
            None => Err(ModelError::InvalidTransition {
                entity: "vehicle",
                state: self.state.to_string(),
                event: event.to_string(),
            }),
        }
    }

    /// Advances the vehicle clock by `dt` seconds.
    ///
    /// Reaching the required SoC is checked before the deadline, so a vehicle
    /// charged exactly at its deadline completes.
    pub fn update(&mut self, dt: f64) {
        if self.state.is_terminal() {
            return;
        }
        self.deadline -= dt;
        if self.state == VehicleState::NeedsCharge {
            self.wait_time += dt;
        }
        let event = if self.is_charged() {
            VehicleEvent::Charged
        } else if self.deadline <= 0.0 {
            VehicleEvent::DeadlineMissed
        } else {
            return;
        };
        if let Err(err) = self.apply(event) {
            warn!(vehicle = self.id, %err, "vehicle update rejected");
        }
    }

    /// Marks a terminal vehicle as counted by a reward function.
    ///
    /// Returns `true` only the first time it is called on a terminal vehicle.
    pub fn mark_counted(&mut self) -> bool {
        if !self.state.is_terminal() || self.reward_counted {
            return false;
        }
        self.reward_counted = true;
        true
    }

    pub fn is_counted(&self) -> bool {
        self.reward_counted
    }
}

fn gap_kwh(battery: &Battery, required_soc: f64) -> f64 {
    ((required_soc - battery.soc()) * battery.capacity_kwh() / 100.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::battery::Voltage;

    fn vehicle(soc: f64, required: f64, deadline: f64) -> Vehicle {
        let battery = Battery::new(Voltage::V400, 80.0, soc).unwrap();
        Vehicle::new(1, Position::new(10.0, 0.0), deadline, battery, required).unwrap()
    }

    #[test]
    fn energy_gap_in_kwh() {
        let v = vehicle(20.0, 80.0, 100.0);
        assert!((v.energy_gap() - 48.0).abs() < 1e-9);
        assert!((v.arrival_gap() - 48.0).abs() < 1e-9);
    }

    #[test]
    fn energy_gap_never_negative() {
        let v = vehicle(90.0, 80.0, 100.0);
        assert_eq!(v.energy_gap(), 0.0);
    }

    #[test]
    fn waiting_accumulates_wait_time() {
        let mut v = vehicle(20.0, 80.0, 100.0);
        v.update(10.0);
        v.update(10.0);
        assert_eq!(v.wait_time, 20.0);
        assert_eq!(v.deadline, 80.0);
        assert_eq!(v.state(), VehicleState::NeedsCharge);
    }

    #[test]
    fn charging_does_not_accumulate_wait() {
        let mut v = vehicle(20.0, 80.0, 100.0);
        v.apply(VehicleEvent::Assigned).unwrap();
        v.update(10.0);
        assert_eq!(v.wait_time, 0.0);
    }

    #[test]
    fn zero_deadline_fails_on_next_update_even_while_charging() {
        let mut v = vehicle(20.0, 80.0, 0.0);
        v.apply(VehicleEvent::Assigned).unwrap();
        v.update(1.0);
        assert_eq!(v.state(), VehicleState::Failed);
    }

    #[test]
    fn completion_at_deadline_counts_as_success() {
        let mut v = vehicle(20.0, 80.0, 10.0);
        v.apply(VehicleEvent::Assigned).unwrap();
        v.battery_mut().charge_kwh(60.0);
        v.update(10.0);
        assert_eq!(v.state(), VehicleState::Completed);
    }

    #[test]
    fn terminal_states_are_inert() {
        let mut v = vehicle(20.0, 80.0, 0.0);
        v.update(1.0);
        assert_eq!(v.state(), VehicleState::Failed);
        let deadline = v.deadline;
        v.battery_mut().charge_kwh(100.0);
        v.update(1.0);
        assert_eq!(v.state(), VehicleState::Failed);
        assert_eq!(v.deadline, deadline);
    }

    #[test]
    fn transition_table_is_monotonic() {
        for terminal in [VehicleState::Completed, VehicleState::Failed] {
            for event in [
                VehicleEvent::Assigned,
                VehicleEvent::Released,
                VehicleEvent::Charged,
                VehicleEvent::DeadlineMissed,
            ] {
                assert_eq!(terminal.next(event), None);
            }
        }
        assert_eq!(
            VehicleState::Charging.next(VehicleEvent::Released),
            Some(VehicleState::NeedsCharge)
        );
    }

    #[test]
    fn invalid_transition_is_rejected_without_change() {
        let mut v = vehicle(20.0, 80.0, 100.0);
        assert!(v.apply(VehicleEvent::Released).is_err());
        assert_eq!(v.state(), VehicleState::NeedsCharge);
    }

    #[test]
    fn counted_only_once_and_only_when_terminal() {
        let mut v = vehicle(20.0, 80.0, 0.0);
        assert!(!v.mark_counted());
        v.update(1.0);
        assert!(v.mark_counted());
        assert!(!v.mark_counted());
        assert!(v.is_counted());
    }
}
