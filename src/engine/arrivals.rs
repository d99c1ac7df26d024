//! Stochastic vehicle arrivals.
//!
//! Each tick admits at most one vehicle, with probability proportional to the
//! tick length. Vehicle attributes are drawn from truncated normal and
//! uniform distributions.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::error::ConfigError;
use crate::model::{Battery, ModelError, Position, Vehicle, Voltage};

/// Distribution parameters for newly arriving vehicles.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleProfile {
    /// Battery capacity in kWh: mean, std, and clip range.
    pub capacity: (f64, f64, (f64, f64)),
    /// Required departure SoC in %: mean, std, and clip range.
    pub required_soc: (f64, f64, (f64, f64)),
    /// Stay in minutes: mean, std, and clip range.
    pub stay_minutes: (f64, f64, (f64, f64)),
    /// Arrival SoC in %, uniform range.
    pub arrival_soc: (f64, f64),
}

impl Default for VehicleProfile {
    fn default() -> Self {
        Self {
            capacity: (90.0, 10.0, (65.0, 115.0)),
            required_soc: (85.0, 10.0, (70.0, 100.0)),
            stay_minutes: (90.0, 20.0, (60.0, 120.0)),
            arrival_soc: (5.0, 50.0),
        }
    }
}

impl VehicleProfile {
    /// Checks every distribution, failing on the first invalid one.
    ///
    /// Clip ranges must be finite and non-empty. Capacity must stay
    /// positive, required SoC within `[0, 100]`, and the stay at least one
    /// whole minute.
    pub fn validate(&self) -> Result<(), ConfigError> {
        truncated_normal("capacity", self.capacity, (f64::MIN_POSITIVE, f64::INFINITY))?;
        truncated_normal("required_soc", self.required_soc, (0.0, 100.0))?;
        truncated_normal("stay_minutes", self.stay_minutes, (1.0, f64::INFINITY))?;
        let (lo, hi) = self.arrival_soc;
        if !(0.0 <= lo && lo < hi && hi <= 100.0) {
            return Err(ConfigError::SocOutOfRange(hi));
        }
        Ok(())
    }
}

/// Checks `(mean, std, (lo, hi))` with the clip range inside `bounds`.
fn truncated_normal(
    field: &'static str,
    (mean, std, (lo, hi)): (f64, f64, (f64, f64)),
    (floor, ceiling): (f64, f64),
) -> Result<(), ConfigError> {
    if !(mean.is_finite() && mean > 0.0) {
        return Err(ConfigError::NonPositive { field, value: mean });
    }
    if !(std.is_finite() && std >= 0.0) {
        return Err(ConfigError::NegativeStd { field, value: std });
    }
    if !(lo.is_finite() && hi.is_finite() && floor <= lo && lo <= hi && hi <= ceiling) {
        return Err(ConfigError::InvalidRange { field, lo, hi });
    }
    Ok(())
}

/// Draws new vehicles for the park.
#[derive(Debug, Clone)]
pub struct VehicleSampler {
    capacity: Normal<f64>,
    capacity_clip: (f64, f64),
    required_soc: Normal<f64>,
    required_clip: (f64, f64),
    stay: Normal<f64>,
    stay_clip: (f64, f64),
    arrival_soc: (f64, f64),
}

impl VehicleSampler {
    /// Builds a sampler, rejecting any profile that fails [`VehicleProfile::validate`].
    pub fn new(profile: &VehicleProfile) -> Result<Self, ConfigError> {
        profile.validate()?;
        let normal = |field: &'static str, (mean, std, _): (f64, f64, (f64, f64))| {
            Normal::new(mean, std).map_err(|_| ConfigError::NegativeStd { field, value: std })
        };
        Ok(Self {
            capacity: normal("capacity", profile.capacity)?,
            capacity_clip: profile.capacity.2,
            required_soc: normal("required_soc", profile.required_soc)?,
            required_clip: profile.required_soc.2,
            stay: normal("stay_minutes", profile.stay_minutes)?,
            stay_clip: profile.stay_minutes.2,
            arrival_soc: profile.arrival_soc,
        })
    }

    /// Samples a vehicle parked at an integer spot inside `width × height`.
    pub fn sample<R: Rng>(
        &self,
        rng: &mut R,
        id: u32,
        width: f64,
        height: f64,
    ) -> Result<Vehicle, ModelError> {
        let voltage = if rng.gen_bool(0.5) {
            Voltage::V400
        } else {
            Voltage::V800
        };
        let capacity = clip(self.capacity.sample(rng), self.capacity_clip).max(1.0);
        let soc = rng.gen_range(self.arrival_soc.0..self.arrival_soc.1);
        let required = clip(self.required_soc.sample(rng), self.required_clip).clamp(0.0, 100.0);
        // Whole minutes, as a parking ticket would show.
        let stay = clip(self.stay.sample(rng), self.stay_clip).trunc() * 60.0;
        let spot = Position::new(
            rng.gen_range(0..=width.floor() as u64) as f64,
            rng.gen_range(0..=height.floor() as u64) as f64,
        );

        let battery = Battery::new(voltage, capacity, soc)?;
        Vehicle::new(id, spot, stay, battery, required)
    }
}

/// Clips `value` into `[lo, hi]`.
fn clip(value: f64, (lo, hi): (f64, f64)) -> f64 {
    value.max(lo).min(hi)
}
