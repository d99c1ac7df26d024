//! Battery energy model and charging-power curve.

use std::fmt;

use super::error::ModelError;

/// Battery platform voltage. Determines the peak charging power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Voltage {
    V400,
    V800,
}

impl Voltage {
    /// Peak charging power in kW for this platform.
    pub fn max_power_kw(&self) -> f64 {
        match self {
            Voltage::V400 => 150.0,
            Voltage::V800 => 350.0,
        }
    }

    /// Nominal voltage in volts.
    pub fn volts(&self) -> u32 {
        match self {
            Voltage::V400 => 400,
            Voltage::V800 => 800,
        }
    }
}

impl TryFrom<u32> for Voltage {
    type Error = ModelError;

    fn try_from(volts: u32) -> Result<Self, Self::Error> {
        match volts {
            400 => Ok(Voltage::V400),
            800 => Ok(Voltage::V800),
            other => Err(ModelError::UnsupportedVoltage(other)),
        }
    }
}

impl fmt::Display for Voltage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}V", self.volts())
    }
}

/// An energy store owned by exactly one vehicle, robot, or the station pool.
///
/// The battery has no clock of its own: its owner charges or discharges it
/// explicitly. SoC is always kept within `[0, 100]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Battery {
    voltage: Voltage,
    capacity_kwh: f64,
    soc: f64,
    full: bool,
}

impl Battery {
    /// Creates a battery. The full flag is derived from the initial SoC.
    pub fn new(voltage: Voltage, capacity_kwh: f64, soc: f64) -> Result<Self, ModelError> {
        if !(capacity_kwh.is_finite() && capacity_kwh > 0.0) {
            return Err(ModelError::InvalidCapacity(capacity_kwh));
        }
        if !(0.0..=100.0).contains(&soc) {
            return Err(ModelError::InvalidSoc(soc));
        }
        Ok(Self {
            voltage,
            capacity_kwh,
            soc,
            full: soc >= 100.0,
        })
    }

    /// A fully charged 200 kWh / 800V pack, the standard robot and station battery.
    pub fn fleet_pack() -> Self {
        Self {
            voltage: Voltage::V800,
            capacity_kwh: 200.0,
            soc: 100.0,
            full: true,
        }
    }

    pub fn voltage(&self) -> Voltage {
        self.voltage
    }

    pub fn capacity_kwh(&self) -> f64 {
        self.capacity_kwh
    }

    /// Current state of charge in percent.
    pub fn soc(&self) -> f64 {
        self.soc
    }

    /// Stored energy in kWh.
    pub fn energy_kwh(&self) -> f64 {
        self.soc / 100.0 * self.capacity_kwh
    }

    /// Adds `kwh` of energy. Negative inputs discharge; the result is clamped to `[0, 100]`.
    pub fn charge_kwh(&mut self, kwh: f64) {
        let delta = kwh / self.capacity_kwh * 100.0;
        if delta.is_nan() {
            return;
        }
        self.soc = (self.soc + delta).clamp(0.0, 100.0);
    }

    /// Removes `kwh` of energy. Negative inputs charge; the result is clamped to `[0, 100]`.
    pub fn discharge_kwh(&mut self, kwh: f64) {
        self.charge_kwh(-kwh);
    }

    /// Charging power in kW accepted at the current SoC.
    ///
    /// Full power below 50%, linear taper to half power at 80%, steep fall
    /// above 80%. 800V packs keep a +0.15 boost above 50%. The factor is
    /// clamped to `[0.05, 1.0]`.
    pub fn charging_power(&self) -> f64 {
        let soc = self.soc;
        let mut factor = if soc < 50.0 {
            1.0
        } else if soc < 80.0 {
            1.0 - (soc - 50.0) / 30.0 * 0.5
        } else {
            0.5 - (soc - 80.0) / 20.0 * 0.45
        };
        if self.voltage == Voltage::V800 && soc > 50.0 {
            factor += 0.15;
        }
        self.voltage.max_power_kw() * factor.clamp(0.05, 1.0)
    }

    /// Energy in kWh the battery accepts over `dt` seconds at the current SoC.
    pub fn charge_energy(&self, dt: f64) -> f64 {
        self.charging_power() / 3600.0 * dt
    }

    /// True once the battery has saturated at 100% SoC.
    pub fn is_full(&self) -> bool {
        self.soc >= 100.0
    }

    /// The charging gate flag: `false` batteries are charged by the station.
    pub fn is_flagged_full(&self) -> bool {
        self.full
    }

    pub fn mark_full(&mut self) {
        self.full = true;
    }

    pub fn mark_non_full(&mut self) {
        self.full = false;
    }
}
