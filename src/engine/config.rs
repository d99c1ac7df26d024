//! Configuration for the park simulation.

use std::fmt;
use std::str::FromStr;

use super::error::ConfigError;

/// Preset park sizes.
///
/// Each scale fixes the park dimensions, fleet sizes, and arrival rate, and
/// selects the matching multi-objective weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MapScale {
    Small,
    Medium,
    Large,
}

impl MapScale {
    pub fn all() -> [MapScale; 3] {
        [MapScale::Small, MapScale::Medium, MapScale::Large]
    }
}

impl fmt::Display for MapScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapScale::Small => write!(f, "small"),
            MapScale::Medium => write!(f, "medium"),
            MapScale::Large => write!(f, "large"),
        }
    }
}

impl FromStr for MapScale {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(MapScale::Small),
            "medium" => Ok(MapScale::Medium),
            "large" => Ok(MapScale::Large),
            _ => Err(ConfigError::UnknownScale(s.to_string())),
        }
    }
}

/// Scalar configuration of a [`ParkEnv`](super::ParkEnv).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParkConfig {
    // --- Geometry ---
    /// Park width (x extent).
    pub park_width: f64,
    /// Park height (y extent).
    pub park_height: f64,

    // --- Fleet ---
    /// Number of robots, fixed for the run.
    pub n_robots: usize,
    /// Maximum number of vehicles tracked concurrently (waiting + charging).
    pub max_vehicles: usize,
    /// Number of batteries in the station pool.
    pub n_batteries: usize,
    /// Robot speed in units per second.
    pub robot_speed: f64,
    /// Seconds a battery swap takes.
    pub swap_duration: f64,
    /// SoC (%) at or below which an idle robot returns to swap.
    pub robot_reserve_soc: f64,

    // --- Time and arrivals ---
    /// Default tick length in seconds.
    pub time_step: f64,
    /// Vehicle arrival probability per simulated second.
    pub arrival_probability: f64,

    /// Seed for the arrival RNG.
    pub seed: u64,
}

impl ParkConfig {
    /// Returns the preset configuration for `scale`.
    pub fn for_scale(scale: MapScale) -> Self {
        let base = Self::default();
        match scale {
            MapScale::Small => base,
            MapScale::Medium => Self {
                park_width: 200.0,
                park_height: 200.0,
                n_robots: 16,
                max_vehicles: 40,
                n_batteries: 10,
                arrival_probability: 0.011667,
                ..base
            },
            MapScale::Large => Self {
                park_width: 500.0,
                park_height: 500.0,
                n_robots: 40,
                max_vehicles: 100,
                n_batteries: 24,
                arrival_probability: 0.029167,
                ..base
            },
        }
    }

    /// Length of the park diagonal, the largest possible robot–vehicle distance.
    pub fn diagonal(&self) -> f64 {
        (self.park_width * self.park_width + self.park_height * self.park_height).sqrt()
    }

    /// Checks every scalar, failing on the first invalid one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::NonPositive { field, value })
            }
        }

        positive("park_width", self.park_width)?;
        positive("park_height", self.park_height)?;
        positive("robot_speed", self.robot_speed)?;
        positive("time_step", self.time_step)?;
        if !(self.swap_duration.is_finite() && self.swap_duration >= 0.0) {
            return Err(ConfigError::NonPositive {
                field: "swap_duration",
                value: self.swap_duration,
            });
        }
        if self.n_robots == 0 {
            return Err(ConfigError::ZeroCount("n_robots"));
        }
        if self.max_vehicles == 0 {
            return Err(ConfigError::ZeroCount("max_vehicles"));
        }
        if self.n_batteries == 0 {
            return Err(ConfigError::ZeroCount("n_batteries"));
        }
        if !(0.0..=1.0).contains(&self.arrival_probability) {
            return Err(ConfigError::ProbabilityOutOfRange(self.arrival_probability));
        }
        if !(0.0..100.0).contains(&self.robot_reserve_soc) {
            return Err(ConfigError::SocOutOfRange(self.robot_reserve_soc));
        }
        Ok(())
    }
}

impl Default for ParkConfig {
    fn default() -> Self {
        Self {
            park_width: 100.0,
            park_height: 100.0,
            n_robots: 4,
            max_vehicles: 10,
            n_batteries: 3,
            robot_speed: 10.0,
            swap_duration: 120.0,
            robot_reserve_soc: 15.0,
            time_step: 10.0,
            arrival_probability: 0.003056,
            seed: 42,
        }
    }
}
