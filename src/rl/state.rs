//! Discretisation of the park into Q-table states.

use crate::strategy::DispatchView;

/// Maps a dispatch view to one of `n_states` table rows.
///
/// The index combines two SoC deciles:
///
/// ```text
/// state = (decile(mean robot SoC) · 10 + decile(mean waiting vehicle SoC)) mod n_states
/// ```
///
/// where each decile is clamped to `0..=9`, so the default 100 states cover
/// every combination exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateEncoder {
    n_states: usize,
}

impl StateEncoder {
    pub const DEFAULT_STATES: usize = 100;

    /// A zero state count is raised to one.
    pub fn new(n_states: usize) -> Self {
        Self {
            n_states: n_states.max(1),
        }
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn encode(&self, view: &DispatchView) -> usize {
        self.encode_socs(view.fleet_mean_soc, view.waiting_mean_soc())
    }

    pub fn encode_socs(&self, robot_soc: f64, vehicle_soc: f64) -> usize {
        (decile(robot_soc) * 10 + decile(vehicle_soc)) % self.n_states
    }
}

impl Default for StateEncoder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STATES)
    }
}

fn decile(soc: f64) -> usize {
    if soc.is_nan() {
        return 0;
    }
    (soc / 10.0).floor().clamp(0.0, 9.0) as usize
}
