//! Weighted multi-objective dispatch.
//!
//! Every robot–vehicle pair gets a score
//!
//! ```text
//! score = w_u · urgency / max_urgency + w_d · (1 − d / diagonal) + w_s · soc / 100
//! ```
//!
//! and pairs are committed greedily in descending score order, skipping
//! any robot or vehicle already taken.

use super::trait_::AssignmentStrategy;
use super::view::{Assignment, DispatchView};
use crate::engine::MapScale;

/// Objective weights.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Weights {
    pub urgency: f64,
    pub distance: f64,
    pub robot_soc: f64,
}

impl Weights {
    /// Weights tuned offline for each park size.
    pub fn for_scale(scale: MapScale) -> Self {
        match scale {
            MapScale::Small => Self {
                urgency: 0.28,
                distance: 0.25,
                robot_soc: 0.08,
            },
            MapScale::Medium => Self {
                urgency: 0.25,
                distance: 0.30,
                robot_soc: 0.07,
            },
            MapScale::Large => Self {
                urgency: 0.475_870_222_178_498_84,
                distance: 0.524_129_777_821_501_3,
                robot_soc: 0.0,
            },
        }
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::for_scale(MapScale::Medium)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Weighted {
    pub weights: Weights,
}

impl Weighted {
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }

    pub fn for_scale(scale: MapScale) -> Self {
        Self::new(Weights::for_scale(scale))
    }

    /// Score of candidate robot `r` serving candidate vehicle `v`.
    fn score(&self, view: &DispatchView, r: usize, v: usize, max_urgency: f64) -> f64 {
        let urgency = if max_urgency > 0.0 {
            view.vehicles[v].urgency() / max_urgency
        } else {
            0.0
        };
        let proximity = if view.diagonal > 0.0 {
            1.0 - view.distance(r, v) / view.diagonal
        } else {
            0.0
        };
        self.weights.urgency * urgency
            + self.weights.distance * proximity
            + self.weights.robot_soc * view.robots[r].soc / 100.0
    }
}

impl AssignmentStrategy for Weighted {
    fn plan(&mut self, view: &DispatchView) -> Vec<Assignment> {
        if view.is_idle() {
            return Vec::new();
        }
        let max_urgency = view
            .vehicles
            .iter()
            .map(|v| v.urgency())
            .fold(0.0, f64::max);

        let mut scored: Vec<(f64, usize, usize)> = Vec::new();
        for r in 0..view.robots.len() {
            for v in 0..view.vehicles.len() {
                if view.is_feasible(r, v) {
                    scored.push((self.score(view, r, v, max_urgency), r, v));
                }
            }
        }
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut robot_taken = vec![false; view.robots.len()];
        let mut vehicle_taken = vec![false; view.vehicles.len()];
        let mut plan = Vec::new();
        for (_, r, v) in scored {
            if robot_taken[r] || vehicle_taken[v] {
                continue;
            }
            robot_taken[r] = true;
            vehicle_taken[v] = true;
            plan.push(view.pair(r, v));
            if plan.len() == view.robots.len() {
                break;
            }
        }
        plan
    }

    fn name(&self) -> &str {
        "weighted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::view::fixtures::view;

    #[test]
    fn scale_weights_match_tuned_values() {
        assert_eq!(Weights::for_scale(MapScale::Small).urgency, 0.28);
        assert_eq!(Weights::for_scale(MapScale::Medium).distance, 0.30);
        let large = Weights::for_scale(MapScale::Large);
        assert!((large.urgency + large.distance - 1.0).abs() < 1e-12);
        assert_eq!(large.robot_soc, 0.0);
    }

    #[test]
    fn distance_only_weights_pick_closest_pair() {
        let mut strategy = Weighted::new(Weights {
            urgency: 0.0,
            distance: 1.0,
            robot_soc: 0.0,
        });
        let v = view(&[(0.0, 0.0)], &[(80.0, 0.0, 50.0, 10.0), (5.0, 0.0, 1.0, 5000.0)]);
        assert_eq!(strategy.plan(&v), vec![Assignment { robot: 0, vehicle: 1 }]);
    }

    #[test]
    fn urgency_only_weights_pick_urgent_vehicle() {
        let mut strategy = Weighted::new(Weights {
            urgency: 1.0,
            distance: 0.0,
            robot_soc: 0.0,
        });
        let v = view(&[(0.0, 0.0)], &[(80.0, 0.0, 50.0, 10.0), (5.0, 0.0, 1.0, 5000.0)]);
        assert_eq!(strategy.plan(&v), vec![Assignment { robot: 0, vehicle: 0 }]);
    }

    #[test]
    fn zero_urgency_does_not_divide_by_zero() {
        let mut strategy = Weighted::for_scale(MapScale::Small);
        let v = view(&[(0.0, 0.0), (10.0, 0.0)], &[(9.0, 0.0, 0.0, 100.0)]);
        assert_eq!(strategy.plan(&v), vec![Assignment { robot: 1, vehicle: 0 }]);
    }
}
