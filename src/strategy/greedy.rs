//! Greedy vehicle-first strategies.
//!
//! Both rank the waiting vehicles by a score, then hand each one, in rank
//! order, the nearest robot that is still free and able to serve it.

use super::trait_::AssignmentStrategy;
use super::view::{Assignment, DispatchView, VehicleCandidate};

fn greedy_by<F>(view: &DispatchView, score: F) -> Vec<Assignment>
where
    F: Fn(&VehicleCandidate) -> f64,
{
    if view.is_idle() {
        return Vec::new();
    }
    let mut order: Vec<usize> = (0..view.vehicles.len()).collect();
    // Stable sort: equal scores keep waiting-list order.
    order.sort_by(|&a, &b| score(&view.vehicles[b]).total_cmp(&score(&view.vehicles[a])));

    let mut used = vec![false; view.robots.len()];
    let mut plan = Vec::new();
    for v in order {
        if plan.len() == view.robots.len() {
            break;
        }
        if let Some(r) = view.nearest_free_robot(v, &used) {
            used[r] = true;
            plan.push(view.pair(r, v));
        }
    }
    plan
}

/// Serves the largest energy gaps first.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxDemand;

impl AssignmentStrategy for MaxDemand {
    fn plan(&mut self, view: &DispatchView) -> Vec<Assignment> {
        greedy_by(view, |v| v.energy_gap)
    }

    fn name(&self) -> &str {
        "max_demand"
    }
}

/// Serves the highest gap-per-remaining-second first.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxPriority;

impl AssignmentStrategy for MaxPriority {
    fn plan(&mut self, view: &DispatchView) -> Vec<Assignment> {
        greedy_by(view, VehicleCandidate::urgency)
    }

    fn name(&self) -> &str {
        "max_priority"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::view::fixtures::view;

    #[test]
    fn max_demand_serves_largest_gap_first() {
        let v = view(&[(0.0, 0.0)], &[(1.0, 0.0, 10.0, 100.0), (50.0, 0.0, 40.0, 5000.0)]);
        let plan = MaxDemand.plan(&v);
        assert_eq!(plan, vec![Assignment { robot: 0, vehicle: 1 }]);
    }

    #[test]
    fn max_priority_prefers_tight_deadlines() {
        let v = view(&[(0.0, 0.0)], &[(1.0, 0.0, 10.0, 100.0), (50.0, 0.0, 40.0, 5000.0)]);
        let plan = MaxPriority.plan(&v);
        assert_eq!(plan, vec![Assignment { robot: 0, vehicle: 0 }]);
    }

    #[test]
    fn each_vehicle_gets_nearest_free_robot() {
        let v = view(
            &[(0.0, 0.0), (100.0, 0.0)],
            &[(90.0, 0.0, 30.0, 100.0), (10.0, 0.0, 20.0, 100.0)],
        );
        let plan = MaxDemand.plan(&v);
        assert_eq!(
            plan,
            vec![
                Assignment { robot: 1, vehicle: 0 },
                Assignment { robot: 0, vehicle: 1 },
            ]
        );
    }

    #[test]
    fn infeasible_robot_is_skipped() {
        let mut v = view(&[(0.0, 0.0), (100.0, 0.0)], &[(1.0, 0.0, 30.0, 100.0)]);
        v.feasible[0][0] = false;
        assert_eq!(MaxDemand.plan(&v), vec![Assignment { robot: 1, vehicle: 0 }]);
    }
}
