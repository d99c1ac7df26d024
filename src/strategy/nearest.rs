//! Globally nearest dispatch.

use super::hungarian::{min_cost_assignment, UNREACHABLE};
use super::trait_::AssignmentStrategy;
use super::view::{Assignment, DispatchView};

/// Minimises the total robot–vehicle distance over all idle robots and
/// waiting vehicles with an exact bipartite matching.
///
/// Pairs a robot cannot serve are priced out of the matching and dropped
/// from the plan.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nearest;

impl AssignmentStrategy for Nearest {
    fn plan(&mut self, view: &DispatchView) -> Vec<Assignment> {
        if view.is_idle() {
            return Vec::new();
        }
        let cost: Vec<Vec<f64>> = (0..view.robots.len())
            .map(|r| {
                (0..view.vehicles.len())
                    .map(|v| {
                        if view.is_feasible(r, v) {
                            view.distance(r, v)
                        } else {
                            UNREACHABLE
                        }
                    })
                    .collect()
            })
            .collect();

        min_cost_assignment(&cost)
            .into_iter()
            .filter(|&(r, v)| view.is_feasible(r, v))
            .map(|(r, v)| view.pair(r, v))
            .collect()
    }

    fn name(&self) -> &str {
        "nearest"
    }
}
