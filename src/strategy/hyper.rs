//! Rule-based choice between the lower-level strategies.

use super::greedy::MaxPriority;
use super::nearest::Nearest;
use super::trait_::AssignmentStrategy;
use super::view::{Assignment, DispatchView};

/// Uses [`MaxPriority`] while waiting vehicles outnumber idle robots and
/// [`Nearest`] otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct HyperHeuristic {
    nearest: Nearest,
    priority: MaxPriority,
}

impl HyperHeuristic {
    /// True when the current view is handled by priority dispatch.
    pub fn is_congested(view: &DispatchView) -> bool {
        view.vehicles.len() > view.robots.len()
    }
}

impl AssignmentStrategy for HyperHeuristic {
    fn plan(&mut self, view: &DispatchView) -> Vec<Assignment> {
        if Self::is_congested(view) {
            self.priority.plan(view)
        } else {
            self.nearest.plan(view)
        }
    }

    fn name(&self) -> &str {
        "hyper_heuristic"
    }
}
