//! Assignment strategy trait.

use super::view::{Assignment, DispatchView};

/// Pairs idle robots with waiting vehicles for one tick.
///
/// A plan must be exclusive: no robot and no vehicle appears twice. Plans
/// are committed through [`commit`](super::commit), which skips pairings
/// the engine rejects.
pub trait AssignmentStrategy: Send {
    /// Plans this tick's assignments from a read-only view.
    fn plan(&mut self, view: &DispatchView) -> Vec<Assignment>;

    /// Returns a human-readable name for this strategy.
    fn name(&self) -> &str;
}
