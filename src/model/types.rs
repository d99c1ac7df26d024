//! Spatial primitives shared by vehicles, robots, and the battery station.

use std::fmt;

/// Distance under which a moving robot counts as having reached its target.
pub const ARRIVAL_EPSILON: f64 = 1.0;

/// A 2D position on the park surface `[0, W] × [0, H]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Creates a new position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Origin position (0, 0).
    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Returns true if `other` lies strictly within [`ARRIVAL_EPSILON`].
    pub fn is_near(&self, other: &Position) -> bool {
        self.distance_to(other) < ARRIVAL_EPSILON
    }

    /// Moves toward `target` by at most `max_dist` and returns the distance travelled.
    ///
    /// The step is capped at the remaining distance, so the position never
    /// overshoots the target.
    pub fn move_toward(&mut self, target: &Position, max_dist: f64) -> f64 {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist < 1e-12 {
            return 0.0;
        }
        let step = dist.min(max_dist.max(0.0));
        self.x += dx / dist * step;
        self.y += dy / dist * step;
        step
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_distance() {
        let a = Position::origin();
        let b = Position::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn move_toward_partial_step() {
        let mut p = Position::origin();
        let moved = p.move_toward(&Position::new(10.0, 0.0), 3.0);
        assert!((p.x - 3.0).abs() < 1e-10);
        assert!(p.y.abs() < 1e-10);
        assert!((moved - 3.0).abs() < 1e-10);
    }

    #[test]
    fn move_toward_never_overshoots() {
        let mut p = Position::new(9.0, 0.0);
        let moved = p.move_toward(&Position::new(10.0, 0.0), 5.0);
        assert!((p.x - 10.0).abs() < 1e-10);
        assert!((moved - 1.0).abs() < 1e-10);
    }

    #[test]
    fn move_toward_coincident_is_noop() {
        let mut p = Position::new(2.0, 2.0);
        assert_eq!(p.move_toward(&Position::new(2.0, 2.0), 5.0), 0.0);
        assert_eq!(p, Position::new(2.0, 2.0));
    }

    #[test]
    fn arrival_check_is_epsilon_bounded() {
        let p = Position::origin();
        assert!(p.is_near(&Position::new(0.5, 0.5)));
        assert!(!p.is_near(&Position::new(1.0, 0.0)));
    }
}
