//! Marker position smoothing.
//!
//! The rendered marker position converges toward the latest target by a
//! fixed fraction per animation tick, so irregular fix arrival never makes
//! the marker jump.

use geo::Point;

/// Interpolates the on-screen marker toward a target position.
///
/// `current` has exactly one writer: [`PositionSmoother::tick`]. The matcher
/// pipeline only ever writes `target`.
#[derive(Debug, Clone)]
pub struct PositionSmoother {
    current: Option<Point<f64>>,
    target: Option<Point<f64>>,
    alpha: f64,
}

impl PositionSmoother {
    /// `alpha` is the per-tick interpolation factor, already validated by
    /// [`crate::NavConfig::validate`] to lie in `(0, 1]`.
    pub fn new(alpha: f64) -> Self {
        Self {
            current: None,
            target: None,
            alpha,
        }
    }

    /// Set where the marker should head.
    ///
    /// The first-ever target also becomes the current position, so the
    /// marker appears in place instead of sliding in from nowhere.
    pub fn set_target(&mut self, target: Point<f64>) {
        if self.current.is_none() {
            self.current = Some(target);
        }
        self.target = Some(target);
    }

    /// Advance one animation tick.
    ///
    /// Moves `current` a fraction `alpha` of the way to `target` and returns
    /// the new position. Returns `None` while no target has been set.
    /// Residual distance shrinks geometrically: after `k` ticks it is
    /// `(1 - alpha)^k` of the initial gap.
    pub fn tick(&mut self) -> Option<Point<f64>> {
        let (current, target) = (self.current?, self.target?);

        let next = Point::new(
            current.x() + (target.x() - current.x()) * self.alpha,
            current.y() + (target.y() - current.y()) * self.alpha,
        );
        self.current = Some(next);
        Some(next)
    }

    /// Rendered marker position, if any fix has arrived yet.
    #[inline]
    pub fn current(&self) -> Option<Point<f64>> {
        self.current
    }

    /// Latest raw target, if any.
    #[inline]
    pub fn target(&self) -> Option<Point<f64>> {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn tick_without_target_does_nothing() {
        let mut smoother = PositionSmoother::new(0.2);
        assert_eq!(smoother.tick(), None);
        assert_eq!(smoother.current(), None);
    }

    #[test]
    fn first_target_sets_current_without_a_jump() {
        let mut smoother = PositionSmoother::new(0.2);
        smoother.set_target(Point::new(-46.63, -23.55));
        assert_eq!(smoother.current(), Some(Point::new(-46.63, -23.55)));

        // Already on target: ticking keeps it there.
        let after = smoother.tick().unwrap();
        assert_relative_eq!(after.x(), -46.63, epsilon = 1e-12);
        assert_relative_eq!(after.y(), -23.55, epsilon = 1e-12);
    }

    #[test]
    fn converges_geometrically_for_any_alpha() {
        for alpha in [0.05, 0.2, 0.5, 1.0] {
            for gap in [0.001, 0.1, 2.0] {
                let mut smoother = PositionSmoother::new(alpha);
                smoother.set_target(Point::new(0.0, 0.0));
                smoother.set_target(Point::new(gap, 0.0));

                let k = 10;
                for _ in 0..k {
                    smoother.tick();
                }

                let residual = gap - smoother.current().unwrap().x();
                let expected = gap * (1.0 - alpha).powi(k);
                assert_relative_eq!(residual, expected, epsilon = 1e-9 * gap);
            }
        }
    }

    #[test]
    fn retargeting_redirects_midflight() {
        let mut smoother = PositionSmoother::new(0.5);
        smoother.set_target(Point::new(0.0, 0.0));
        smoother.set_target(Point::new(1.0, 0.0));
        smoother.tick(); // at 0.5

        smoother.set_target(Point::new(0.0, 1.0));
        let next = smoother.tick().unwrap();
        // Halfway from (0.5, 0) toward (0, 1)
        assert_relative_eq!(next.x(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(next.y(), 0.5, epsilon = 1e-12);
    }
}
