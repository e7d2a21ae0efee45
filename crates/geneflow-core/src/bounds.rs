//! Allowed-region test for mobile biomolecules.

use crate::types::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A rectangle an agent must stay inside, minus excluded sub-regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionBounds {
    pub bounds: Rect,
    pub exclusions: Vec<Rect>,
}

impl MotionBounds {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            exclusions: Vec::new(),
        }
    }

    /// Effectively unbounded region.
    pub fn unbounded() -> Self {
        Self::new(Rect::new(-1e9, -1e9, 1e9, 1e9))
    }

    pub fn with_exclusion(mut self, region: Rect) -> Self {
        self.exclusions.push(region);
        self
    }

    /// Whether a footprint lies entirely inside the allowed region.
    pub fn in_bounds(&self, footprint: &Rect) -> bool {
        self.bounds.contains_rect(footprint) && !self.exclusions.iter().any(|e| e.intersects(footprint))
    }

    /// Whether a footprint moved by `velocity * dt` would stay in bounds.
    pub fn test_motion(&self, footprint: &Rect, velocity: Vec2, dt: f64) -> bool {
        self.in_bounds(&footprint.translated(velocity * dt))
    }

    pub fn center(&self) -> Vec2 {
        self.bounds.center()
    }
}

impl Default for MotionBounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusion_rejects_overlap() {
        let bounds = MotionBounds::new(Rect::new(0.0, 0.0, 100.0, 100.0))
            .with_exclusion(Rect::new(40.0, 40.0, 60.0, 60.0));
        assert!(bounds.in_bounds(&Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(!bounds.in_bounds(&Rect::new(35.0, 35.0, 45.0, 45.0)));
        assert!(!bounds.in_bounds(&Rect::new(95.0, 0.0, 105.0, 10.0)));
    }

    #[test]
    fn motion_test_projects_footprint() {
        let bounds = MotionBounds::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let fp = Rect::new(80.0, 10.0, 90.0, 20.0);
        assert!(bounds.test_motion(&fp, Vec2::new(50.0, 0.0), 0.1));
        assert!(!bounds.test_motion(&fp, Vec2::new(50.0, 0.0), 1.0));
    }
}
