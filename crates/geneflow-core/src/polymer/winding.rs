//! Closed-form "complex wave" used to coil points inside square segments.
//!
//! Points advance along the segment diagonal from the upper-left to the
//! lower-right corner. Two superposed sines displace them laterally and one
//! displaces them along the diagonal. Both offsets are multiplied by a
//! window that is zero at the corners so adjacent segments join cleanly.

use crate::types::{Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Frequencies (in cycles per diagonal), phases and amplitudes (as a share
/// of the diagonal length) of one coil style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindingParams {
    pub lateral_frequency_1: f64,
    pub lateral_phase_1: f64,
    pub lateral_frequency_2: f64,
    pub lateral_phase_2: f64,
    pub lateral_amplitude: f64,
    pub longitudinal_frequency: f64,
    pub longitudinal_phase: f64,
    pub longitudinal_amplitude: f64,
}

const fn params(l1: f64, p1: f64, l2: f64, p2: f64, la: f64, g: f64, gp: f64, ga: f64) -> WindingParams {
    WindingParams {
        lateral_frequency_1: l1,
        lateral_phase_1: p1,
        lateral_frequency_2: l2,
        lateral_phase_2: p2,
        lateral_amplitude: la,
        longitudinal_frequency: g,
        longitudinal_phase: gp,
        longitudinal_amplitude: ga,
    }
}

/// Hand-tuned coil styles; each new polymer picks one at random.
pub const WINDING_PRESETS: [WindingParams; 10] = [
    params(1.5, 0.0, 2.9, 0.8, 0.30, 2.2, 0.0, 0.12),
    params(2.0, 0.6, 3.3, 1.9, 0.26, 1.7, 0.4, 0.15),
    params(1.2, 1.1, 4.1, 0.2, 0.32, 2.6, 1.2, 0.10),
    params(2.6, 0.3, 3.7, 2.4, 0.24, 1.4, 2.1, 0.18),
    params(1.8, 2.2, 2.5, 0.5, 0.28, 3.1, 0.9, 0.08),
    params(3.1, 1.4, 4.6, 1.0, 0.22, 2.0, 2.8, 0.14),
    params(1.4, 0.9, 3.0, 2.7, 0.34, 1.8, 1.6, 0.11),
    params(2.3, 2.9, 3.9, 0.4, 0.25, 2.4, 0.3, 0.16),
    params(1.7, 1.8, 2.2, 1.5, 0.30, 2.9, 2.4, 0.09),
    params(2.8, 0.1, 4.3, 2.0, 0.23, 1.5, 1.9, 0.17),
];

impl WindingParams {
    /// Position of the point at fraction `t` of the way through `bounds`.
    /// The result is always inside `bounds`.
    pub fn complex_wave(&self, bounds: &Rect, t: f64) -> Vec2 {
        let t = t.clamp(0.0, 1.0);
        let start = bounds.upper_left();
        let diagonal = bounds.lower_right() - start;
        let span = diagonal.magnitude();
        if span <= 0.0 {
            return bounds.center();
        }
        let along = diagonal * (1.0 / span);
        let across = Vec2::new(-along.y, along.x);
        let window = (PI * t).sin();
        let lateral = 0.5
            * ((2.0 * PI * self.lateral_frequency_1 * t + self.lateral_phase_1).sin()
                + (2.0 * PI * self.lateral_frequency_2 * t + self.lateral_phase_2).sin());
        let longitudinal = (2.0 * PI * self.longitudinal_frequency * t + self.longitudinal_phase).sin();
        let point = start
            + along * (t * span + longitudinal * self.longitudinal_amplitude * span * window)
            + across * (lateral * self.lateral_amplitude * span * window);
        bounds.clamp_point(point)
    }
}

/// Position along a flat segment, head at the upper-left corner.
pub fn straight_line(bounds: &Rect, t: f64) -> Vec2 {
    bounds.upper_left().lerp(&bounds.lower_right(), t.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_touches_both_corners() {
        let b = Rect::new(0.0, -100.0, 100.0, 0.0);
        for preset in &WINDING_PRESETS {
            let head = preset.complex_wave(&b, 0.0);
            let tail = preset.complex_wave(&b, 1.0);
            assert!(head.distance_to(&b.upper_left()) < 1e-9);
            assert!(tail.distance_to(&b.lower_right()) < 1e-6);
        }
    }

    #[test]
    fn wave_stays_inside_bounds() {
        let b = Rect::new(10.0, 10.0, 60.0, 60.0);
        for preset in &WINDING_PRESETS {
            for i in 0..=50 {
                let p = preset.complex_wave(&b, i as f64 / 50.0);
                assert!(b.contains_point(p));
            }
        }
    }

    #[test]
    fn degenerate_bounds_collapse_to_center() {
        let b = Rect::new(5.0, 5.0, 5.0, 5.0);
        assert_eq!(WINDING_PRESETS[0].complex_wave(&b, 0.3), Vec2::new(5.0, 5.0));
    }
}
