//! Shared types used across all Geneflow crates.
//!
//! Model space is two-dimensional with y pointing up. Depth (`z`) is kept
//! separately on each biomolecule and is bounded to `[-1, 0]`.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};
use uuid::Uuid;

/// Unique identifier for a biomolecule in the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic id, used by seeded worlds and tests.
    pub fn from_seed(seed: u64) -> Self {
        Self(Uuid::from_u64_pair(0x6765_6e65_666c_6f77, seed))
    }

    /// Stable 64-bit value used to derive per-agent random streams.
    pub fn stable_bits(&self) -> u64 {
        let (high, low) = self.0.as_u64_pair();
        high ^ low
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = self.0.to_string();
        write!(f, "{}", &text[text.len() - 8..])
    }
}

/// Handle of an attachment site in the site registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiteId(pub u64);

/// Handle of a shape segment inside one polymer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

/// A point or displacement in model space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const UP: Vec2 = Vec2 { x: 0.0, y: 1.0 };
    pub const DOWN: Vec2 = Vec2 { x: 0.0, y: -1.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_polar(magnitude: f64, angle: f64) -> Self {
        Self::new(magnitude * angle.cos(), magnitude * angle.sin())
    }

    pub fn distance_to(&self, other: &Vec2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    pub fn normalized(&self) -> Vec2 {
        let m = self.magnitude();
        if m > 0.0 {
            Vec2::new(self.x / m, self.y / m)
        } else {
            Vec2::ZERO
        }
    }

    pub fn with_magnitude(&self, magnitude: f64) -> Vec2 {
        self.normalized() * magnitude
    }

    pub fn rotated(&self, radians: f64) -> Vec2 {
        let (sin, cos) = radians.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    pub fn lerp(&self, other: &Vec2, t: f64) -> Vec2 {
        Vec2::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Axis-aligned rectangle. `min_y` is the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    pub fn from_center(center: Vec2, width: f64, height: f64) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            center.x + width / 2.0,
            center.y + height / 2.0,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    pub fn upper_left(&self) -> Vec2 {
        Vec2::new(self.min_x, self.max_y)
    }

    pub fn lower_right(&self) -> Vec2 {
        Vec2::new(self.max_x, self.min_y)
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// Strict overlap test; rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    pub fn translated(&self, delta: Vec2) -> Rect {
        Rect {
            min_x: self.min_x + delta.x,
            min_y: self.min_y + delta.y,
            max_x: self.max_x + delta.x,
            max_y: self.max_y + delta.y,
        }
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(self.min_x, self.max_x), p.y.clamp(self.min_y, self.max_y))
    }
}

/// Display colour, components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn blend(&self, other: &Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        Rgba {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

/// Whether a transcription factor promotes or represses its gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

/// A transcription factor variety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactorKind {
    pub id: u8,
    pub polarity: Polarity,
}

impl FactorKind {
    pub const fn positive(id: u8) -> Self {
        Self { id, polarity: Polarity::Positive }
    }

    pub const fn negative(id: u8) -> Self {
        Self { id, polarity: Polarity::Negative }
    }

    pub fn is_positive(&self) -> bool {
        self.polarity == Polarity::Positive
    }
}

/// The protein a gene codes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductKind(pub u8);

/// Which family of DNA-binding biomolecule a strand site serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SiteClass {
    Polymerase,
    TranscriptionFactor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_ids_are_stable() {
        assert_eq!(AgentId::from_seed(7), AgentId::from_seed(7));
        assert_ne!(AgentId::from_seed(7), AgentId::from_seed(8));
    }

    #[test]
    fn rect_corners_follow_y_up() {
        let r = Rect::new(0.0, 0.0, 10.0, 4.0);
        assert_eq!(r.upper_left(), Vec2::new(0.0, 4.0));
        assert_eq!(r.lower_right(), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 20.0, 10.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&b.translated(Vec2::new(-1.0, 0.0))));
    }

    #[test]
    fn rotation_preserves_length() {
        let v = Vec2::new(3.0, 4.0).rotated(1.1);
        assert!((v.magnitude() - 5.0).abs() < 1e-9);
    }
}
