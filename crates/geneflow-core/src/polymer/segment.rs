//! Shape segments — rectangular regions of a polymer outline.
//!
//! A flat segment is a horizontal run whose width equals its contained
//! length; it grows and shrinks from the left, its lower-right corner fixed.
//! A square segment holds a coiled stretch whose side grows as the 0.7
//! power of its length; it resizes about its upper-left corner.

use crate::types::{Rect, SegmentId, Vec2};
use serde::{Deserialize, Serialize};

/// Exponent of square side growth.
pub const SQUARE_GROWTH_EXPONENT: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SegmentKind {
    Flat { capacity: f64 },
    Square,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeSegment {
    id: SegmentId,
    kind: SegmentKind,
    bounds: Rect,
    contained_length: f64,
}

impl ShapeSegment {
    /// Empty flat segment whose lower-right corner sits at `lower_right`.
    pub fn flat(id: SegmentId, lower_right: Vec2, capacity: f64) -> Self {
        Self {
            id,
            kind: SegmentKind::Flat { capacity },
            bounds: Rect::new(lower_right.x, lower_right.y, lower_right.x, lower_right.y),
            contained_length: 0.0,
        }
    }

    /// Empty square segment whose upper-left corner sits at `upper_left`.
    pub fn square(id: SegmentId, upper_left: Vec2) -> Self {
        Self {
            id,
            kind: SegmentKind::Square,
            bounds: Rect::new(upper_left.x, upper_left.y, upper_left.x, upper_left.y),
            contained_length: 0.0,
        }
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    pub fn is_flat(&self) -> bool {
        matches!(self.kind, SegmentKind::Flat { .. })
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn contained_length(&self) -> f64 {
        self.contained_length
    }

    pub fn capacity(&self) -> f64 {
        match self.kind {
            SegmentKind::Flat { capacity } => capacity,
            SegmentKind::Square => f64::INFINITY,
        }
    }

    pub fn remaining_capacity(&self) -> f64 {
        (self.capacity() - self.contained_length).max(0.0)
    }

    pub fn is_full(&self) -> bool {
        self.remaining_capacity() <= 0.0
    }

    pub fn upper_left(&self) -> Vec2 {
        self.bounds.upper_left()
    }

    pub fn lower_right(&self) -> Vec2 {
        self.bounds.lower_right()
    }

    pub fn set_upper_left(&mut self, p: Vec2) {
        self.bounds = self.bounds.translated(p - self.upper_left());
    }

    pub fn set_lower_right(&mut self, p: Vec2) {
        self.bounds = self.bounds.translated(p - self.lower_right());
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.bounds = self.bounds.translated(delta);
    }

    /// Change a flat segment's capacity. Returns the length that no longer
    /// fits; the caller must place it elsewhere.
    pub(crate) fn set_capacity(&mut self, capacity: f64) -> f64 {
        match &mut self.kind {
            SegmentKind::Flat { capacity: c } => {
                *c = capacity;
                let excess = (self.contained_length - capacity).max(0.0);
                if excess > 0.0 {
                    self.set_contained_length(capacity);
                }
                excess
            }
            SegmentKind::Square => 0.0,
        }
    }

    pub(crate) fn grow(&mut self, length: f64) {
        debug_assert!(
            self.contained_length + length <= self.capacity() + 1e-9,
            "segment {:?} grown past capacity",
            self.id
        );
        self.set_contained_length(self.contained_length + length);
    }

    pub(crate) fn shrink(&mut self, length: f64) {
        self.set_contained_length((self.contained_length - length).max(0.0));
    }

    fn set_contained_length(&mut self, length: f64) {
        self.contained_length = length;
        match self.kind {
            SegmentKind::Flat { .. } => {
                let lower_right = self.lower_right();
                self.bounds = Rect::new(lower_right.x - length, lower_right.y, lower_right.x, lower_right.y);
            }
            SegmentKind::Square => {
                let upper_left = self.upper_left();
                let side = length.powf(SQUARE_GROWTH_EXPONENT);
                self.bounds = Rect::new(upper_left.x, upper_left.y - side, upper_left.x + side, upper_left.y);
            }
        }
    }
}
