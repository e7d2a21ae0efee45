//! Polymer winding — the incremental geometry of a growing RNA strand.
//!
//! A [`WindingPolymer`] is a chain of shape-defining points (the centreline,
//! head first) laid through an ordered list of [`ShapeSegment`]s. Segments
//! chain left to right by corner continuity: every segment's lower-right
//! corner equals the next segment's upper-left corner.
//!
//! Invariants kept after every public operation:
//! - each segment's contained length is within its capacity;
//! - the sum of contained lengths equals the sum of the points' target
//!   distances (the polymer length).

pub mod segment;
pub mod winding;

pub use segment::{SegmentKind, ShapeSegment, SQUARE_GROWTH_EXPONENT};
pub use winding::{WindingParams, WINDING_PRESETS};

use crate::types::{Rect, SegmentId, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::warn;

/// Lengths below this are treated as zero.
const LENGTH_EPSILON: f64 = 1e-9;

/// A centreline node; `target_distance` is the length between this point
/// and the previous one (zero for the head).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeDefiningPoint {
    pub position: Vec2,
    pub target_distance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindingPolymer {
    points: VecDeque<ShapeDefiningPoint>,
    segments: Vec<ShapeSegment>,
    winding: WindingParams,
    inter_point_distance: f64,
    position: Vec2,
    next_segment_id: u64,
}

impl WindingPolymer {
    /// A polymer that starts as a single empty flat leader of capacity
    /// `leader_length`, lower-right corner at `position`.
    pub fn with_leader<R: Rng + ?Sized>(
        position: Vec2,
        leader_length: f64,
        inter_point_distance: f64,
        rng: &mut R,
    ) -> Self {
        let mut polymer = Self::empty(position, inter_point_distance, random_winding(rng));
        let id = polymer.next_id();
        polymer.segments.push(ShapeSegment::flat(id, position, leader_length));
        polymer
    }

    /// A polymer that starts as a single empty square segment, upper-left
    /// corner at `position`. Used for degradation fragments.
    pub fn coiled<R: Rng + ?Sized>(position: Vec2, inter_point_distance: f64, rng: &mut R) -> Self {
        let mut polymer = Self::empty(position, inter_point_distance, random_winding(rng));
        let id = polymer.next_id();
        polymer.segments.push(ShapeSegment::square(id, position));
        polymer
    }

    fn empty(position: Vec2, inter_point_distance: f64, winding: WindingParams) -> Self {
        let mut points = VecDeque::new();
        points.push_back(ShapeDefiningPoint {
            position,
            target_distance: 0.0,
        });
        Self {
            points,
            segments: Vec::new(),
            winding,
            inter_point_distance,
            position,
            next_segment_id: 0,
        }
    }

    fn next_id(&mut self) -> SegmentId {
        let id = SegmentId(self.next_segment_id);
        self.next_segment_id += 1;
        id
    }

    // --- Queries -------------------------------------------------------

    /// Total length, as the sum of the points' target distances.
    pub fn length(&self) -> f64 {
        self.points.iter().map(|p| p.target_distance).sum()
    }

    /// Total length held by the segments.
    pub fn contained_length(&self) -> f64 {
        self.segments.iter().map(|s| s.contained_length()).sum()
    }

    pub fn points(&self) -> impl Iterator<Item = &ShapeDefiningPoint> {
        self.points.iter()
    }

    pub fn point_positions(&self) -> Vec<Vec2> {
        self.points.iter().map(|p| p.position).collect()
    }

    pub fn segments(&self) -> &[ShapeSegment] {
        &self.segments
    }

    pub fn segment(&self, id: SegmentId) -> Option<&ShapeSegment> {
        self.segments.iter().find(|s| s.id() == id)
    }

    pub fn first_segment(&self) -> Option<&ShapeSegment> {
        self.segments.first()
    }

    fn index_of(&self, id: SegmentId) -> Option<usize> {
        self.segments.iter().position(|s| s.id() == id)
    }

    /// External position handle, kept at the shape centroid.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Union of all segment bounds.
    pub fn shape_bounds(&self) -> Rect {
        let mut iter = self.segments.iter().map(|s| s.bounds());
        let first = iter
            .next()
            .unwrap_or_else(|| Rect::from_center(self.position, 0.0, 0.0));
        iter.fold(first, |acc, b| acc.union(&b))
    }

    pub fn winding(&self) -> WindingParams {
        self.winding
    }

    // --- Growth --------------------------------------------------------

    /// Extend the polymer by `length` at its tail.
    pub fn add_length(&mut self, length: f64) {
        if length <= 0.0 {
            return;
        }
        self.extend_points(length);
        let last = self.segments.len() - 1;
        self.add_to_segment(last, length);
        self.realign_segments_from_end();
        self.wind_points_through_segments();
        self.recenter();
    }

    /// Top up the last point to the nominal spacing, then append points
    /// until `length` is placed.
    fn extend_points(&mut self, mut length: f64) {
        let spacing = self.inter_point_distance;
        while length > LENGTH_EPSILON {
            let has_tail = self.points.len() > 1;
            let Some(last) = self.points.back_mut() else {
                return;
            };
            if has_tail && last.target_distance < spacing {
                let added = (spacing - last.target_distance).min(length);
                last.target_distance += added;
                length -= added;
            } else {
                let added = spacing.min(length);
                let position = last.position;
                self.points.push_back(ShapeDefiningPoint {
                    position,
                    target_distance: added,
                });
                length -= added;
            }
        }
    }

    /// Grow segment `index` by `length`, spilling any overflow into a new
    /// square segment inserted right after it.
    fn add_to_segment(&mut self, index: usize, length: f64) {
        let room = self.segments[index].remaining_capacity();
        if length <= room {
            self.segments[index].grow(length);
            return;
        }
        self.segments[index].grow(room);
        let anchor = self.segments[index].lower_right();
        let id = self.next_id();
        let mut spill = ShapeSegment::square(id, anchor);
        spill.grow(length - room);
        self.segments.insert(index + 1, spill);
    }

    /// Change the capacity of a flat segment, pushing any excess into the
    /// following segment.
    pub fn set_segment_capacity(&mut self, id: SegmentId, capacity: f64) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        let excess = self.segments[index].set_capacity(capacity);
        if excess > 0.0 {
            match self.segments.get(index + 1) {
                Some(next) if !next.is_flat() => self.segments[index + 1].grow(excess),
                _ => {
                    let anchor = self.segments[index].lower_right();
                    let new_id = self.next_id();
                    let mut spill = ShapeSegment::square(new_id, anchor);
                    spill.grow(excess);
                    self.segments.insert(index + 1, spill);
                }
            }
            self.realign_segments_from(id);
            self.wind_points_through_segments();
            self.recenter();
        }
    }

    // --- Translation and destruction ----------------------------------

    /// Pull `length` through the flat channel segment `channel`: content
    /// enters from the following (input) segment and leaves into the
    /// preceding (output) segment, which is created if missing.
    ///
    /// Returns `true` once the whole polymer has passed the channel.
    pub fn advance(&mut self, channel: SegmentId, length: f64) -> bool {
        let Some(mut c) = self.index_of(channel) else {
            return true;
        };
        if !self.segments[c].is_flat() {
            debug_assert!(false, "square segment {:?} cannot advance", channel);
            warn!(segment = ?channel, "Attempt to advance a square segment");
            return false;
        }
        if c == 0 {
            let anchor = self.segments[0].upper_left();
            let id = self.next_id();
            let mut output = ShapeSegment::square(id, anchor);
            output.set_lower_right(anchor);
            self.segments.insert(0, output);
            c = 1;
        }
        let output = c - 1;

        if c + 1 >= self.segments.len() {
            let moved = length.min(self.segments[c].contained_length());
            self.segments[c].shrink(moved);
            self.segments[output].grow(moved);
        } else if self.segments[c + 1].contained_length() > length {
            let room = self.segments[c].remaining_capacity();
            if length <= room {
                self.segments[c].grow(length);
            } else {
                self.segments[c].grow(room);
                self.segments[output].grow(length - room);
            }
            self.segments[c + 1].shrink(length);
        } else {
            let available = self.segments.remove(c + 1).contained_length();
            let room = self.segments[c].remaining_capacity();
            if available <= room {
                self.segments[c].grow(available);
            } else {
                self.segments[c].grow(room);
                self.segments[output].grow(available - room);
            }
        }

        self.realign_segments_from(channel);
        self.wind_points_through_segments();
        self.recenter();
        self.segments[c].contained_length() <= LENGTH_EPSILON && c + 1 >= self.segments.len()
    }

    /// Consume `length` at the flat channel segment `channel`, drawing from
    /// the input segment first. The removed length is taken off the tail of
    /// the point chain.
    ///
    /// Returns `true` once nothing is left.
    pub fn advance_and_remove(&mut self, channel: SegmentId, length: f64) -> bool {
        let Some(c) = self.index_of(channel) else {
            return true;
        };
        if !self.segments[c].is_flat() {
            debug_assert!(false, "square segment {:?} cannot advance", channel);
            warn!(segment = ?channel, "Attempt to advance a square segment");
            return false;
        }
        let removed = if c + 1 >= self.segments.len() {
            let removed = length.min(self.segments[c].contained_length());
            self.segments[c].shrink(removed);
            removed
        } else if self.segments[c + 1].contained_length() > length {
            self.segments[c + 1].shrink(length);
            length
        } else {
            self.segments.remove(c + 1).contained_length()
        };
        self.remove_length_from_tail(removed);

        self.realign_segments_from(channel);
        self.wind_points_through_segments();
        self.recenter();
        self.length() <= LENGTH_EPSILON
    }

    fn remove_length_from_tail(&mut self, mut length: f64) {
        while length > LENGTH_EPSILON && self.points.len() > 1 {
            let Some(last) = self.points.back_mut() else {
                break;
            };
            if last.target_distance <= length {
                length -= last.target_distance;
                self.points.pop_back();
            } else {
                last.target_distance -= length;
                length = 0.0;
            }
        }
    }

    /// Rebuild the outline as a fresh leader plus one coil, keeping the
    /// centroid in place. Used after a translator or degrader lets go.
    pub fn recoil(&mut self, leader_length: f64) {
        let total = self.contained_length();
        let centroid = self.position;
        self.segments.clear();
        let leader_id = self.next_id();
        let mut leader = ShapeSegment::flat(leader_id, Vec2::ZERO, leader_length);
        let head = total.min(leader_length);
        leader.grow(head);
        self.segments.push(leader);
        if total - head > LENGTH_EPSILON {
            let coil_id = self.next_id();
            let mut coil = ShapeSegment::square(coil_id, Vec2::ZERO);
            coil.grow(total - head);
            self.segments.push(coil);
        }
        self.realign_segments_from(leader_id);
        let offset = centroid - self.shape_bounds().center();
        for segment in &mut self.segments {
            segment.translate(offset);
        }
        self.wind_points_through_segments();
        self.recenter();
    }

    // --- Layout --------------------------------------------------------

    /// Re-chain corners keeping the last segment fixed.
    pub fn realign_segments_from_end(&mut self) {
        for i in (0..self.segments.len().saturating_sub(1)).rev() {
            let anchor = self.segments[i + 1].upper_left();
            self.segments[i].set_lower_right(anchor);
        }
    }

    /// Re-chain corners outward from segment `id`, which stays fixed.
    pub fn realign_segments_from(&mut self, id: SegmentId) {
        let Some(c) = self.index_of(id) else {
            return;
        };
        for i in (0..c).rev() {
            let anchor = self.segments[i + 1].upper_left();
            self.segments[i].set_lower_right(anchor);
        }
        for i in c + 1..self.segments.len() {
            let anchor = self.segments[i - 1].lower_right();
            self.segments[i].set_upper_left(anchor);
        }
    }

    /// Place every point inside the segment that holds its stretch of the
    /// length: on a straight line in flat segments, on the complex wave in
    /// square ones. The last segment's range is open-ended so rounding
    /// drift never strands the tail point.
    pub fn wind_points_through_segments(&mut self) {
        let mut cumulative = 0.0;
        let mut segment_index = 0;
        let mut segment_start = 0.0;
        let count = self.segments.len();
        if count == 0 {
            return;
        }
        for point in self.points.iter_mut() {
            cumulative += point.target_distance;
            while segment_index + 1 < count {
                let held = self.segments[segment_index].contained_length();
                if held > 0.0 && cumulative <= segment_start + held {
                    break;
                }
                segment_start += held;
                segment_index += 1;
            }
            let segment = &self.segments[segment_index];
            let length = segment.contained_length();
            let t = if length > 0.0 {
                (cumulative - segment_start) / length
            } else {
                0.0
            };
            let bounds = segment.bounds();
            point.position = if segment.is_flat() {
                winding::straight_line(&bounds, t)
            } else {
                self.winding.complex_wave(&bounds, t)
            };
        }
    }

    /// Move the position handle to the centre of the shape.
    pub fn recenter(&mut self) {
        self.position = self.shape_bounds().center();
    }

    /// Rigidly move the whole polymer.
    pub fn translate(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }
        for segment in &mut self.segments {
            segment.translate(delta);
        }
        for point in &mut self.points {
            point.position += delta;
        }
        self.position += delta;
    }

    /// Move so the last segment's lower-right corner lands on `p`.
    pub fn set_lower_right_position(&mut self, p: Vec2) {
        if let Some(last) = self.segments.last() {
            let delta = p - last.lower_right();
            self.translate(delta);
        }
    }

    /// Move so segment `id`'s lower-right corner lands on `p`.
    pub fn set_segment_lower_right(&mut self, id: SegmentId, p: Vec2) {
        if let Some(segment) = self.segment(id) {
            let delta = p - segment.lower_right();
            self.translate(delta);
        }
    }

    /// Move so the centroid lands on `p`.
    pub fn set_position(&mut self, p: Vec2) {
        let delta = p - self.position;
        self.translate(delta);
    }
}

fn random_winding<R: Rng + ?Sized>(rng: &mut R) -> WindingParams {
    WINDING_PRESETS[rng.gen_range(0..WINDING_PRESETS.len())]
}
