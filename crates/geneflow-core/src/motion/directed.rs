//! Destination-seeking strategies.

use super::random_walk::RandomWalk;
use super::Pose;
use crate::bounds::MotionBounds;
use crate::types::{Rect, Vec2};
use rand::Rng;

/// Share of a meander step taken from the random walk.
const MEANDER_RANDOM_SHARE: f64 = 0.6;

/// Constant-speed straight-line approach that lands exactly on target.
///
/// Depth closes toward `destination_z` in proportion to the planar distance
/// covered, so both arrive together.
#[derive(Debug, Clone)]
pub struct MoveDirectlyToDestination {
    destination: Vec2,
    destination_z: f64,
    speed: f64,
}

impl MoveDirectlyToDestination {
    pub fn new(destination: Vec2, speed: f64) -> Self {
        Self {
            destination,
            destination_z: 0.0,
            speed,
        }
    }

    pub fn with_destination_z(mut self, z: f64) -> Self {
        self.destination_z = z;
        self
    }

    pub fn destination(&self) -> Vec2 {
        self.destination
    }

    pub fn set_destination(&mut self, destination: Vec2) {
        self.destination = destination;
    }

    pub(crate) fn next_pose(&mut self, current: Pose, dt: f64) -> Pose {
        let to_destination = self.destination - current.position;
        let distance = to_destination.magnitude();
        let step = self.speed * dt;
        if distance <= step {
            return Pose {
                position: self.destination,
                z: self.destination_z,
            };
        }
        let z = current.z + (self.destination_z - current.z) * (step / distance);
        Pose {
            position: current.position + to_destination.with_magnitude(step),
            z,
        }
    }
}

/// Blend of random walk and direct approach while the target lies outside
/// the agent's footprint, pure direct approach once it is inside.
#[derive(Debug, Clone)]
pub struct MeanderToDestination {
    walk: RandomWalk,
    direct: MoveDirectlyToDestination,
}

impl MeanderToDestination {
    pub fn new(destination: Vec2, speed: f64) -> Self {
        Self {
            walk: RandomWalk::new(),
            direct: MoveDirectlyToDestination::new(destination, speed),
        }
    }

    pub fn destination(&self) -> Vec2 {
        self.direct.destination()
    }

    pub fn set_destination(&mut self, destination: Vec2) {
        self.direct.set_destination(destination);
    }

    pub(crate) fn next_pose<R: Rng + ?Sized>(
        &mut self,
        current: Pose,
        footprint: &Rect,
        bounds: &MotionBounds,
        dt: f64,
        rng: &mut R,
    ) -> Pose {
        let direct = self.direct.next_pose(current, dt);
        if footprint.contains_point(self.direct.destination()) {
            return direct;
        }
        let wander = self.walk.step_velocity(footprint, bounds, dt, rng) * dt;
        let approach = direct.position - current.position;
        Pose {
            position: current.position
                + wander * MEANDER_RANDOM_SHARE
                + approach * (1.0 - MEANDER_RANDOM_SHARE),
            z: direct.z,
        }
    }
}
