//! Piecewise-constant random velocity, optionally biased toward a heading.

use super::{clamp_depth, Pose, MAX_REROLL_INTERVAL, MAX_WALK_SPEED, MAX_Z_SPEED, MIN_REROLL_INTERVAL, MIN_WALK_SPEED};
use crate::bounds::MotionBounds;
use crate::types::{Rect, Vec2};
use rand::Rng;
use std::f64::consts::PI;

/// Half-width of the heading cone used by [`WanderInGeneralDirection`].
const WANDER_SPREAD: f64 = PI / 6.0;

/// Random velocity re-rolled every 0.25–0.8 s, bounced off forbidden regions.
#[derive(Debug, Clone, Default)]
pub struct RandomWalk {
    velocity: Vec2,
    z_velocity: f64,
    reroll_countdown: f64,
}

impl RandomWalk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub(crate) fn step_velocity<R: Rng + ?Sized>(
        &mut self,
        footprint: &Rect,
        bounds: &MotionBounds,
        dt: f64,
        rng: &mut R,
    ) -> Vec2 {
        self.reroll_countdown -= dt;
        if self.reroll_countdown <= 0.0 {
            let speed = rng.gen_range(MIN_WALK_SPEED..MAX_WALK_SPEED);
            self.velocity = Vec2::from_polar(speed, rng.gen_range(0.0..2.0 * PI));
            self.z_velocity = rng.gen_range(-MAX_Z_SPEED..MAX_Z_SPEED);
            self.reroll_countdown = rng.gen_range(MIN_REROLL_INTERVAL..MAX_REROLL_INTERVAL);
        }
        self.velocity = bounded_velocity(self.velocity, footprint, bounds, dt);
        self.velocity
    }

    pub(crate) fn next_pose<R: Rng + ?Sized>(
        &mut self,
        current: Pose,
        footprint: &Rect,
        bounds: &MotionBounds,
        dt: f64,
        rng: &mut R,
    ) -> Pose {
        let velocity = self.step_velocity(footprint, bounds, dt, rng);
        let mut z = current.z + self.z_velocity * dt;
        if z != clamp_depth(z) {
            self.z_velocity = -self.z_velocity;
            z = clamp_depth(z);
        }
        Pose {
            position: current.position + velocity * dt,
            z,
        }
    }
}

/// Random walk whose headings stay within ±30° of a fixed direction.
#[derive(Debug, Clone)]
pub struct WanderInGeneralDirection {
    direction: Vec2,
    velocity: Vec2,
    reroll_countdown: f64,
}

impl WanderInGeneralDirection {
    pub fn new(direction: Vec2) -> Self {
        Self {
            direction: direction.normalized(),
            velocity: Vec2::ZERO,
            reroll_countdown: 0.0,
        }
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub(crate) fn next_pose<R: Rng + ?Sized>(
        &mut self,
        current: Pose,
        footprint: &Rect,
        bounds: &MotionBounds,
        dt: f64,
        rng: &mut R,
    ) -> Pose {
        self.reroll_countdown -= dt;
        if self.reroll_countdown <= 0.0 {
            let angle = self.direction.angle() + rng.gen_range(-WANDER_SPREAD..WANDER_SPREAD);
            let speed = rng.gen_range(MIN_WALK_SPEED..MAX_WALK_SPEED);
            self.velocity = Vec2::from_polar(speed, angle);
            self.reroll_countdown = rng.gen_range(MIN_REROLL_INTERVAL..MAX_REROLL_INTERVAL);
        }
        self.velocity = bounded_velocity(self.velocity, footprint, bounds, dt);
        Pose {
            position: current.position + self.velocity * dt,
            z: current.z,
        }
    }
}

/// Keep `velocity` if the projected footprint stays in bounds, otherwise try
/// flipping x, then y, then both. A footprint already out of bounds, or one
/// that no flip rescues, heads for the centre of the region.
pub(crate) fn bounded_velocity(velocity: Vec2, footprint: &Rect, bounds: &MotionBounds, dt: f64) -> Vec2 {
    let toward_center = (bounds.center() - footprint.center()).with_magnitude(velocity.magnitude());
    if !bounds.in_bounds(footprint) {
        return toward_center;
    }
    if bounds.test_motion(footprint, velocity, dt) {
        return velocity;
    }
    let candidates = [
        Vec2::new(-velocity.x, velocity.y),
        Vec2::new(velocity.x, -velocity.y),
        -velocity,
    ];
    candidates
        .into_iter()
        .find(|v| bounds.test_motion(footprint, *v, dt))
        .unwrap_or(toward_center)
}
