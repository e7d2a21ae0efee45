//! Motion-strategy library.
//!
//! A strategy computes an agent's next position from its current position,
//! footprint, allowed region and the elapsed time. Strategies are swapped
//! by the attachment state machines on every state entry.
//!
//! Strategies that mirror something else (a site, an mRNA's destruction
//! point) read it through [`MotionContext`] rather than holding references.

mod directed;
mod random_walk;
mod tracking;

pub use directed::{MeanderToDestination, MoveDirectlyToDestination};
pub use random_walk::{RandomWalk, WanderInGeneralDirection};
pub use tracking::{DestroyerTrackingRna, DriftThenTeleport, FollowAttachmentSite};

use crate::bounds::MotionBounds;
use crate::types::{AgentId, Rect, SiteId, Vec2};
use rand::Rng;

/// Slowest random-walk speed, in units per second.
pub const MIN_WALK_SPEED: f64 = 100.0;
/// Fastest random-walk speed, in units per second.
pub const MAX_WALK_SPEED: f64 = 400.0;
/// Shortest interval before a random-walk velocity is re-rolled.
pub const MIN_REROLL_INTERVAL: f64 = 0.25;
/// Longest interval before a random-walk velocity is re-rolled.
pub const MAX_REROLL_INTERVAL: f64 = 0.8;
/// Depth change per second while walking.
pub const MAX_Z_SPEED: f64 = 0.3;
/// Time a depth fade takes, in seconds.
pub const DEPTH_FADE_TIME: f64 = 1.0;

/// Read-only lookups needed by strategies that follow other entities.
pub trait MotionContext {
    /// Current position of an attachment site.
    fn site_position(&self, site: SiteId) -> Option<Vec2>;

    /// Point at which an mRNA is currently being consumed.
    fn destruction_point(&self, messenger_rna: AgentId) -> Option<Vec2>;
}

/// Position plus depth. Depth is bounded to `[-1, 0]`, 0 being in front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec2,
    pub z: f64,
}

impl Pose {
    pub fn new(position: Vec2, z: f64) -> Self {
        Self {
            position,
            z: clamp_depth(z),
        }
    }
}

pub(crate) fn clamp_depth(z: f64) -> f64 {
    z.clamp(-1.0, 0.0)
}

/// The active motion algorithm of one agent.
#[derive(Debug, Clone)]
pub enum MotionStrategy {
    /// No movement; position is driven externally.
    Stillness,
    RandomWalk(RandomWalk),
    WanderInGeneralDirection(WanderInGeneralDirection),
    MeanderToDestination(MeanderToDestination),
    MoveDirectlyToDestination(MoveDirectlyToDestination),
    FollowAttachmentSite(FollowAttachmentSite),
    DriftThenTeleport(DriftThenTeleport),
    DestroyerTrackingRna(DestroyerTrackingRna),
}

impl MotionStrategy {
    pub fn random_walk() -> Self {
        MotionStrategy::RandomWalk(RandomWalk::new())
    }

    pub fn wander(direction: Vec2) -> Self {
        MotionStrategy::WanderInGeneralDirection(WanderInGeneralDirection::new(direction))
    }

    pub fn meander_to(destination: Vec2, speed: f64) -> Self {
        MotionStrategy::MeanderToDestination(MeanderToDestination::new(destination, speed))
    }

    pub fn move_directly_to(destination: Vec2, speed: f64) -> Self {
        MotionStrategy::MoveDirectlyToDestination(MoveDirectlyToDestination::new(destination, speed))
    }

    pub fn follow_site(site: SiteId, offset: Vec2) -> Self {
        MotionStrategy::FollowAttachmentSite(FollowAttachmentSite::new(site, offset))
    }

    pub fn track_destruction(messenger_rna: AgentId, offset: Vec2) -> Self {
        MotionStrategy::DestroyerTrackingRna(DestroyerTrackingRna::new(messenger_rna, offset))
    }

    pub fn name(&self) -> &'static str {
        match self {
            MotionStrategy::Stillness => "stillness",
            MotionStrategy::RandomWalk(_) => "random_walk",
            MotionStrategy::WanderInGeneralDirection(_) => "wander_in_general_direction",
            MotionStrategy::MeanderToDestination(_) => "meander_to_destination",
            MotionStrategy::MoveDirectlyToDestination(_) => "move_directly_to_destination",
            MotionStrategy::FollowAttachmentSite(_) => "follow_attachment_site",
            MotionStrategy::DriftThenTeleport(_) => "drift_then_teleport",
            MotionStrategy::DestroyerTrackingRna(_) => "destroyer_tracking_rna",
        }
    }

    /// Scripted strategies report completion; all others never finish.
    pub fn is_finished(&self) -> bool {
        match self {
            MotionStrategy::DriftThenTeleport(s) => s.has_teleported(),
            _ => false,
        }
    }

    /// Retarget a destination-seeking strategy. Other strategies ignore it.
    pub fn set_destination(&mut self, destination: Vec2) {
        match self {
            MotionStrategy::MeanderToDestination(s) => s.set_destination(destination),
            MotionStrategy::MoveDirectlyToDestination(s) => s.set_destination(destination),
            _ => {}
        }
    }

    /// Planar next position; depth is left untouched.
    pub fn next_position<R, C>(
        &mut self,
        current: Vec2,
        footprint: &Rect,
        bounds: &MotionBounds,
        dt: f64,
        rng: &mut R,
        ctx: &C,
    ) -> Vec2
    where
        R: Rng + ?Sized,
        C: MotionContext + ?Sized,
    {
        self.next_pose(Pose::new(current, 0.0), footprint, bounds, dt, rng, ctx)
            .position
    }

    /// Depth-aware next pose. The returned depth is always in `[-1, 0]`.
    pub fn next_pose<R, C>(
        &mut self,
        current: Pose,
        footprint: &Rect,
        bounds: &MotionBounds,
        dt: f64,
        rng: &mut R,
        ctx: &C,
    ) -> Pose
    where
        R: Rng + ?Sized,
        C: MotionContext + ?Sized,
    {
        let next = match self {
            MotionStrategy::Stillness => current,
            MotionStrategy::RandomWalk(s) => s.next_pose(current, footprint, bounds, dt, rng),
            MotionStrategy::WanderInGeneralDirection(s) => {
                s.next_pose(current, footprint, bounds, dt, rng)
            }
            MotionStrategy::MeanderToDestination(s) => {
                s.next_pose(current, footprint, bounds, dt, rng)
            }
            MotionStrategy::MoveDirectlyToDestination(s) => s.next_pose(current, dt),
            MotionStrategy::FollowAttachmentSite(s) => s.next_pose(current, dt, ctx),
            MotionStrategy::DriftThenTeleport(s) => s.next_pose(current, bounds, dt, rng),
            MotionStrategy::DestroyerTrackingRna(s) => s.next_pose(current, ctx),
        };
        Pose::new(next.position, next.z)
    }
}

impl Default for MotionStrategy {
    fn default() -> Self {
        MotionStrategy::random_walk()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    /// Resolves every lookup to nothing.
    struct NoContext;

    impl MotionContext for NoContext {
        fn site_position(&self, _site: SiteId) -> Option<Vec2> {
            None
        }

        fn destruction_point(&self, _messenger_rna: AgentId) -> Option<Vec2> {
            None
        }
    }

    #[test]
    fn stillness_keeps_pose() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let mut s = MotionStrategy::Stillness;
        let fp = Rect::from_center(Vec2::new(5.0, 5.0), 2.0, 2.0);
        let pose = s.next_pose(
            Pose::new(Vec2::new(5.0, 5.0), -0.5),
            &fp,
            &MotionBounds::unbounded(),
            0.1,
            &mut rng,
            &NoContext,
        );
        assert_eq!(pose, Pose::new(Vec2::new(5.0, 5.0), -0.5));
    }

    #[test]
    fn depth_is_clamped() {
        assert_eq!(Pose::new(Vec2::ZERO, 0.4).z, 0.0);
        assert_eq!(Pose::new(Vec2::ZERO, -3.0).z, -1.0);
    }

    #[test]
    fn retargeting_ignored_by_walk() {
        let mut s = MotionStrategy::random_walk();
        s.set_destination(Vec2::new(1.0, 1.0));
        assert_eq!(s.name(), "random_walk");
    }
}
