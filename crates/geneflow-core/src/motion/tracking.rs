//! Strategies driven by something other than the agent itself.

use super::{MotionContext, Pose, DEPTH_FADE_TIME};
use crate::bounds::MotionBounds;
use crate::types::{AgentId, Rect, SiteId, Vec2};
use rand::Rng;

/// Depth recovery per second while following a site.
const FOLLOW_Z_SPEED: f64 = 2.0;

/// Mirrors a site's live position, shifted by the agent's offset.
#[derive(Debug, Clone)]
pub struct FollowAttachmentSite {
    site: SiteId,
    offset: Vec2,
}

impl FollowAttachmentSite {
    pub fn new(site: SiteId, offset: Vec2) -> Self {
        Self { site, offset }
    }

    pub fn site(&self) -> SiteId {
        self.site
    }

    pub(crate) fn next_pose<C: MotionContext + ?Sized>(&mut self, current: Pose, dt: f64, ctx: &C) -> Pose {
        let z = (current.z + FOLLOW_Z_SPEED * dt).min(0.0);
        match ctx.site_position(self.site) {
            Some(site) => Pose {
                position: site + self.offset,
                z,
            },
            None => Pose { z, ..current },
        }
    }
}

/// Mirrors the point where an mRNA is being consumed.
#[derive(Debug, Clone)]
pub struct DestroyerTrackingRna {
    messenger_rna: AgentId,
    offset: Vec2,
}

impl DestroyerTrackingRna {
    pub fn new(messenger_rna: AgentId, offset: Vec2) -> Self {
        Self { messenger_rna, offset }
    }

    pub(crate) fn next_pose<C: MotionContext + ?Sized>(&mut self, current: Pose, ctx: &C) -> Pose {
        match ctx.destruction_point(self.messenger_rna) {
            Some(point) => Pose {
                position: point + self.offset,
                z: 0.0,
            },
            None => current,
        }
    }
}

/// Constant drift, then a one-second fade into the background, then a jump
/// to a random point inside one of the return zones.
#[derive(Debug, Clone)]
pub struct DriftThenTeleport {
    velocity: Vec2,
    pre_fade_remaining: f64,
    fade_remaining: f64,
    zones: Vec<Rect>,
    teleported: bool,
}

impl DriftThenTeleport {
    pub fn new(velocity: Vec2, pre_fade_time: f64, zones: Vec<Rect>) -> Self {
        Self {
            velocity,
            pre_fade_remaining: pre_fade_time,
            fade_remaining: DEPTH_FADE_TIME,
            zones,
            teleported: false,
        }
    }

    pub fn has_teleported(&self) -> bool {
        self.teleported
    }

    pub(crate) fn next_pose<R: Rng + ?Sized>(
        &mut self,
        current: Pose,
        bounds: &MotionBounds,
        dt: f64,
        rng: &mut R,
    ) -> Pose {
        if self.teleported {
            return current;
        }
        if self.pre_fade_remaining > 0.0 {
            self.pre_fade_remaining -= dt;
            return Pose {
                position: current.position + self.velocity * dt,
                z: current.z,
            };
        }
        if self.fade_remaining > 0.0 {
            self.fade_remaining -= dt;
            let faded = 1.0 - (self.fade_remaining / DEPTH_FADE_TIME).max(0.0);
            return Pose {
                position: current.position + self.velocity * dt,
                z: (-faded).min(current.z),
            };
        }
        let zone = if self.zones.is_empty() {
            bounds.bounds
        } else {
            self.zones[rng.gen_range(0..self.zones.len())]
        };
        self.teleported = true;
        Pose {
            position: random_point_in(&zone, rng),
            z: -1.0,
        }
    }
}

pub(crate) fn random_point_in<R: Rng + ?Sized>(zone: &Rect, rng: &mut R) -> Vec2 {
    let x = if zone.width() > 0.0 {
        rng.gen_range(zone.min_x..zone.max_x)
    } else {
        zone.min_x
    };
    let y = if zone.height() > 0.0 {
        rng.gen_range(zone.min_y..zone.max_y)
    } else {
        zone.min_y
    };
    Vec2::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;
    use std::collections::HashMap;

    struct Sites(HashMap<SiteId, Vec2>);

    impl MotionContext for Sites {
        fn site_position(&self, site: SiteId) -> Option<Vec2> {
            self.0.get(&site).copied()
        }

        fn destruction_point(&self, _messenger_rna: AgentId) -> Option<Vec2> {
            Some(Vec2::new(7.0, 7.0))
        }
    }

    #[test]
    fn follow_applies_offset() {
        let ctx = Sites(HashMap::from([(SiteId(1), Vec2::new(10.0, 20.0))]));
        let mut s = FollowAttachmentSite::new(SiteId(1), Vec2::new(0.0, 15.0));
        let pose = s.next_pose(Pose::new(Vec2::ZERO, 0.0), 0.1, &ctx);
        assert_eq!(pose.position, Vec2::new(10.0, 35.0));
    }

    #[test]
    fn follow_missing_site_stays_put() {
        let ctx = Sites(HashMap::new());
        let mut s = FollowAttachmentSite::new(SiteId(1), Vec2::ZERO);
        let pose = s.next_pose(Pose::new(Vec2::new(3.0, 4.0), 0.0), 0.1, &ctx);
        assert_eq!(pose.position, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn tracking_mirrors_destruction_point() {
        let ctx = Sites(HashMap::new());
        let mut s = DestroyerTrackingRna::new(AgentId::from_seed(1), Vec2::new(1.0, 0.0));
        let pose = s.next_pose(Pose::new(Vec2::ZERO, -0.3), &ctx);
        assert_eq!(pose.position, Vec2::new(8.0, 7.0));
    }

    #[test]
    fn teleport_lands_in_zone_after_fade() {
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        let zone = Rect::new(1000.0, 1000.0, 1100.0, 1050.0);
        let mut s = DriftThenTeleport::new(Vec2::new(0.0, 100.0), 0.5, vec![zone]);
        let bounds = MotionBounds::unbounded();
        let mut pose = Pose::new(Vec2::ZERO, 0.0);
        let mut steps = 0;
        while !s.has_teleported() {
            pose = s.next_pose(pose, &bounds, 0.05, &mut rng);
            steps += 1;
            assert!(steps < 100);
        }
        // 0.5 s drift + 1 s fade + the teleport step itself.
        assert!(steps >= 30);
        assert!(zone.contains_point(pose.position));
        assert_eq!(pose.z, -1.0);
    }
}
