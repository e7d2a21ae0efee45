//! AttachmentStateMachine — the generic attach/detach cycle.
//!
//! ```text
//! UnattachedAndAvailable --proposal accepted--> MovingTowardsAttachment
//!        ^                                            | arrival
//!        | refractory elapsed                         v
//! UnattachedButUnavailable <--detach-------------- Attached
//! ```
//!
//! Entry into each state installs the motion strategy and sets whether a
//! user may pick the molecule up. What happens while attached is decided
//! by the molecule kind; everything else is shared.

use crate::environment::{CellEnvironment, CellEvent};
use crate::molecule::{Biomolecule, Body, MoleculeKind};
use geneflow_core::motion::MotionStrategy;
use geneflow_core::site::SiteOwner;
use geneflow_core::types::*;
use serde::Serialize;
use tracing::{debug, warn};

/// Direction a molecule drifts after letting go.
pub const DETACH_DIRECTION: Vec2 = Vec2::UP;

/// Largest affinity the half-life model accepts.
const MAX_DECAY_AFFINITY: f64 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttachmentState {
    UnattachedAndAvailable,
    MovingTowardsAttachment,
    Attached,
    UnattachedButUnavailable,
}

impl AttachmentState {
    pub fn name(&self) -> &'static str {
        match self {
            AttachmentState::UnattachedAndAvailable => "unattached_and_available",
            AttachmentState::MovingTowardsAttachment => "moving_towards_attachment",
            AttachmentState::Attached => "attached",
            AttachmentState::UnattachedButUnavailable => "unattached_but_unavailable",
        }
    }
}

/// Per-molecule attachment state. Holds at most one site, exclusively.
#[derive(Debug, Clone)]
pub struct AttachmentStateMachine {
    state: AttachmentState,
    attachment_site: Option<SiteId>,
    destination_offset: Vec2,
    refractory_remaining: f64,
    attached_remaining: f64,
}

impl AttachmentStateMachine {
    pub(crate) fn new(destination_offset: Vec2) -> Self {
        Self {
            state: AttachmentState::UnattachedAndAvailable,
            attachment_site: None,
            destination_offset,
            refractory_remaining: 0.0,
            attached_remaining: 0.0,
        }
    }

    pub fn state(&self) -> AttachmentState {
        self.state
    }

    pub fn attachment_site(&self) -> Option<SiteId> {
        self.attachment_site
    }

    /// Offset from a site to the body position that docks the molecule on it.
    pub fn destination_offset(&self) -> Vec2 {
        self.destination_offset
    }

    pub fn refractory_remaining(&self) -> f64 {
        self.refractory_remaining
    }

    /// Start out attached to a site reserved by the spawner. The attached
    /// state never times out on its own.
    pub(crate) fn dock(&mut self, site: SiteId) {
        self.state = AttachmentState::Attached;
        self.attachment_site = Some(site);
        self.attached_remaining = f64::INFINITY;
    }

    /// Give up the held site, if any.
    pub(crate) fn release_site<E: CellEnvironment + ?Sized>(&mut self, id: AgentId, env: &mut E) {
        if let Some(site) = self.attachment_site.take() {
            env.sites_mut().release(site, id);
        }
    }

    /// Forget the held site without touching the registry; used once the
    /// site has been handed back by other means.
    pub(crate) fn forget_site(&mut self) {
        self.attachment_site = None;
    }

    /// Switch the held site for another one already reserved by `id`.
    pub(crate) fn switch_site<E: CellEnvironment + ?Sized>(
        &mut self,
        id: AgentId,
        body: &mut Body,
        site: SiteId,
        env: &mut E,
    ) {
        self.release_site(id, env);
        self.attachment_site = Some(site);
        body.motion = MotionStrategy::follow_site(site, self.destination_offset);
    }

    pub(crate) fn enter_available(&mut self, id: AgentId, body: &mut Body) {
        debug!(agent = %id, "Entering unattached and available");
        self.state = AttachmentState::UnattachedAndAvailable;
        self.attachment_site = None;
        body.attached_to_dna = false;
        body.approaching_dna = false;
        body.movable_by_user = true;
        body.motion = MotionStrategy::random_walk();
    }

    pub(crate) fn enter_moving<E: CellEnvironment + ?Sized>(
        &mut self,
        id: AgentId,
        body: &mut Body,
        site: SiteId,
        env: &mut E,
    ) {
        let Some(target) = env.sites().get(site) else {
            return;
        };
        let destination = target.position + self.destination_offset;
        let on_strand = matches!(target.owner, SiteOwner::Dna | SiteOwner::Gene(_));
        debug!(agent = %id, site = ?site, "Moving towards attachment");
        self.state = AttachmentState::MovingTowardsAttachment;
        self.attachment_site = Some(site);
        body.approaching_dna = on_strand;
        body.movable_by_user = true;
        body.motion = MotionStrategy::meander_to(destination, env.config().approach_speed);
        env.emit(CellEvent::Approaching { id, site });
    }

    pub(crate) fn enter_attached<E: CellEnvironment + ?Sized>(
        &mut self,
        id: AgentId,
        body: &mut Body,
        env: &mut E,
    ) {
        let Some(site) = self.attachment_site else {
            return;
        };
        let on_strand = env
            .sites()
            .get(site)
            .map(|s| matches!(s.owner, SiteOwner::Dna | SiteOwner::Gene(_)))
            .unwrap_or(false);
        debug!(agent = %id, site = ?site, "Attached");
        self.state = AttachmentState::Attached;
        self.attached_remaining = env.config().default_attach_time;
        body.approaching_dna = false;
        body.attached_to_dna = on_strand;
        body.motion = MotionStrategy::follow_site(site, self.destination_offset);
        env.emit(CellEvent::Attached { id, site });
    }

    /// Let go of the site and start the refractory period with `motion`.
    pub(crate) fn enter_unavailable<E: CellEnvironment + ?Sized>(
        &mut self,
        id: AgentId,
        body: &mut Body,
        motion: MotionStrategy,
        env: &mut E,
    ) {
        debug!(agent = %id, motion = motion.name(), "Detaching");
        self.release_site(id, env);
        self.state = AttachmentState::UnattachedButUnavailable;
        self.refractory_remaining = env.config().refractory_time;
        body.attached_to_dna = false;
        body.approaching_dna = false;
        body.movable_by_user = true;
        body.motion = motion;
        env.emit(CellEvent::Detached { id });
    }

    /// Plain detach: drift away from where the molecule was attached.
    pub(crate) fn detach<E: CellEnvironment + ?Sized>(&mut self, id: AgentId, body: &mut Body, env: &mut E) {
        self.enter_unavailable(id, body, MotionStrategy::wander(DETACH_DIRECTION), env);
    }

    /// Attached behaviour of kinds without their own: stay docked for the
    /// attach time, then detach.
    pub(crate) fn step_timed_attachment<E: CellEnvironment + ?Sized>(
        &mut self,
        id: AgentId,
        body: &mut Body,
        dt: f64,
        env: &mut E,
    ) {
        self.attached_remaining -= dt;
        if self.attached_remaining <= 0.0 {
            self.detach(id, body, env);
        }
    }

    fn step_unavailable(&mut self, id: AgentId, body: &mut Body, dt: f64) {
        self.refractory_remaining -= dt;
        let scripted_motion_running = matches!(body.motion, MotionStrategy::DriftThenTeleport(_))
            && !body.motion.is_finished();
        if self.refractory_remaining <= 0.0 && !scripted_motion_running {
            self.enter_available(id, body);
        }
    }
}

/// Half-life of an attachment at `affinity`, given the half-life at 0.5.
pub fn attachment_half_life(base: f64, affinity: f64) -> f64 {
    let a = affinity.clamp(0.0, MAX_DECAY_AFFINITY);
    base * a / (1.0 - a)
}

/// Chance that a decay event fires within `dt` for the given half-life.
pub fn decay_probability(half_life: f64, dt: f64) -> f64 {
    if half_life <= 0.0 {
        return 1.0;
    }
    1.0 - (-std::f64::consts::LN_2 * dt / half_life).exp()
}

impl Biomolecule {
    pub(crate) fn step_machine<E: CellEnvironment + ?Sized>(&mut self, dt: f64, env: &mut E) {
        match self.machine.state {
            AttachmentState::UnattachedAndAvailable => self.step_available(env),
            AttachmentState::MovingTowardsAttachment => self.step_moving(env),
            AttachmentState::Attached => self.step_attached(dt, env),
            AttachmentState::UnattachedButUnavailable => {
                self.machine.step_unavailable(self.id, &mut self.body, dt)
            }
        }
    }

    fn step_available<E: CellEnvironment + ?Sized>(&mut self, env: &mut E) {
        let Some(requester) = self.requester() else {
            return;
        };
        let Some(site) = env.propose_attachment(requester) else {
            return;
        };
        if env.sites_mut().reserve(site, self.id) {
            self.machine.enter_moving(self.id, &mut self.body, site, env);
        }
    }

    fn step_moving<E: CellEnvironment + ?Sized>(&mut self, env: &mut E) {
        let Some(site_id) = self.machine.attachment_site else {
            self.machine.enter_available(self.id, &mut self.body);
            return;
        };
        let attachment_point = self.attachment_point();
        let (position, arrived) = match env.sites().get(site_id) {
            Some(site) if site.is_held_by(self.id) => (site.position, site.is_attached(attachment_point)),
            _ => {
                debug!(agent = %self.id, site = ?site_id, "Reserved site was taken away");
                self.machine.forget_site();
                self.machine.enter_available(self.id, &mut self.body);
                return;
            }
        };
        if arrived {
            self.machine.enter_attached(self.id, &mut self.body, env);
            self.on_attached(env);
        } else {
            self.body
                .motion
                .set_destination(position + self.machine.destination_offset);
        }
    }

    fn on_attached<E: CellEnvironment + ?Sized>(&mut self, env: &mut E) {
        let Biomolecule {
            id,
            kind,
            body,
            machine,
        } = self;
        match kind {
            MoleculeKind::RnaPolymerase(p) => p.on_attached(*id, body, machine, env),
            MoleculeKind::TranscriptionFactor(f) => f.on_attached(env),
            MoleculeKind::Ribosome(r) => r.on_attached(*id, body, machine, env),
            MoleculeKind::MessengerRnaDestroyer(d) => d.on_attached(*id, body, machine, env),
            _ => {}
        }
    }

    fn step_attached<E: CellEnvironment + ?Sized>(&mut self, dt: f64, env: &mut E) {
        if let Some(site) = self.machine.attachment_site {
            let occupant = env.sites().get(site).map(|s| s.occupant);
            match occupant {
                Some(holder) if holder != Some(self.id) => {
                    debug_assert!(false, "attached to site {:?} held by {:?}", site, holder);
                    warn!(agent = %self.id, site = ?site, "Attached to a site held by another agent");
                    return;
                }
                None => {
                    debug!(agent = %self.id, site = ?site, "Attachment site disappeared");
                    self.machine.forget_site();
                    self.release_kind_holds(env);
                    self.machine.detach(self.id, &mut self.body, env);
                    return;
                }
                _ => {}
            }
        }
        let Biomolecule {
            id,
            kind,
            body,
            machine,
        } = self;
        match kind {
            MoleculeKind::RnaPolymerase(p) => p.step_attached(*id, body, machine, dt, env),
            MoleculeKind::TranscriptionFactor(f) => f.step_attached(*id, body, machine, dt, env),
            MoleculeKind::Ribosome(r) => r.step_attached(*id, body, machine, dt, env),
            MoleculeKind::MessengerRnaDestroyer(d) => d.step_attached(*id, body, machine, dt, env),
            // Held until its ribosome lets go.
            MoleculeKind::Protein(_) => {}
            _ => machine.step_timed_attachment(*id, body, dt, env),
        }
    }

    /// Undo whatever a kind holds besides its site: an mRNA in production,
    /// a strand separation, a fragment or a protein.
    fn release_kind_holds<E: CellEnvironment + ?Sized>(&mut self, env: &mut E) {
        let Biomolecule { id, kind, body, .. } = self;
        match kind {
            MoleculeKind::RnaPolymerase(p) => p.abandon(*id, body, env),
            MoleculeKind::Ribosome(r) => r.abandon(*id, env),
            MoleculeKind::MessengerRnaDestroyer(d) => d.abandon(*id, env),
            _ => {}
        }
    }

    /// Cancel an approach in progress. Does nothing in any other state.
    pub fn force_abort_pending_attachment<E: CellEnvironment + ?Sized>(&mut self, env: &mut E) {
        if !self.kind.uses_attachment_machine()
            || self.machine.state != AttachmentState::MovingTowardsAttachment
        {
            return;
        }
        debug!(agent = %self.id, "Pending attachment aborted");
        self.machine.release_site(self.id, env);
        self.machine.enter_available(self.id, &mut self.body);
    }

    /// Let go of whatever the molecule is approaching or attached to and
    /// start the refractory period.
    pub fn force_detach<E: CellEnvironment + ?Sized>(&mut self, env: &mut E) {
        if !self.kind.uses_attachment_machine() {
            return;
        }
        match self.machine.state {
            AttachmentState::Attached => {
                self.release_kind_holds(env);
                self.machine.detach(self.id, &mut self.body, env);
            }
            AttachmentState::MovingTowardsAttachment => {
                self.machine.detach(self.id, &mut self.body, env);
            }
            _ => {}
        }
    }

    /// Drop everything and become available right away, skipping the
    /// refractory period. Used when a user grabs the molecule.
    pub fn force_immediate_unattached_and_available<E: CellEnvironment + ?Sized>(&mut self, env: &mut E) {
        if !self.kind.uses_attachment_machine() {
            return;
        }
        if self.machine.state == AttachmentState::Attached {
            self.release_kind_holds(env);
        }
        self.machine.release_site(self.id, env);
        self.machine.enter_available(self.id, &mut self.body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_life_grows_with_affinity() {
        assert!((attachment_half_life(1.5, 0.5) - 1.5).abs() < 1e-12);
        assert!(attachment_half_life(1.5, 0.9) > attachment_half_life(1.5, 0.5));
        assert_eq!(attachment_half_life(3.0, 0.0), 0.0);
    }

    #[test]
    fn half_life_caps_affinity() {
        assert_eq!(attachment_half_life(1.0, 1.0), attachment_half_life(1.0, 0.99));
        assert!(attachment_half_life(1.0, 1.0).is_finite());
    }

    #[test]
    fn decay_probability_matches_half_life() {
        let p = decay_probability(2.0, 2.0);
        assert!((p - 0.5).abs() < 1e-12);
        assert_eq!(decay_probability(0.0, 0.01), 1.0);
        assert!(decay_probability(10.0, 0.01) < 0.001);
    }

    #[test]
    fn docking_skips_the_approach() {
        let mut machine = AttachmentStateMachine::new(Vec2::ZERO);
        machine.dock(SiteId(3));
        assert_eq!(machine.state(), AttachmentState::Attached);
        assert_eq!(machine.attachment_site(), Some(SiteId(3)));
    }
}
