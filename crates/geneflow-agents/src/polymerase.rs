//! RNA polymerase — walks the strand, opens it, and writes an mRNA.
//!
//! While attached the polymerase moves through four phases:
//!
//! - **Wandering on strand**: sits on a site and waits for a decay event
//!   whose rate follows the site affinity. On a favoured gene start site the
//!   event commits it to transcription; elsewhere the event makes it hop to
//!   a neighbouring site or let go of the strand.
//! - **Conforming**: ramps its conformation from 0 to 1 while opening the
//!   strand around itself.
//! - **Transcribing**: releases the start site, spawns an mRNA and slides
//!   to the end of the transcribed region, growing the mRNA by exactly the
//!   distance covered.
//! - **Deconforming**: hands the finished mRNA over once, ramps back to 0
//!   and closes the strand, then detaches (or is recycled).

use crate::environment::{BindingKind, CellEnvironment, CellEvent, Requester, TranscriptionTarget};
use crate::machine::{attachment_half_life, decay_probability, AttachmentStateMachine, DETACH_DIRECTION};
use crate::molecule::{Biomolecule, Body};
use geneflow_core::motion::{DriftThenTeleport, MotionStrategy};
use geneflow_core::types::*;
use rand::Rng;
use tracing::{debug, info};

/// Where a new mRNA leaves the polymerase, relative to its position.
const GENERATION_OFFSET: Vec2 = Vec2 { x: -40.0, y: 55.0 };

/// Drift speed of a recycled polymerase before it fades out.
const RECYCLE_DRIFT_SPEED: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PolymerasePhase {
    WanderingOnStrand,
    Conforming,
    Transcribing,
    Deconforming,
}

#[derive(Debug, Clone)]
pub struct RnaPolymerase {
    phase: PolymerasePhase,
    conformation: f64,
    target: Option<TranscriptionTarget>,
    messenger_rna: Option<AgentId>,
    last_x: f64,
}

impl Default for RnaPolymerase {
    fn default() -> Self {
        Self::new()
    }
}

impl RnaPolymerase {
    pub const ATTACHMENT_OFFSET: Vec2 = Vec2 { x: 0.0, y: -30.0 };

    pub fn new() -> Self {
        Self {
            phase: PolymerasePhase::WanderingOnStrand,
            conformation: 0.0,
            target: None,
            messenger_rna: None,
            last_x: 0.0,
        }
    }

    /// Shape/colour blend between the free and the transcribing form.
    pub fn conformation(&self) -> f64 {
        self.conformation
    }

    /// The mRNA currently being produced, if any.
    pub fn messenger_rna(&self) -> Option<AgentId> {
        self.messenger_rna
    }

    pub fn is_transcribing(&self) -> bool {
        self.phase == PolymerasePhase::Transcribing
    }

    pub(crate) fn phase_name(&self) -> &'static str {
        match self.phase {
            PolymerasePhase::WanderingOnStrand => "wandering_on_strand",
            PolymerasePhase::Conforming => "conforming",
            PolymerasePhase::Transcribing => "transcribing",
            PolymerasePhase::Deconforming => "deconforming",
        }
    }

    pub(crate) fn on_attached<E: CellEnvironment + ?Sized>(
        &mut self,
        _id: AgentId,
        body: &mut Body,
        _machine: &mut AttachmentStateMachine,
        _env: &mut E,
    ) {
        self.phase = PolymerasePhase::WanderingOnStrand;
        self.conformation = 0.0;
        self.target = None;
        body.movable_by_user = true;
    }

    pub(crate) fn step_attached<E: CellEnvironment + ?Sized>(
        &mut self,
        id: AgentId,
        body: &mut Body,
        machine: &mut AttachmentStateMachine,
        dt: f64,
        env: &mut E,
    ) {
        match self.phase {
            PolymerasePhase::WanderingOnStrand => self.step_wandering(id, body, machine, dt, env),
            PolymerasePhase::Conforming => {
                self.conformation = (self.conformation + dt / env.config().conformation_time).min(1.0);
                env.set_separation(id, attachment_x(body), self.conformation);
                if self.conformation >= 1.0 {
                    self.begin_transcription(id, body, machine, env);
                }
            }
            PolymerasePhase::Transcribing => self.step_transcribing(id, body, env),
            PolymerasePhase::Deconforming => {
                self.conformation = (self.conformation - dt / env.config().conformation_time).max(0.0);
                env.set_separation(id, attachment_x(body), self.conformation);
                if self.conformation <= 0.0 {
                    self.finish(id, body, machine, env);
                }
            }
        }
    }

    fn step_wandering<E: CellEnvironment + ?Sized>(
        &mut self,
        id: AgentId,
        body: &mut Body,
        machine: &mut AttachmentStateMachine,
        dt: f64,
        env: &mut E,
    ) {
        let Some(site) = machine.attachment_site() else {
            machine.detach(id, body, env);
            return;
        };
        let affinity = env.sites().get(site).map(|s| s.affinity).unwrap_or(0.0);
        let half_life = attachment_half_life(env.config().polymerase_half_life, affinity);
        if body.rng.gen::<f64>() >= decay_probability(half_life, dt) {
            return;
        }

        if affinity > env.config().transcription_affinity_threshold {
            if let Some(target) = env.transcription_target(site) {
                debug!(agent = %id, gene = target.gene, "Committing to transcription");
                self.target = Some(target);
                self.phase = PolymerasePhase::Conforming;
                body.movable_by_user = false;
                return;
            }
        }
        if body.rng.gen::<f64>() < env.config().polymerase_hop_probability {
            let requester = Requester {
                id,
                binding: BindingKind::Polymerase,
                attachment_point: body.position + Self::ATTACHMENT_OFFSET,
                attachment_offset: Self::ATTACHMENT_OFFSET,
                width: body.width,
                height: body.height,
                bounds: &body.motion_bounds,
            };
            let neighbours = env.adjacent_sites(requester, site);
            if !neighbours.is_empty() {
                let next = neighbours[body.rng.gen_range(0..neighbours.len())];
                if env.sites_mut().reserve(next, id) {
                    machine.switch_site(id, body, next, env);
                    env.emit(CellEvent::Hopped { id, from: site, to: next });
                    return;
                }
            }
        }
        machine.detach(id, body, env);
    }

    fn begin_transcription<E: CellEnvironment + ?Sized>(
        &mut self,
        id: AgentId,
        body: &mut Body,
        machine: &mut AttachmentStateMachine,
        env: &mut E,
    ) {
        let Some(target) = self.target else {
            self.phase = PolymerasePhase::Deconforming;
            return;
        };
        let rna_id = env.next_agent_id();
        let seed = env.config().seed ^ rna_id.stable_bits();
        let rna = Biomolecule::messenger_rna(
            rna_id,
            target.product,
            body.position + GENERATION_OFFSET,
            env.config(),
            seed,
        );
        env.spawn(rna);
        machine.release_site(id, env);

        self.phase = PolymerasePhase::Transcribing;
        self.messenger_rna = Some(rna_id);
        self.last_x = body.position.x;
        let end = Vec2::new(target.end_x - Self::ATTACHMENT_OFFSET.x, body.position.y);
        body.motion = MotionStrategy::move_directly_to(end, env.config().transcription_speed);
        info!(agent = %id, messenger_rna = %rna_id, gene = target.gene, "Transcription started");
        env.emit(CellEvent::TranscriptionStarted {
            polymerase: id,
            messenger_rna: rna_id,
            gene: target.gene,
        });
    }

    fn step_transcribing<E: CellEnvironment + ?Sized>(&mut self, id: AgentId, body: &mut Body, env: &mut E) {
        let x = attachment_x(body);
        let moved = body.position.x - self.last_x;
        self.last_x = body.position.x;
        env.set_separation(id, x, 1.0);

        for blocker in env.dna_attached_between(x, x + body.width / 2.0, id) {
            debug!(agent = %id, blocker = %blocker, "Displacing blocker ahead");
            env.force_detach(blocker);
        }

        if let Some(rna_id) = self.messenger_rna {
            if let Some(rna) = env.molecule_mut(rna_id).and_then(|m| m.as_messenger_rna_mut()) {
                if moved > 0.0 {
                    rna.grow(moved);
                }
                rna.set_lower_right(body.position + GENERATION_OFFSET);
            }
        }

        let end_x = self.target.map(|t| t.end_x).unwrap_or(x);
        if x >= end_x {
            self.begin_deconforming(id, env);
        }
    }

    fn begin_deconforming<E: CellEnvironment + ?Sized>(&mut self, id: AgentId, env: &mut E) {
        self.phase = PolymerasePhase::Deconforming;
        if let Some(rna_id) = self.messenger_rna.take() {
            let config = env.config().clone();
            let length = env
                .molecule_mut(rna_id)
                .and_then(|m| m.as_messenger_rna_mut())
                .map(|rna| {
                    rna.release_from_polymerase(&config);
                    rna.length()
                });
            if let Some(length) = length {
                info!(agent = %id, messenger_rna = %rna_id, length, "mRNA released");
                env.emit(CellEvent::MessengerRnaReleased {
                    polymerase: id,
                    messenger_rna: rna_id,
                    length,
                });
            }
        }
    }

    fn finish<E: CellEnvironment + ?Sized>(
        &mut self,
        id: AgentId,
        body: &mut Body,
        machine: &mut AttachmentStateMachine,
        env: &mut E,
    ) {
        env.remove_separation(id);
        self.phase = PolymerasePhase::WanderingOnStrand;
        self.target = None;
        let motion = if env.recycle_mode() {
            MotionStrategy::DriftThenTeleport(DriftThenTeleport::new(
                DETACH_DIRECTION * RECYCLE_DRIFT_SPEED,
                env.config().recycle_drift_time,
                env.recycle_zones(),
            ))
        } else {
            MotionStrategy::wander(DETACH_DIRECTION)
        };
        machine.enter_unavailable(id, body, motion, env);
    }

    /// Drop an mRNA in production and close the strand; used when the
    /// polymerase is pulled away.
    pub(crate) fn abandon<E: CellEnvironment + ?Sized>(&mut self, id: AgentId, body: &mut Body, env: &mut E) {
        if self.messenger_rna.is_some() {
            self.begin_deconforming(id, env);
        }
        env.remove_separation(id);
        self.phase = PolymerasePhase::WanderingOnStrand;
        self.conformation = 0.0;
        self.target = None;
        body.movable_by_user = true;
    }
}

fn attachment_x(body: &Body) -> f64 {
    body.position.x + RnaPolymerase::ATTACHMENT_OFFSET.x
}
