//! mRNA degrader — latches onto an mRNA and consumes it, shedding
//! fragments as it goes.
//!
//! The degrader follows the mRNA's destruction point while attached. Each
//! step it removes up to `destruction_rate * dt` of the strand, feeding the
//! removed length into the fragment it is holding; a fragment that reaches
//! its target length is let go and a fresh one started. While the mRNA is
//! still being written the rate is halved and the leader is never eaten.

use crate::environment::{CellEnvironment, CellEvent};
use crate::machine::AttachmentStateMachine;
use crate::molecule::{Biomolecule, Body};
use geneflow_core::motion::MotionStrategy;
use geneflow_core::site::SiteOwner;
use geneflow_core::types::*;
use rand::Rng;
use tracing::{debug, info};

/// Rate factor while the mRNA is still being synthesized.
const SYNTHESIS_RATE_FACTOR: f64 = 0.5;

/// Where a fragment in progress sits, relative to the destruction point.
const FRAGMENT_OFFSET: Vec2 = Vec2 { x: -70.0, y: -20.0 };

#[derive(Debug, Clone, Default)]
pub struct MessengerRnaDestroyer {
    messenger_rna: Option<AgentId>,
    fragment: Option<AgentId>,
}

impl MessengerRnaDestroyer {
    /// Consuming point, relative to the degrader's position.
    pub const ATTACHMENT_OFFSET: Vec2 = Vec2 { x: 0.0, y: -40.0 };

    pub fn new() -> Self {
        Self::default()
    }

    pub fn messenger_rna(&self) -> Option<AgentId> {
        self.messenger_rna
    }

    pub fn fragment(&self) -> Option<AgentId> {
        self.fragment
    }

    pub(crate) fn on_attached<E: CellEnvironment + ?Sized>(
        &mut self,
        id: AgentId,
        body: &mut Body,
        machine: &mut AttachmentStateMachine,
        env: &mut E,
    ) {
        let owner = machine
            .attachment_site()
            .and_then(|s| env.sites().get(s))
            .map(|s| s.owner);
        let Some(SiteOwner::MessengerRna(rna_id)) = owner else {
            machine.detach(id, body, env);
            return;
        };
        let capacity = env.config().destruction_channel_length;
        let started = env
            .molecule_mut(rna_id)
            .and_then(|m| m.as_messenger_rna_mut())
            .and_then(|rna| rna.initiate_destruction(id, capacity))
            .is_some();
        if !started {
            debug!(agent = %id, messenger_rna = %rna_id, "mRNA refused destruction");
            machine.detach(id, body, env);
            return;
        }

        body.motion = MotionStrategy::track_destruction(rna_id, -Self::ATTACHMENT_OFFSET);
        body.movable_by_user = false;
        self.messenger_rna = Some(rna_id);
        info!(agent = %id, messenger_rna = %rna_id, "Destruction started");
        env.emit(CellEvent::DestructionStarted {
            destroyer: id,
            messenger_rna: rna_id,
        });
    }

    pub(crate) fn step_attached<E: CellEnvironment + ?Sized>(
        &mut self,
        id: AgentId,
        body: &mut Body,
        machine: &mut AttachmentStateMachine,
        dt: f64,
        env: &mut E,
    ) {
        let Some(rna_id) = self.messenger_rna else {
            machine.detach(id, body, env);
            return;
        };
        let status = env
            .molecule(rna_id)
            .and_then(|m| m.as_messenger_rna())
            .map(|rna| (rna.is_being_synthesized(), rna.length(), rna.destruction_point()));
        let Some((synthesizing, length, point)) = status else {
            self.abandon(id, env);
            machine.detach(id, body, env);
            return;
        };
        let point = point.unwrap_or(body.position + Self::ATTACHMENT_OFFSET);

        let mut amount = env.config().destruction_rate * dt;
        if synthesizing {
            amount *= SYNTHESIS_RATE_FACTOR;
            amount = amount.min((length - env.config().leader_length).max(0.0));
        }

        if self.fragment.is_none() && amount > 0.0 {
            self.start_fragment(id, body, point, env);
        }

        let outcome = env
            .molecule_mut(rna_id)
            .and_then(|m| m.as_messenger_rna_mut())
            .map(|rna| {
                let before = rna.length();
                let done = rna.advance_destruction(amount);
                (done, before - rna.length())
            });
        let Some((done, consumed)) = outcome else {
            return;
        };

        if let Some(fragment_id) = self.fragment {
            let full = env.molecule_mut(fragment_id).and_then(|m| {
                let full = m.as_fragment_mut().map(|f| {
                    f.add_length(consumed);
                    f.is_complete()
                });
                m.set_position(point + FRAGMENT_OFFSET);
                full
            });
            if full.unwrap_or(true) {
                self.release_fragment(id, env);
            }
        }

        if done {
            self.release_fragment(id, env);
            self.messenger_rna = None;
            // The site goes away with the mRNA.
            machine.forget_site();
            env.remove(rna_id);
            info!(agent = %id, messenger_rna = %rna_id, "mRNA destroyed");
            env.emit(CellEvent::MessengerRnaDestroyed {
                destroyer: id,
                messenger_rna: rna_id,
            });
            machine.detach(id, body, env);
        }
    }

    fn start_fragment<E: CellEnvironment + ?Sized>(&mut self, id: AgentId, body: &mut Body, point: Vec2, env: &mut E) {
        let min = env.config().fragment_length_min;
        let max = env.config().fragment_length_max.max(min);
        let target = if max > min { body.rng.gen_range(min..=max) } else { min };
        let fragment_id = env.next_agent_id();
        let seed = env.config().seed ^ fragment_id.stable_bits();
        let fragment = Biomolecule::messenger_rna_fragment(
            fragment_id,
            id,
            point + FRAGMENT_OFFSET,
            target,
            env.config(),
            seed,
        );
        env.spawn(fragment);
        self.fragment = Some(fragment_id);
    }

    fn release_fragment<E: CellEnvironment + ?Sized>(&mut self, id: AgentId, env: &mut E) {
        let Some(fragment_id) = self.fragment.take() else {
            return;
        };
        let fade = env.config().fragment_fade_duration;
        let length = env
            .molecule_mut(fragment_id)
            .and_then(|m| m.as_fragment_mut())
            .map(|f| {
                f.release_from_degrader(fade);
                f.length()
            });
        if let Some(length) = length {
            debug!(agent = %id, fragment = %fragment_id, length, "Fragment released");
            env.emit(CellEvent::FragmentReleased {
                destroyer: id,
                fragment: fragment_id,
                length,
            });
        }
    }

    /// Let go of the fragment in progress and of the mRNA; used when the
    /// degrader is pulled away or its mRNA disappears.
    pub(crate) fn abandon<E: CellEnvironment + ?Sized>(&mut self, id: AgentId, env: &mut E) {
        self.release_fragment(id, env);
        if let Some(rna_id) = self.messenger_rna.take() {
            if let Some(rna) = env.molecule_mut(rna_id).and_then(|m| m.as_messenger_rna_mut()) {
                rna.abort_destruction();
            }
        }
    }
}
