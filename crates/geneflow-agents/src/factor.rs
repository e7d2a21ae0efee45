//! Transcription factor — binds regulatory sites and gates transcription.
//!
//! Attachment decays like the polymerase's, at a slower base rate. When a
//! decay event fires the factor may hop to a free neighbouring site rather
//! than let go; the chance of hopping halves after every hop, so a factor
//! always leaves the strand eventually.

use crate::environment::{BindingKind, CellEnvironment, CellEvent, Requester};
use crate::machine::{attachment_half_life, decay_probability, AttachmentStateMachine};
use crate::molecule::Body;
use geneflow_core::types::*;
use rand::Rng;

/// Factor applied to the hop chance after every hop.
const HOP_DECAY: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct TranscriptionFactor {
    factor: FactorKind,
    hop_threshold: f64,
}

impl TranscriptionFactor {
    pub const ATTACHMENT_OFFSET: Vec2 = Vec2 { x: 0.0, y: -15.0 };

    pub fn new(factor: FactorKind) -> Self {
        Self {
            factor,
            hop_threshold: 0.0,
        }
    }

    pub fn factor(&self) -> FactorKind {
        self.factor
    }

    /// Chance the next decay event turns into a hop.
    pub fn hop_threshold(&self) -> f64 {
        self.hop_threshold
    }

    pub(crate) fn on_attached<E: CellEnvironment + ?Sized>(&mut self, env: &mut E) {
        self.hop_threshold = env.config().factor_hop_probability;
    }

    pub(crate) fn step_attached<E: CellEnvironment + ?Sized>(
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
        let half_life = attachment_half_life(env.config().factor_half_life, affinity);
        if body.rng.gen::<f64>() >= decay_probability(half_life, dt) {
            return;
        }

        if body.rng.gen::<f64>() < self.hop_threshold {
            let requester = Requester {
                id,
                binding: BindingKind::Factor(self.factor),
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
                    self.hop_threshold *= HOP_DECAY;
                    env.emit(CellEvent::Hopped { id, from: site, to: next });
                    return;
                }
            }
        }
        machine.detach(id, body, env);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_its_kind() {
        let f = TranscriptionFactor::new(FactorKind::negative(2));
        assert_eq!(f.factor(), FactorKind::negative(2));
        assert_eq!(f.hop_threshold(), 0.0);
    }
}
