//! Ribosome — docks on a free mRNA and pulls it through its channel,
//! growing a protein as it goes.
//!
//! On arrival the mRNA's leader becomes the translation channel and a
//! protein is spawned docked on the ribosome's own product site. Each step
//! advances the mRNA through the channel at the translation rate; the
//! protein's growth is the share translated so far. Once the whole strand
//! has passed through, the protein is released, the mRNA recoils and the
//! ribosome detaches.

use crate::environment::{CellEnvironment, CellEvent};
use crate::machine::AttachmentStateMachine;
use crate::molecule::{Biomolecule, Body};
use geneflow_core::motion::MotionStrategy;
use geneflow_core::site::SiteOwner;
use geneflow_core::types::*;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct Ribosome {
    messenger_rna: Option<AgentId>,
    protein: Option<AgentId>,
    product: Option<ProductKind>,
    product_site: Option<SiteId>,
    translated: f64,
}

impl Ribosome {
    /// Channel entrance, relative to the ribosome's position.
    pub const ATTACHMENT_OFFSET: Vec2 = Vec2 { x: 50.0, y: -40.0 };
    /// Where the growing protein sits, relative to the ribosome's position.
    pub const PRODUCT_SITE_OFFSET: Vec2 = Vec2 { x: 0.0, y: 80.0 };

    pub fn new() -> Self {
        Self::default()
    }

    pub fn messenger_rna(&self) -> Option<AgentId> {
        self.messenger_rna
    }

    pub fn protein(&self) -> Option<AgentId> {
        self.protein
    }

    pub fn is_translating(&self) -> bool {
        self.messenger_rna.is_some()
    }

    /// Length of mRNA pulled through so far in this translation.
    pub fn translated(&self) -> f64 {
        self.translated
    }

    pub fn product_site(&self) -> Option<SiteId> {
        self.product_site
    }

    pub(crate) fn set_product_site(&mut self, site: SiteId) {
        self.product_site = Some(site);
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

        let capacity = env.config().translation_channel_length + env.config().leader_length;
        let anchor = body.position + Self::ATTACHMENT_OFFSET;
        let product = env
            .molecule_mut(rna_id)
            .and_then(|m| m.as_messenger_rna_mut())
            .and_then(|rna| {
                rna.initiate_translation(id, capacity)?;
                rna.align_channel(id, anchor);
                Some(rna.product())
            });
        let Some(product) = product else {
            debug!(agent = %id, messenger_rna = %rna_id, "mRNA refused translation");
            machine.detach(id, body, env);
            return;
        };

        body.motion = MotionStrategy::Stillness;
        body.movable_by_user = false;
        self.messenger_rna = Some(rna_id);
        self.product = Some(product);
        self.translated = 0.0;

        let protein_id = env.next_agent_id();
        if let Some(site) = self.product_site {
            if env.sites_mut().reserve(site, protein_id) {
                let seed = env.config().seed ^ protein_id.stable_bits();
                let position = body.position + Self::PRODUCT_SITE_OFFSET;
                env.spawn(Biomolecule::protein(protein_id, product, site, position, seed));
                self.protein = Some(protein_id);
            }
        }

        info!(agent = %id, messenger_rna = %rna_id, "Translation started");
        env.emit(CellEvent::TranslationStarted {
            ribosome: id,
            messenger_rna: rna_id,
            protein: self.protein,
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
        let amount = env.config().translation_rate * dt;
        let anchor = body.position + Self::ATTACHMENT_OFFSET;
        let progress = env
            .molecule_mut(rna_id)
            .and_then(|m| m.as_messenger_rna_mut())
            .map(|rna| {
                let done = rna.advance_translation(id, amount);
                rna.align_channel(id, anchor);
                (done, rna.length())
            });
        let Some((done, length)) = progress else {
            self.abandon(id, env);
            machine.detach(id, body, env);
            return;
        };

        self.translated = (self.translated + amount).min(length);
        let growth = if length > 0.0 { self.translated / length } else { 1.0 };
        if let Some(protein) = self.protein.and_then(|p| env.molecule_mut(p)).and_then(|m| m.as_protein_mut()) {
            protein.set_growth(growth);
        }

        if done {
            self.complete(id, body, machine, env);
        }
    }

    fn complete<E: CellEnvironment + ?Sized>(
        &mut self,
        id: AgentId,
        body: &mut Body,
        machine: &mut AttachmentStateMachine,
        env: &mut E,
    ) {
        if let Some(protein) = self.protein.take() {
            if let Some(p) = env.molecule_mut(protein).and_then(|m| m.as_protein_mut()) {
                p.set_growth(1.0);
            }
            if let Some(product) = self.product {
                env.record_product(product);
                info!(agent = %id, protein = %protein, product = product.0, "Protein released");
                env.emit(CellEvent::ProteinReleased {
                    ribosome: id,
                    protein,
                    product,
                });
            }
            env.force_detach(protein);
        }
        self.end_translation(id, env);
        machine.detach(id, body, env);
    }

    fn end_translation<E: CellEnvironment + ?Sized>(&mut self, id: AgentId, env: &mut E) {
        if let Some(rna_id) = self.messenger_rna.take() {
            let config = env.config().clone();
            if let Some(rna) = env.molecule_mut(rna_id).and_then(|m| m.as_messenger_rna_mut()) {
                rna.end_translation(id, &config);
            }
        }
        self.product = None;
        self.translated = 0.0;
    }

    /// Drop an unfinished protein and let go of the mRNA; used when the
    /// ribosome is pulled away or its mRNA disappears.
    pub(crate) fn abandon<E: CellEnvironment + ?Sized>(&mut self, id: AgentId, env: &mut E) {
        if let Some(protein) = self.protein.take() {
            debug!(agent = %id, protein = %protein, "Discarding unfinished protein");
            env.remove(protein);
        }
        self.end_translation(id, env);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let r = Ribosome::new();
        assert!(!r.is_translating());
        assert!(r.protein().is_none());
        assert!(r.product_site().is_none());
    }

    #[test]
    fn remembers_its_product_site() {
        let mut r = Ribosome::new();
        r.set_product_site(SiteId(3));
        assert_eq!(r.product_site(), Some(SiteId(3)));
    }
}
